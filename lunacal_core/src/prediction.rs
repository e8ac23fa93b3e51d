//! Next-cycle and ovulation prediction.
//!
//! A moving-average projection:
//! - next start = most recent start + average cycle length
//! - ovulation = next start - luteal phase (14 days)
//! - ovulation window = ovulation +/- radius (2 days)
//!
//! Each prediction is a snapshot of the records passed in; nothing is
//! remembered between calls.

use crate::interval::{add_days, shift_window};
use crate::stats::{compute_statistics, most_recent_cycle};
use crate::{AnalyticsConfig, CycleRecord, CycleStatistics, Error, Prediction, Result};

/// Project the next cycle from precomputed statistics
///
/// `most_recent` must be the record with the latest start date, open or
/// closed. Fails with `InsufficientData` when the statistics cover fewer
/// than `config.min_cycles_for_prediction` records, and with `InvalidDate`
/// when the projection runs past the representable calendar.
pub fn predict_next_cycle(
    stats: &CycleStatistics,
    most_recent: &CycleRecord,
    config: &AnalyticsConfig,
) -> Result<Prediction> {
    config.validate()?;
    if stats.total_cycle_count < config.min_cycles_for_prediction {
        return Err(Error::InsufficientData {
            required: config.min_cycles_for_prediction,
            found: stats.total_cycle_count,
        });
    }

    let average = stats.average_cycle_length_days;
    let predicted_next_cycle_start = add_days(most_recent.start_date, average)?;
    let predicted_ovulation_date =
        add_days(predicted_next_cycle_start, -config.luteal_phase_days)?;
    let radius = config.ovulation_window_radius_days;
    let ovulation_window = shift_window(predicted_ovulation_date, radius, radius)?;

    tracing::debug!(
        "Predicted next cycle {} (ovulation {}) from {} using {} day average",
        predicted_next_cycle_start,
        predicted_ovulation_date,
        most_recent.start_date,
        average
    );

    Ok(Prediction {
        predicted_next_cycle_start,
        predicted_ovulation_date,
        ovulation_window,
        basis_average_length: average,
        basis_cycle_count: stats.completed_cycle_count,
    })
}

/// Compute statistics and project the next cycle in one step
pub fn predict(cycles: &[CycleRecord], config: &AnalyticsConfig) -> Result<Prediction> {
    let stats = compute_statistics(cycles, config)?;
    let most_recent = most_recent_cycle(cycles).ok_or(Error::InsufficientData {
        required: config.min_cycles_for_prediction,
        found: 0,
    })?;
    predict_next_cycle(&stats, most_recent, config)
}
