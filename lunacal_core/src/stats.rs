//! Cycle length statistics.
//!
//! Statistics are recomputed from the full record set on every call and
//! depend only on its contents, never on its order.

use crate::interval::duration_days;
use crate::{AnalyticsConfig, CycleRecord, CycleStatistics, Result};
use chrono::NaiveDate;

/// Aggregate a user's cycle records into length metrics
///
/// Every record is validated before anything is derived, so a single
/// inverted range fails the whole computation with `InvalidRange`.
/// With no closed cycles the average falls back to
/// `config.default_cycle_length_days`.
pub fn compute_statistics(
    cycles: &[CycleRecord],
    config: &AnalyticsConfig,
) -> Result<CycleStatistics> {
    validate_cycles(cycles)?;

    let mut closed: Vec<(NaiveDate, NaiveDate)> = cycles
        .iter()
        .filter_map(|c| c.end_date.map(|end| (c.start_date, end)))
        .collect();
    closed.sort();

    let cycle_lengths = closed
        .iter()
        .map(|&(start, end)| duration_days(start, end))
        .collect::<Result<Vec<_>>>()?;

    let average_cycle_length_days = rounded_mean(&cycle_lengths)
        .unwrap_or(config.default_cycle_length_days);

    tracing::debug!(
        "Computed statistics over {} cycles ({} completed): average {} days",
        cycles.len(),
        cycle_lengths.len(),
        average_cycle_length_days
    );

    Ok(CycleStatistics {
        total_cycle_count: cycles.len(),
        completed_cycle_count: cycle_lengths.len(),
        average_cycle_length_days,
        cycle_lengths,
    })
}

/// Reject any record whose end precedes its start
pub fn validate_cycles(cycles: &[CycleRecord]) -> Result<()> {
    cycles.iter().try_for_each(|c| c.interval().validate())
}

/// The record with the latest start date
///
/// Equal start dates resolve to the first one encountered.
pub fn most_recent_cycle(cycles: &[CycleRecord]) -> Option<&CycleRecord> {
    cycles.iter().fold(None, |best: Option<&CycleRecord>, c| match best {
        Some(b) if b.start_date >= c.start_date => Some(b),
        _ => Some(c),
    })
}

/// Days elapsed from the most recent cycle start to `today`
///
/// Negative when the latest record starts in the future.
pub fn days_since_last_cycle(cycles: &[CycleRecord], today: NaiveDate) -> Option<i64> {
    most_recent_cycle(cycles).map(|c| (today - c.start_date).num_days())
}

/// Arithmetic mean rounded half up; lengths are never negative
fn rounded_mean(values: &[i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as i64;
    let sum: i64 = values.iter().sum();
    Some((2 * sum + n) / (2 * n))
}
