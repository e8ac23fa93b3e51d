//! Calendar phase classification.
//!
//! Decides for any day whether it falls in a menstrual span, an ovulation
//! window, or neither. The rules:
//!
//! 1. **Menstrual**: some cycle contains the day (a closed cycle over its
//!    whole span, an open cycle on its start day only).
//! 2. **Ovulation**: otherwise, the day lies within
//!    `[start + 14 - 2, start + 14 + 2]` of some closed cycle.
//! 3. **Neutral**: nothing matched.
//!
//! Menstrual beats ovulation no matter which cycle produced either match,
//! so the result never depends on the order of the records.

use crate::interval::{add_days, contains, shift_window};
use crate::stats::validate_cycles;
use crate::{AnalyticsConfig, CycleRecord, DateInterval, Error, PhaseTag, Result};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Number of cells in a six-week month view
pub const MONTH_GRID_CELLS: usize = 42;

/// Classifies days against a validated snapshot of cycle records
///
/// Holds only borrowed, immutable input; every call to [`classify`] is
/// independent of every other.
///
/// [`classify`]: PhaseClassifier::classify
#[derive(Debug)]
pub struct PhaseClassifier<'a> {
    cycles: &'a [CycleRecord],
    luteal_phase_days: i64,
    window_radius_days: i64,
}

impl<'a> PhaseClassifier<'a> {
    /// Validate the record set once; fails with `InvalidRange` on any
    /// inverted cycle
    pub fn new(cycles: &'a [CycleRecord], config: &AnalyticsConfig) -> Result<Self> {
        config.validate()?;
        validate_cycles(cycles)?;
        Ok(Self {
            cycles,
            luteal_phase_days: config.luteal_phase_days,
            window_radius_days: config.ovulation_window_radius_days,
        })
    }

    /// Ovulation window anchored on a historical cycle start
    ///
    /// Fails with `InvalidDate` when the window runs past the calendar.
    pub fn ovulation_window(&self, cycle: &CycleRecord) -> Result<DateInterval> {
        let ovulation = add_days(cycle.start_date, self.luteal_phase_days)?;
        shift_window(ovulation, self.window_radius_days, self.window_radius_days)
    }

    /// Day offsets from a cycle start that fall in its ovulation window
    fn in_ovulation_window(&self, cycle: &CycleRecord, day: NaiveDate) -> bool {
        let offset = (day - cycle.start_date).num_days();
        let lo = self.luteal_phase_days - self.window_radius_days;
        let hi = self.luteal_phase_days + self.window_radius_days;
        (lo..=hi).contains(&offset)
    }

    pub fn classify(&self, day: NaiveDate) -> PhaseTag {
        if self.cycles.iter().any(|c| contains(&c.interval(), day)) {
            return PhaseTag::Menstrual;
        }

        let in_window = self
            .cycles
            .iter()
            .filter(|c| c.is_closed())
            .any(|c| self.in_ovulation_window(c, day));

        if in_window {
            PhaseTag::Ovulation
        } else {
            PhaseTag::Neutral
        }
    }

    /// Classify every day in `[from, to]`
    pub fn classify_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, PhaseTag>> {
        if to < from {
            return Err(Error::InvalidRange { start: from, end: to });
        }
        Ok(from
            .iter_days()
            .take_while(|d| *d <= to)
            .map(|d| (d, self.classify(d)))
            .collect())
    }

    /// Build the 42-cell grid for a month, weeks starting on Sunday
    pub fn month_grid(&self, year: i32, month: u32) -> Result<MonthGrid> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::InvalidDate(format!("{}-{:02}", year, month)))?;
        let days_in_month = days_in_month(first);
        let leading = first.weekday().num_days_from_sunday() as usize;

        let mut cells: Vec<Option<CalendarCell>> = Vec::with_capacity(MONTH_GRID_CELLS);
        cells.extend(std::iter::repeat(None).take(leading));
        cells.extend(first.iter_days().take(days_in_month).map(|date| {
            Some(CalendarCell {
                date,
                phase: self.classify(date),
            })
        }));
        cells.resize(MONTH_GRID_CELLS, None);

        tracing::debug!(
            "Built month grid {}-{:02}: {} leading blanks, {} days",
            year,
            month,
            leading,
            days_in_month
        );

        Ok(MonthGrid { year, month, cells })
    }
}

/// Classify a single day in one call
pub fn classify_day(
    day: NaiveDate,
    cycles: &[CycleRecord],
    config: &AnalyticsConfig,
) -> Result<PhaseTag> {
    Ok(PhaseClassifier::new(cycles, config)?.classify(day))
}

/// One day in a month view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub phase: PhaseTag,
}

/// Six weeks of cells; `None` marks a blank outside the month
#[derive(Clone, Debug)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<Option<CalendarCell>>,
}

impl MonthGrid {
    /// Cells split into rows of seven, Sunday first
    pub fn weeks(&self) -> impl Iterator<Item = &[Option<CalendarCell>]> {
        self.cells.chunks(7)
    }

    pub fn days(&self) -> impl Iterator<Item = &CalendarCell> {
        self.cells.iter().flatten()
    }
}

fn days_in_month(first: NaiveDate) -> usize {
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next_month
        .map(|next| (next - first).num_days() as usize)
        .unwrap_or(31)
}
