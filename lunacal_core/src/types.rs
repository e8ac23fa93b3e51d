//! Core domain types for the cycle analytics engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Cycle and symptom records as handed over by the record store
//! - Date intervals
//! - Derived values (statistics, predictions, phase tags)

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Intervals
// ============================================================================

/// A span of calendar days, inclusive on both ends
///
/// An interval without an end is open; for containment it only covers its
/// start day.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateInterval {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl DateInterval {
    /// Closed interval `[start, end]`, rejecting `end < start`
    pub fn closed(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let interval = Self {
            start,
            end: Some(end),
        };
        interval.validate()?;
        Ok(interval)
    }

    /// Open interval starting at `start`
    pub fn open(start: NaiveDate) -> Self {
        Self { start, end: None }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        match self.end {
            Some(end) if end < self.start => Err(Error::InvalidRange {
                start: self.start,
                end,
            }),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// A recorded menstrual period
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CycleRecord {
    pub id: Uuid,
    pub user_id: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl CycleRecord {
    /// Create a new record, validating the date range
    pub fn new(
        user_id: impl Into<String>,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<Self> {
        let record = Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            start_date,
            end_date,
            created_at: Utc::now(),
        };
        record.interval().validate()?;
        Ok(record)
    }

    pub fn interval(&self) -> DateInterval {
        DateInterval {
            start: self.start_date,
            end: self.end_date,
        }
    }

    pub fn is_closed(&self) -> bool {
        !self.interval().is_open()
    }
}

/// Symptom severity on a 1 to 5 scale
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct Intensity(u8);

impl Intensity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidIntensity(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Human readable label shown next to logged symptoms
    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Very Mild",
            2 => "Mild",
            3 => "Moderate",
            4 => "Severe",
            _ => "Very Severe",
        }
    }
}

impl TryFrom<u8> for Intensity {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Intensity> for u8 {
    fn from(intensity: Intensity) -> Self {
        intensity.0
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A logged symptom, optionally linked to the cycle it occurred in
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SymptomRecord {
    pub id: Uuid,
    pub user_id: String,
    pub symptom_type: String,
    #[serde(default)]
    pub description: Option<String>,
    pub intensity: Option<Intensity>,
    pub recorded_date: NaiveDate,
    pub cycle_id: Option<Uuid>,
}

impl SymptomRecord {
    /// Create an unlinked symptom; see [`crate::symptoms::link_symptom`]
    pub fn new(
        user_id: impl Into<String>,
        symptom_type: impl Into<String>,
        intensity: Option<Intensity>,
        recorded_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            symptom_type: symptom_type.into(),
            description: None,
            intensity,
            recorded_date,
            cycle_id: None,
        }
    }
}

/// A generated insight report as kept in the user's history
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InsightRecord {
    pub id: Uuid,
    pub user_id: String,
    pub generated_on: NaiveDate,
    pub predicted_next_cycle_start: NaiveDate,
    pub predicted_ovulation_date: NaiveDate,
    pub cycle_length_avg: i64,
    pub insights_text: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Derived values
// ============================================================================

/// Length metrics over a user's cycle history
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleStatistics {
    pub total_cycle_count: usize,
    pub completed_cycle_count: usize,
    pub average_cycle_length_days: i64,
    /// Lengths of closed cycles, ordered by start date
    pub cycle_lengths: Vec<i64>,
}

/// Forward projection of the next cycle start and ovulation window
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Prediction {
    pub predicted_next_cycle_start: NaiveDate,
    pub predicted_ovulation_date: NaiveDate,
    pub ovulation_window: DateInterval,
    pub basis_average_length: i64,
    pub basis_cycle_count: usize,
}

/// Classification of a single calendar day
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PhaseTag {
    Menstrual,
    Ovulation,
    Neutral,
}

impl fmt::Display for PhaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhaseTag::Menstrual => "menstrual",
            PhaseTag::Ovulation => "ovulation",
            PhaseTag::Neutral => "neutral",
        };
        f.write_str(name)
    }
}
