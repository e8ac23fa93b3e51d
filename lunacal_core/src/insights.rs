//! Plain-text insight report.
//!
//! Bundles statistics, the prediction and the most common symptoms into
//! the summary shown on the insights screen. Generated reports can be
//! kept as [`InsightRecord`]s to build a history.

use crate::prediction::predict_next_cycle;
use crate::stats::{compute_statistics, days_since_last_cycle, most_recent_cycle};
use crate::symptoms::{top_symptoms, SymptomFrequency};
use crate::{
    AnalyticsConfig, CycleRecord, CycleStatistics, Error, InsightRecord, Prediction, Result,
    SymptomRecord,
};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

const TOP_SYMPTOM_COUNT: usize = 3;

#[derive(Clone, Debug)]
pub struct InsightReport {
    pub generated_on: NaiveDate,
    pub statistics: CycleStatistics,
    pub prediction: Prediction,
    pub days_since_last_cycle: Option<i64>,
    pub top_symptoms: Vec<SymptomFrequency>,
}

impl InsightReport {
    /// Derive a report from the current records
    ///
    /// Fails with `InsufficientData` under the same rule as prediction.
    pub fn build(
        cycles: &[CycleRecord],
        symptoms: &[SymptomRecord],
        today: NaiveDate,
        config: &AnalyticsConfig,
    ) -> Result<Self> {
        let statistics = compute_statistics(cycles, config)?;
        let most_recent = most_recent_cycle(cycles).ok_or(Error::InsufficientData {
            required: config.min_cycles_for_prediction,
            found: 0,
        })?;
        let prediction = predict_next_cycle(&statistics, most_recent, config)?;

        Ok(Self {
            generated_on: today,
            days_since_last_cycle: days_since_last_cycle(cycles, today),
            top_symptoms: top_symptoms(symptoms, TOP_SYMPTOM_COUNT),
            statistics,
            prediction,
        })
    }

    pub fn render(&self) -> String {
        let symptom_names: Vec<&str> = self
            .top_symptoms
            .iter()
            .map(|f| f.symptom_type.as_str())
            .collect();

        let mut lines = vec![
            "Based on your cycle tracking data:".to_string(),
            String::new(),
            format!(
                "Average Cycle Length: {} days",
                self.statistics.average_cycle_length_days
            ),
            format!("Total Cycles Tracked: {}", self.statistics.total_cycle_count),
            format!(
                "Predicted Next Period: {}",
                self.prediction.predicted_next_cycle_start
            ),
            format!(
                "Predicted Ovulation: {}",
                self.prediction.predicted_ovulation_date
            ),
        ];
        if let Some(days) = self.days_since_last_cycle {
            lines.push(format!("Days Since Last Period: {}", days));
        }

        let common = if symptom_names.is_empty() {
            "None recorded yet".to_string()
        } else {
            symptom_names.join(", ")
        };
        lines.push(String::new());
        lines.push(format!("Your most common symptoms are: {}", common));
        lines.push(String::new());

        lines.push("Recommendations:".into());
        lines.push("- Continue tracking regularly to improve prediction accuracy".into());
        lines.push("- Log symptoms daily for better pattern recognition".into());
        lines.push("- Stay hydrated and get adequate rest during your cycle".into());
        lines.push(match symptom_names.first() {
            Some(top) => format!("- Consider noting when {} typically occurs in your cycle", top),
            None => "- Start logging symptoms to get personalized insights".into(),
        });

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    /// Snapshot this report for the history
    pub fn to_record(&self, user_id: impl Into<String>) -> InsightRecord {
        InsightRecord {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            generated_on: self.generated_on,
            predicted_next_cycle_start: self.prediction.predicted_next_cycle_start,
            predicted_ovulation_date: self.prediction.predicted_ovulation_date,
            cycle_length_avg: self.statistics.average_cycle_length_days,
            insights_text: self.render(),
            created_at: Utc::now(),
        }
    }
}

/// Saved reports, most recently generated first
pub fn history(records: &[InsightRecord]) -> Vec<&InsightRecord> {
    let mut sorted: Vec<&InsightRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        b.generated_on
            .cmp(&a.generated_on)
            .then(b.created_at.cmp(&a.created_at))
    });
    sorted
}
