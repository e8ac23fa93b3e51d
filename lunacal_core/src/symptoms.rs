//! Symptom association and aggregation.
//!
//! A symptom is linked to the cycle whose span contains its recorded
//! date. Linking happens once, when the symptom is logged.

use crate::interval::contains;
use crate::{CycleRecord, SymptomRecord};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// How often a symptom type was logged
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymptomFrequency {
    pub symptom_type: String,
    pub count: usize,
}

/// Find the cycle containing `recorded_date`
///
/// When overlapping cycles both contain the date, the one with the latest
/// start date wins; among equal starts the first encountered is kept.
pub fn associate_symptom(
    recorded_date: NaiveDate,
    cycles: &[CycleRecord],
) -> Option<&CycleRecord> {
    cycles
        .iter()
        .filter(|c| contains(&c.interval(), recorded_date))
        .fold(None, |best: Option<&CycleRecord>, c| match best {
            Some(b) if b.start_date >= c.start_date => Some(b),
            _ => Some(c),
        })
}

/// Fill in `cycle_id` on a symptom about to be stored
pub fn link_symptom(symptom: &mut SymptomRecord, cycles: &[CycleRecord]) {
    symptom.cycle_id = associate_symptom(symptom.recorded_date, cycles).map(|c| c.id);
    match symptom.cycle_id {
        Some(id) => tracing::debug!(
            "Linked symptom {} on {} to cycle {}",
            symptom.symptom_type,
            symptom.recorded_date,
            id
        ),
        None => tracing::debug!(
            "No cycle contains {}; symptom {} left unlinked",
            symptom.recorded_date,
            symptom.symptom_type
        ),
    }
}

/// The `n` most frequently logged symptom types
///
/// Sorted by count descending, then by name for a stable order.
pub fn top_symptoms(symptoms: &[SymptomRecord], n: usize) -> Vec<SymptomFrequency> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for symptom in symptoms {
        *counts.entry(symptom.symptom_type.as_str()).or_insert(0) += 1;
    }

    let mut frequencies: Vec<SymptomFrequency> = counts
        .into_iter()
        .map(|(symptom_type, count)| SymptomFrequency {
            symptom_type: symptom_type.to_string(),
            count,
        })
        .collect();
    frequencies.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.symptom_type.cmp(&b.symptom_type))
    });
    frequencies.truncate(n);
    frequencies
}

/// Symptoms grouped by recorded date, newest date first
pub fn group_by_date(symptoms: &[SymptomRecord]) -> Vec<(NaiveDate, Vec<&SymptomRecord>)> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&SymptomRecord>> = BTreeMap::new();
    for symptom in symptoms {
        by_date.entry(symptom.recorded_date).or_default().push(symptom);
    }
    by_date.into_iter().rev().collect()
}
