//! CSV export of cycle and symptom history.

use crate::interval::duration_days;
use crate::{CycleRecord, Result, SymptomRecord};
use std::path::Path;

/// A row in the cycle history CSV
#[derive(Debug, serde::Serialize)]
struct CycleRow {
    id: String,
    start_date: String,
    end_date: Option<String>,
    length_days: Option<i64>,
}

impl TryFrom<&CycleRecord> for CycleRow {
    type Error = crate::Error;

    fn try_from(cycle: &CycleRecord) -> Result<Self> {
        let length_days = cycle
            .end_date
            .map(|end| duration_days(cycle.start_date, end))
            .transpose()?;

        Ok(CycleRow {
            id: cycle.id.to_string(),
            start_date: cycle.start_date.to_string(),
            end_date: cycle.end_date.map(|d| d.to_string()),
            length_days,
        })
    }
}

/// A row in the symptom history CSV
#[derive(Debug, serde::Serialize)]
struct SymptomRow {
    id: String,
    recorded_date: String,
    symptom_type: String,
    intensity: Option<u8>,
    intensity_label: Option<&'static str>,
    cycle_id: Option<String>,
}

impl From<&SymptomRecord> for SymptomRow {
    fn from(symptom: &SymptomRecord) -> Self {
        SymptomRow {
            id: symptom.id.to_string(),
            recorded_date: symptom.recorded_date.to_string(),
            symptom_type: symptom.symptom_type.clone(),
            intensity: symptom.intensity.map(|i| i.value()),
            intensity_label: symptom.intensity.map(|i| i.label()),
            cycle_id: symptom.cycle_id.map(|id| id.to_string()),
        }
    }
}

/// Write cycle history to `path`, newest start first
///
/// Returns the number of rows written. Fails with `InvalidRange` before
/// writing anything if a record is inverted.
pub fn export_cycles_csv(cycles: &[CycleRecord], path: &Path) -> Result<usize> {
    let mut ordered: Vec<&CycleRecord> = cycles.iter().collect();
    ordered.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    let rows = ordered
        .into_iter()
        .map(CycleRow::try_from)
        .collect::<Result<Vec<_>>>()?;

    write_rows(path, &rows)?;
    tracing::info!("Exported {} cycles to {:?}", rows.len(), path);
    Ok(rows.len())
}

/// Write symptom history to `path`, newest date first
pub fn export_symptoms_csv(symptoms: &[SymptomRecord], path: &Path) -> Result<usize> {
    let mut ordered: Vec<&SymptomRecord> = symptoms.iter().collect();
    ordered.sort_by(|a, b| b.recorded_date.cmp(&a.recorded_date));
    let rows: Vec<SymptomRow> = ordered.into_iter().map(SymptomRow::from).collect();

    write_rows(path, &rows)?;
    tracing::info!("Exported {} symptoms to {:?}", rows.len(), path);
    Ok(rows.len())
}

fn write_rows<R: serde::Serialize>(path: &Path, rows: &[R]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new().has_headers(true).from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
