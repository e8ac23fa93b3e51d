//! Append-only record store.
//!
//! Cycles and symptoms are kept as JSON Lines files so several CLI
//! invocations can share a data directory. Every file has a `.lock`
//! sidecar: appends and deletes hold it exclusively, reads hold it shared.
//! Deletes replace the data file by rename, so the lock cannot live on the
//! data file itself.
//!
//! This is the storage collaborator the engine reads from; the engine
//! itself never touches it.

use crate::{CycleRecord, Error, InsightRecord, Result, SymptomRecord};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

const CYCLES_FILE: &str = "cycles.jsonl";
const SYMPTOMS_FILE: &str = "symptoms.jsonl";
const INSIGHTS_FILE: &str = "insights.jsonl";

/// Advisory lock on a record file's sidecar, released on drop
struct FileLock {
    file: File,
}

impl FileLock {
    fn sidecar(path: &Path) -> Result<File> {
        let mut name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| Error::Other(format!("record path {:?} has no file name", path)))?;
        name.push(".lock");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path.with_file_name(name))?;
        Ok(file)
    }

    fn exclusive(path: &Path) -> Result<Self> {
        let file = Self::sidecar(path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }

    fn shared(path: &Path) -> Result<Self> {
        let file = Self::sidecar(path)?;
        file.lock_shared()?;
        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to release store lock: {}", e);
        }
    }
}

/// Sink trait for persisting records
pub trait RecordSink<T> {
    fn append(&mut self, record: &T) -> Result<()>;
}

/// JSONL-based record sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl<T: Serialize> RecordSink<T> for JsonlSink {
    fn append(&mut self, record: &T) -> Result<()> {
        let line = serde_json::to_string(record)?;
        let _lock = FileLock::exclusive(&self.path)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = std::io::BufWriter::new(&file);
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        tracing::debug!("Appended record to {:?}", self.path);
        Ok(())
    }
}

/// Read every record from a JSONL file
///
/// A missing file reads as empty. Lines that fail to parse are skipped
/// with a warning.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let _lock = FileLock::shared(path)?;
    read_records_locked(path)
}

/// Body of [`read_records`]; the caller holds the sidecar lock
fn read_records_locked<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<T>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(
                    "Skipping malformed record at {:?} line {}: {}",
                    path,
                    line_num + 1,
                    e
                );
            }
        }
    }

    tracing::debug!("Read {} records from {:?}", records.len(), path);
    Ok(records)
}

/// Read, edit and atomically replace a JSONL file under its exclusive lock
///
/// `edit` returns false to leave the file untouched. The replacement is
/// written to a temp file in the same directory, synced, then renamed over
/// the data file.
fn modify_records<T, F>(path: &Path, edit: F) -> Result<bool>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce(&mut Vec<T>) -> bool,
{
    let _lock = FileLock::exclusive(path)?;
    let mut records: Vec<T> = read_records_locked(path)?;
    if !edit(&mut records) {
        return Ok(false);
    }

    let parent = path
        .parent()
        .ok_or_else(|| Error::Other(format!("record path {:?} has no parent", path)))?;
    let temp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        for record in &records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(true)
}

/// Per-user view over the cycle and symptom files in a data directory
#[derive(Clone, Debug)]
pub struct RecordStore {
    dir: PathBuf,
    user_id: String,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>, user_id: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn cycles_path(&self) -> PathBuf {
        self.dir.join(CYCLES_FILE)
    }

    pub fn symptoms_path(&self) -> PathBuf {
        self.dir.join(SYMPTOMS_FILE)
    }

    pub fn insights_path(&self) -> PathBuf {
        self.dir.join(INSIGHTS_FILE)
    }

    /// All of this user's cycles, in file order
    pub fn load_cycles(&self) -> Result<Vec<CycleRecord>> {
        let mut cycles: Vec<CycleRecord> = read_records(&self.cycles_path())?;
        cycles.retain(|c| c.user_id == self.user_id);
        Ok(cycles)
    }

    /// All of this user's symptoms, in file order
    pub fn load_symptoms(&self) -> Result<Vec<SymptomRecord>> {
        let mut symptoms: Vec<SymptomRecord> = read_records(&self.symptoms_path())?;
        symptoms.retain(|s| s.user_id == self.user_id);
        Ok(symptoms)
    }

    /// All of this user's saved insight reports, in file order
    pub fn load_insights(&self) -> Result<Vec<InsightRecord>> {
        let mut insights: Vec<InsightRecord> = read_records(&self.insights_path())?;
        insights.retain(|i| i.user_id == self.user_id);
        Ok(insights)
    }

    pub fn append_insight(&self, insight: &InsightRecord) -> Result<()> {
        JsonlSink::new(self.insights_path()).append(insight)?;
        tracing::info!("Stored insight {} for {}", insight.id, insight.generated_on);
        Ok(())
    }

    pub fn append_cycle(&self, cycle: &CycleRecord) -> Result<()> {
        cycle.interval().validate()?;
        JsonlSink::new(self.cycles_path()).append(cycle)?;
        tracing::info!("Stored cycle {} starting {}", cycle.id, cycle.start_date);
        Ok(())
    }

    pub fn append_symptom(&self, symptom: &SymptomRecord) -> Result<()> {
        JsonlSink::new(self.symptoms_path()).append(symptom)?;
        tracing::info!(
            "Stored symptom {} on {}",
            symptom.symptom_type,
            symptom.recorded_date
        );
        Ok(())
    }

    /// Delete one of this user's cycles
    ///
    /// Symptoms that pointed at the cycle are kept but unlinked. Returns
    /// false when no such cycle exists.
    pub fn delete_cycle(&self, id: Uuid) -> Result<bool> {
        let user_id = self.user_id.as_str();
        let removed = modify_records::<CycleRecord, _>(&self.cycles_path(), |cycles| {
            let before = cycles.len();
            cycles.retain(|c| !(c.id == id && c.user_id == user_id));
            cycles.len() != before
        })?;
        if !removed {
            return Ok(false);
        }

        let mut unlinked = 0;
        modify_records::<SymptomRecord, _>(&self.symptoms_path(), |symptoms| {
            for symptom in symptoms.iter_mut().filter(|s| s.cycle_id == Some(id)) {
                symptom.cycle_id = None;
                unlinked += 1;
            }
            unlinked > 0
        })?;

        tracing::info!("Deleted cycle {} ({} symptoms unlinked)", id, unlinked);
        Ok(true)
    }

    /// Delete one of this user's symptoms; false when absent
    pub fn delete_symptom(&self, id: Uuid) -> Result<bool> {
        let user_id = self.user_id.as_str();
        let removed = modify_records::<SymptomRecord, _>(&self.symptoms_path(), |symptoms| {
            let before = symptoms.len();
            symptoms.retain(|s| !(s.id == id && s.user_id == user_id));
            symptoms.len() != before
        })?;
        if removed {
            tracing::info!("Deleted symptom {}", id);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symptoms::link_symptom;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_append_and_load_cycles() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(temp_dir.path(), "alex");

        let first = CycleRecord::new("alex", date(2024, 1, 1), Some(date(2024, 1, 5))).unwrap();
        let second = CycleRecord::new("alex", date(2024, 1, 29), None).unwrap();
        store.append_cycle(&first).unwrap();
        store.append_cycle(&second).unwrap();

        let cycles = store.load_cycles().unwrap();
        assert_eq!(cycles, vec![first, second]);
    }

    #[test]
    fn test_load_filters_other_users() {
        let temp_dir = tempfile::tempdir().unwrap();
        let alex = RecordStore::new(temp_dir.path(), "alex");
        let sam = RecordStore::new(temp_dir.path(), "sam");

        alex.append_cycle(&CycleRecord::new("alex", date(2024, 1, 1), None).unwrap())
            .unwrap();
        sam.append_cycle(&CycleRecord::new("sam", date(2024, 2, 1), None).unwrap())
            .unwrap();

        assert_eq!(alex.load_cycles().unwrap().len(), 1);
        assert_eq!(sam.load_cycles().unwrap()[0].start_date, date(2024, 2, 1));
    }

    #[test]
    fn test_missing_files_read_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(temp_dir.path().join("nothing"), "alex");
        assert!(store.load_cycles().unwrap().is_empty());
        assert!(store.load_symptoms().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(temp_dir.path(), "alex");
        store
            .append_cycle(&CycleRecord::new("alex", date(2024, 1, 1), None).unwrap())
            .unwrap();

        let mut file = OpenOptions::new()
            .append(true)
            .open(store.cycles_path())
            .unwrap();
        writeln!(file, "{{ not json").unwrap();
        drop(file);

        store
            .append_cycle(&CycleRecord::new("alex", date(2024, 2, 1), None).unwrap())
            .unwrap();

        assert_eq!(store.load_cycles().unwrap().len(), 2);
    }

    #[test]
    fn test_append_rejects_inverted_cycle() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(temp_dir.path(), "alex");
        let mut cycle = CycleRecord::new("alex", date(2024, 1, 10), None).unwrap();
        cycle.end_date = Some(date(2024, 1, 1));

        assert!(matches!(
            store.append_cycle(&cycle),
            Err(Error::InvalidRange { .. })
        ));
        assert!(!store.cycles_path().exists());
    }

    #[test]
    fn test_delete_cycle_unlinks_symptoms() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(temp_dir.path(), "alex");

        let cycle = CycleRecord::new("alex", date(2024, 1, 1), Some(date(2024, 1, 5))).unwrap();
        store.append_cycle(&cycle).unwrap();

        let mut symptom = SymptomRecord::new("alex", "Cramps", None, date(2024, 1, 2));
        link_symptom(&mut symptom, std::slice::from_ref(&cycle));
        store.append_symptom(&symptom).unwrap();

        assert!(store.delete_cycle(cycle.id).unwrap());
        assert!(store.load_cycles().unwrap().is_empty());

        let symptoms = store.load_symptoms().unwrap();
        assert_eq!(symptoms.len(), 1);
        assert_eq!(symptoms[0].cycle_id, None);

        assert!(!store.delete_cycle(cycle.id).unwrap());
    }

    #[test]
    fn test_delete_symptom() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(temp_dir.path(), "alex");

        let keep = SymptomRecord::new("alex", "Acne", None, date(2024, 1, 2));
        let remove = SymptomRecord::new("alex", "Cramps", None, date(2024, 1, 3));
        store.append_symptom(&keep).unwrap();
        store.append_symptom(&remove).unwrap();

        assert!(store.delete_symptom(remove.id).unwrap());
        assert_eq!(store.load_symptoms().unwrap(), vec![keep]);
        assert!(!store.delete_symptom(Uuid::new_v4()).unwrap());
    }

    #[test]
    fn test_appends_survive_concurrent_deletes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(temp_dir.path(), "alex");

        let doomed: Vec<CycleRecord> = (0..50)
            .map(|i| {
                let start = date(2020, 1, 1) + chrono::Duration::days(i * 30);
                CycleRecord::new("alex", start, None).unwrap()
            })
            .collect();
        for cycle in &doomed {
            store.append_cycle(cycle).unwrap();
        }

        let appender = {
            let store = store.clone();
            std::thread::spawn(move || {
                (0..50)
                    .map(|i| {
                        let start = date(2030, 1, 1) + chrono::Duration::days(i * 30);
                        let cycle =
                            CycleRecord::new("alex", start, Some(start + chrono::Duration::days(4)))
                                .unwrap();
                        store.append_cycle(&cycle).unwrap();
                        cycle.id
                    })
                    .collect::<Vec<_>>()
            })
        };
        let deleter = {
            let store = store.clone();
            let ids: Vec<Uuid> = doomed.iter().map(|c| c.id).collect();
            std::thread::spawn(move || {
                for id in ids {
                    assert!(store.delete_cycle(id).unwrap());
                }
            })
        };

        let appended = appender.join().unwrap();
        deleter.join().unwrap();

        let remaining: Vec<Uuid> = store.load_cycles().unwrap().iter().map(|c| c.id).collect();
        assert_eq!(remaining, appended);
    }

    #[test]
    fn test_insights_saved_per_user() {
        use crate::InsightReport;

        let temp_dir = tempfile::tempdir().unwrap();
        let alex = RecordStore::new(temp_dir.path(), "alex");
        let sam = RecordStore::new(temp_dir.path(), "sam");
        let cycles = vec![
            CycleRecord::new("alex", date(2024, 1, 1), Some(date(2024, 1, 5))).unwrap(),
            CycleRecord::new("alex", date(2024, 1, 29), None).unwrap(),
        ];

        let report = InsightReport::build(
            &cycles,
            &[],
            date(2024, 2, 10),
            &crate::AnalyticsConfig::default(),
        )
        .unwrap();
        let record = report.to_record("alex");
        alex.append_insight(&record).unwrap();

        assert_eq!(alex.load_insights().unwrap(), vec![record]);
        assert!(sam.load_insights().unwrap().is_empty());
    }

    #[test]
    fn test_lock_sidecar_leaves_data_file_alone() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(temp_dir.path(), "alex");
        let symptom = SymptomRecord::new("alex", "Cramps", None, date(2024, 1, 2));
        store.append_symptom(&symptom).unwrap();

        assert!(temp_dir.path().join("symptoms.jsonl.lock").exists());
        assert!(store.delete_symptom(symptom.id).unwrap());
        assert!(store.load_symptoms().unwrap().is_empty());
    }
}
