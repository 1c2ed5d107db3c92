//! Snapshot persistence.
//!
//! The whole entity graph is written as one JSON blob under [`STUDY_DATA_KEY`]
//! after every mutation and read back wholesale on startup. The backend is a
//! small key/value port so the store can run against files or memory.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::models::{StudyCycle, StudyPlan, StudySession, Subject, Task};
use crate::timer::StudyTimer;

/// Key of the entity snapshot.
pub const STUDY_DATA_KEY: &str = "study-data";
/// Version written by this build. Unversioned snapshots are version 1.
pub const SNAPSHOT_VERSION: u64 = 2;

/// String-keyed blob storage, the equivalent of browser local storage.
pub trait SnapshotStore: Send {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, blob: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SnapshotStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let mut f = OpenOptions::new().read(true).open(&path)?;
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        Ok(Some(s))
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(self.path(key))?;
        f.write_all(blob.as_bytes())?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// In-memory backend. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok().and_then(|m| m.get(key).cloned())
    }

    pub fn insert(&self, key: &str, blob: impl Into<String>) {
        if let Ok(mut m) = self.entries.lock() {
            m.insert(key.to_string(), blob.into());
        }
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        self.insert(key, blob);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if let Ok(mut m) = self.entries.lock() {
            m.remove(key);
        }
        Ok(())
    }
}

/// Every entity collection plus the active selections and the timer.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudyData {
    pub subjects: Vec<Subject>,
    pub study_sessions: Vec<StudySession>,
    pub tasks: Vec<Task>,
    pub study_plans: Vec<StudyPlan>,
    /// Id of the active plan.
    pub active_study_plan: Option<String>,
    pub study_cycles: Vec<StudyCycle>,
    /// Id of the active cycle.
    pub active_cycle: Option<String>,
    pub study_timer: StudyTimer,
}

#[derive(Serialize)]
struct VersionedSnapshot<'a> {
    version: u64,
    #[serde(flatten)]
    data: &'a StudyData,
}

/// Serializes the snapshot with its format version.
pub fn encode(data: &StudyData) -> Result<String, StorageError> {
    let snapshot = VersionedSnapshot { version: SNAPSHOT_VERSION, data };
    Ok(serde_json::to_string_pretty(&snapshot)?)
}

/// Parses a snapshot, migrating older versions first.
///
/// A blob that is not a JSON object is an error. Inside a valid object each
/// collection is decoded on its own: a missing, null or malformed field falls
/// back to its empty default without discarding the others.
pub fn decode(blob: &str) -> Result<StudyData, StorageError> {
    let mut value: Value = serde_json::from_str(blob)?;
    let version = value.get("version").and_then(Value::as_u64).unwrap_or(1);
    if version > SNAPSHOT_VERSION {
        return Err(StorageError::UnsupportedVersion(version));
    }
    if version < SNAPSHOT_VERSION {
        info!(from = version, to = SNAPSHOT_VERSION, "migrating snapshot");
        migrate_v1(&mut value);
    }
    let mut obj = match value {
        Value::Object(obj) => obj,
        _ => {
            return Err(StorageError::Json(serde::de::Error::custom(
                "snapshot is not a JSON object",
            )))
        }
    };
    Ok(StudyData {
        subjects: field(&mut obj, "subjects"),
        study_sessions: field(&mut obj, "studySessions"),
        tasks: field(&mut obj, "tasks"),
        study_plans: field(&mut obj, "studyPlans"),
        active_study_plan: field(&mut obj, "activeStudyPlan"),
        study_cycles: field(&mut obj, "studyCycles"),
        active_cycle: field(&mut obj, "activeCycle"),
        study_timer: field(&mut obj, "studyTimer"),
    })
}

fn field<T: DeserializeOwned + Default>(obj: &mut Map<String, Value>, key: &str) -> T {
    match obj.remove(key) {
        None | Some(Value::Null) => T::default(),
        Some(v) => serde_json::from_value(v).unwrap_or_else(|e| {
            warn!(field = key, error = %e, "discarding malformed snapshot field");
            T::default()
        }),
    }
}

/// Writes the snapshot, overwriting the previous one.
pub fn save(storage: &dyn SnapshotStore, data: &StudyData) -> Result<(), StorageError> {
    let blob = encode(data)?;
    storage.write(STUDY_DATA_KEY, &blob)?;
    debug!(bytes = blob.len(), "snapshot saved");
    Ok(())
}

/// Reads the snapshot. Missing or unreadable data yields empty defaults.
pub fn load(storage: &dyn SnapshotStore) -> StudyData {
    let blob = match storage.read(STUDY_DATA_KEY) {
        Ok(Some(blob)) => blob,
        Ok(None) => return StudyData::default(),
        Err(e) => {
            warn!(error = %e, "failed to read snapshot, starting empty");
            return StudyData::default();
        }
    };
    match decode(&blob) {
        Ok(data) => {
            info!(
                subjects = data.subjects.len(),
                tasks = data.tasks.len(),
                sessions = data.study_sessions.len(),
                "snapshot loaded"
            );
            data
        }
        Err(e) => {
            warn!(error = %e, "failed to parse snapshot, starting empty");
            StudyData::default()
        }
    }
}

/// Upgrades an unversioned snapshot in place.
///
/// - `activeStudyPlan` held a copy of the plan; it now holds the plan id.
/// - Cycles were task-based (`tasks`, `totalHours`, `completedHours`); each
///   task becomes a cycle subject with its estimate as planned minutes.
/// - Date-only fields were written as full timestamps.
fn migrate_v1(value: &mut Value) {
    let Some(obj) = value.as_object_mut() else {
        return;
    };

    if let Some(active) = obj.get_mut("activeStudyPlan") {
        if let Some(id) = active.get("id").and_then(Value::as_str).map(str::to_string) {
            *active = Value::String(id);
        }
    }

    if let Some(Value::Array(tasks)) = obj.get_mut("tasks") {
        for task in tasks.iter_mut() {
            truncate_date(task, "dueDate");
        }
    }

    if let Some(Value::Array(plans)) = obj.get_mut("studyPlans") {
        for plan in plans.iter_mut() {
            truncate_date(plan, "startDate");
            truncate_date(plan, "endDate");
        }
    }

    if let Some(Value::Array(cycles)) = obj.get_mut("studyCycles") {
        for cycle in cycles.iter_mut() {
            truncate_date(cycle, "startDate");
            truncate_date(cycle, "endDate");
            migrate_task_cycle(cycle);
        }
    }

    obj.insert("version".into(), Value::from(SNAPSHOT_VERSION));
}

fn migrate_task_cycle(cycle: &mut Value) {
    let Some(cycle) = cycle.as_object_mut() else {
        return;
    };
    cycle.remove("totalHours");
    cycle.remove("completedHours");
    let Some(Value::Array(tasks)) = cycle.remove("tasks") else {
        return;
    };
    if cycle.contains_key("subjects") {
        return;
    }
    let subjects: Vec<Value> = tasks
        .iter()
        .filter_map(|task| {
            let subject_id = task.get("subjectId").and_then(Value::as_str)?;
            let id = task.get("id").and_then(Value::as_str).unwrap_or(subject_id);
            let completed = task.get("completed").and_then(Value::as_bool).unwrap_or(false);
            let planned = task.get("estimatedHours").and_then(Value::as_f64).unwrap_or(0.0);
            let planned_minutes = (planned * 60.0).round().max(0.0) as u64;
            Some(serde_json::json!({
                "id": id,
                "subjectId": subject_id,
                "plannedMinutes": planned_minutes,
                "actualMinutes": if completed { planned_minutes } else { 0 },
                "status": if completed { "completed" } else { "pending" },
            }))
        })
        .collect();
    cycle.insert("subjects".into(), Value::Array(subjects));
}

fn truncate_date(entity: &mut Value, key: &str) {
    if let Some(Value::String(s)) = entity.get_mut(key) {
        if s.len() > 10 && s.is_char_boundary(10) {
            s.truncate(10);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_blob_is_an_error() {
        assert!(decode("not json").is_err());
        assert!(decode("[1, 2]").is_err());
    }

    #[test]
    fn newer_versions_are_refused() {
        let err = decode(r#"{"version": 99}"#).unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedVersion(99)));
    }

    #[test]
    fn malformed_field_defaults_alone() {
        let blob = r#"{
            "version": 2,
            "subjects": "oops",
            "activeCycle": "c1"
        }"#;
        let data = decode(blob).unwrap();
        assert!(data.subjects.is_empty());
        assert_eq!(data.active_cycle.as_deref(), Some("c1"));
    }

    #[test]
    fn memory_store_clones_share_entries() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.write("k", "v").unwrap();
        assert_eq!(b.read("k").unwrap().as_deref(), Some("v"));
        b.remove("k").unwrap();
        assert!(a.get("k").is_none());
    }
}
