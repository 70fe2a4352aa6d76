//! The task-tracker store.
//!
//! A single JSON file maps session_key -> [`TaskRecord`]. The store is the
//! component that enforces the forward-only status machine: an update that
//! would move a record backward is rejected, so `done` really is terminal
//! no matter which tick or CLI invocation races in.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;

use vigil_types::{Result, TaskRecord, TaskStatus, VigilError};

/// Narrow repository interface over the tracker.
pub trait TaskStore {
    /// Look up one record by session key.
    fn get(&self, session_key: &str) -> Result<Option<TaskRecord>>;
    /// Insert a new record or replace one wholesale (spawn registration).
    fn put(&self, record: TaskRecord) -> Result<()>;
    /// Move a record's status forward. Rejects backward transitions.
    fn transition(&self, session_key: &str, next: TaskStatus) -> Result<TaskRecord>;
    /// All records, ordered by session key.
    fn list(&self) -> Result<Vec<TaskRecord>>;
}

/// File-backed tracker store.
pub struct FileTaskStore {
    path: PathBuf,
}

impl FileTaskStore {
    pub fn open(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn open_default() -> Self {
        Self::open(vigil_types::paths::tasks_path())
    }

    fn read_all(&self) -> Result<BTreeMap<String, TaskRecord>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map_err(|e| VigilError::Store(format!("{}: {e}", self.path.display())))
    }

    fn write_all(&self, map: &BTreeMap<String, TaskRecord>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(map)
            .map_err(|e| VigilError::Store(format!("serialize tasks: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl TaskStore for FileTaskStore {
    fn get(&self, session_key: &str) -> Result<Option<TaskRecord>> {
        Ok(self.read_all()?.remove(session_key))
    }

    fn put(&self, record: TaskRecord) -> Result<()> {
        let mut map = self.read_all()?;
        map.insert(record.session_key.clone(), record);
        self.write_all(&map)
    }

    fn transition(&self, session_key: &str, next: TaskStatus) -> Result<TaskRecord> {
        let mut map = self.read_all()?;
        let record = map
            .get_mut(session_key)
            .ok_or_else(|| VigilError::Store(format!("unknown task '{session_key}'")))?;

        if !record.status.can_transition_to(next) {
            return Err(VigilError::Store(format!(
                "task '{session_key}': illegal transition {} -> {next}",
                record.status
            )));
        }

        record.status = next;
        if next == TaskStatus::Done {
            record.completed_at = Some(Utc::now());
        }
        let updated = record.clone();
        self.write_all(&map)?;
        Ok(updated)
    }

    fn list(&self) -> Result<Vec<TaskRecord>> {
        Ok(self.read_all()?.into_values().collect())
    }
}

/// Register a spawned task before dispatch. Starts the SLA clock.
pub fn track(
    store: &dyn TaskStore,
    session_key: &str,
    label: &str,
    output_file: &Path,
) -> Result<TaskRecord> {
    let record = TaskRecord {
        session_key: session_key.to_string(),
        label: label.to_string(),
        spawn_time: Utc::now(),
        output_file: output_file.to_path_buf(),
        status: TaskStatus::Running,
        completed_at: None,
    };
    store.put(record.clone())?;
    tracing::info!(session_key, label, "task registered");
    Ok(record)
}

/// Mark a task done. Terminal and idempotent: completing an already-done
/// task returns it unchanged.
pub fn complete(store: &dyn TaskStore, session_key: &str) -> Result<TaskRecord> {
    if let Some(record) = store.get(session_key)? {
        if record.status == TaskStatus::Done {
            tracing::debug!(session_key, "task already done");
            return Ok(record);
        }
    }
    let record = store.transition(session_key, TaskStatus::Done)?;
    tracing::info!(session_key, "task completed");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileTaskStore) {
        let tmp = TempDir::new().unwrap();
        let store = FileTaskStore::open(tmp.path().join("tasks.json"));
        (tmp, store)
    }

    #[test]
    fn track_creates_running_record() {
        let (_tmp, store) = store();
        let record = track(&store, "s-1", "research", Path::new("/tmp/out.md")).unwrap();
        assert_eq!(record.status, TaskStatus::Running);
        assert!(record.completed_at.is_none());
        assert_eq!(store.get("s-1").unwrap(), Some(record));
    }

    #[test]
    fn complete_sets_done_and_timestamp() {
        let (_tmp, store) = store();
        track(&store, "s-1", "research", Path::new("/tmp/out.md")).unwrap();

        let record = complete(&store, "s-1").unwrap();
        assert_eq!(record.status, TaskStatus::Done);
        assert!(record.completed_at.is_some());
    }

    #[test]
    fn complete_is_idempotent() {
        let (_tmp, store) = store();
        track(&store, "s-1", "research", Path::new("/tmp/out.md")).unwrap();
        let first = complete(&store, "s-1").unwrap();
        let second = complete(&store, "s-1").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn complete_unknown_task_is_an_error() {
        let (_tmp, store) = store();
        assert!(complete(&store, "ghost").is_err());
    }

    #[test]
    fn alerted_task_can_still_complete() {
        let (_tmp, store) = store();
        track(&store, "s-1", "research", Path::new("/tmp/out.md")).unwrap();
        store.transition("s-1", TaskStatus::Alerted).unwrap();

        let record = complete(&store, "s-1").unwrap();
        assert_eq!(record.status, TaskStatus::Done);
    }

    #[test]
    fn backward_transitions_are_rejected() {
        let (_tmp, store) = store();
        track(&store, "s-1", "research", Path::new("/tmp/out.md")).unwrap();
        complete(&store, "s-1").unwrap();

        assert!(store.transition("s-1", TaskStatus::Alerted).is_err());
        assert!(store.transition("s-1", TaskStatus::Running).is_err());
        // Record unchanged.
        assert_eq!(store.get("s-1").unwrap().unwrap().status, TaskStatus::Done);
    }

    #[test]
    fn list_orders_by_session_key() {
        let (_tmp, store) = store();
        track(&store, "zz", "a", Path::new("/tmp/a")).unwrap();
        track(&store, "aa", "b", Path::new("/tmp/b")).unwrap();

        let keys: Vec<String> = store.list().unwrap().into_iter().map(|r| r.session_key).collect();
        assert_eq!(keys, vec!["aa", "zz"]);
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let (_tmp, store) = store();
        assert!(store.list().unwrap().is_empty());
        assert!(store.get("anything").unwrap().is_none());
    }
}
