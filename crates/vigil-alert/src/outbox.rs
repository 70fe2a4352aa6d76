//! Typed outbox of pending alerts with consume-and-acknowledge semantics.
//!
//! One JSON file per pending alert, named by its UUID. Presence in the
//! directory means "not yet delivered"; `acknowledge` removes the file.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vigil_types::{Result, VigilError};

/// Which subsystem produced an alert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertSource {
    /// Process health monitor (restarts, launch failures).
    Healthcheck,
    /// Stuck-task liveness checker.
    Liveness,
}

impl std::fmt::Display for AlertSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlertSource::Healthcheck => "healthcheck",
            AlertSource::Liveness => "liveness",
        };
        f.write_str(s)
    }
}

/// One durable alert artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Alert {
    /// Unique ID, also the artifact filename stem.
    pub id: Uuid,
    /// When the alert was published.
    pub fired_at: DateTime<Utc>,
    /// Producing subsystem.
    pub source: AlertSource,
    /// Pre-formatted human-readable message body.
    pub text: String,
}

/// Directory-backed alert outbox.
pub struct Outbox {
    dir: PathBuf,
}

impl Outbox {
    /// Open (creating if needed) an outbox rooted at `dir`.
    pub fn open(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open the outbox at the default location.
    pub fn open_default() -> Result<Self> {
        Self::open(vigil_types::paths::outbox_dir())
    }

    /// Publish a new alert. Returns the durable artifact.
    pub fn publish(&self, source: AlertSource, text: impl Into<String>) -> Result<Alert> {
        let alert = Alert {
            id: Uuid::new_v4(),
            fired_at: Utc::now(),
            source,
            text: text.into(),
        };
        let path = self.artifact_path(alert.id);
        let json = serde_json::to_string_pretty(&alert)
            .map_err(|e| VigilError::Store(format!("serialize alert: {e}")))?;
        std::fs::write(&path, json)?;
        tracing::info!(id = %alert.id, source = %alert.source, "alert published");
        Ok(alert)
    }

    /// All pending alerts, oldest first.
    ///
    /// Unreadable artifacts are skipped with a warning so one bad file
    /// never hides the rest of the queue.
    pub fn pending(&self) -> Result<Vec<Alert>> {
        let mut alerts = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str::<Alert>(&s).map_err(|e| e.to_string()))
            {
                Ok(alert) => alerts.push(alert),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable alert artifact");
                }
            }
        }
        alerts.sort_by_key(|a| a.fired_at);
        Ok(alerts)
    }

    /// Acknowledge (consume) a delivered alert. Returns `false` if the
    /// artifact was already gone.
    pub fn acknowledge(&self, id: Uuid) -> Result<bool> {
        let path = self.artifact_path(id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn artifact_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn outbox() -> (TempDir, Outbox) {
        let tmp = TempDir::new().unwrap();
        let outbox = Outbox::open(tmp.path().join("outbox")).unwrap();
        (tmp, outbox)
    }

    #[test]
    fn publish_then_pending_returns_it() {
        let (_tmp, outbox) = outbox();
        let alert = outbox
            .publish(AlertSource::Healthcheck, "job-a restarted")
            .unwrap();

        let pending = outbox.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0], alert);
    }

    #[test]
    fn acknowledge_consumes_the_artifact() {
        let (_tmp, outbox) = outbox();
        let alert = outbox.publish(AlertSource::Liveness, "task stuck").unwrap();

        assert!(outbox.acknowledge(alert.id).unwrap());
        assert!(outbox.pending().unwrap().is_empty());

        // Second acknowledge is a clean no-op.
        assert!(!outbox.acknowledge(alert.id).unwrap());
    }

    #[test]
    fn pending_is_oldest_first() {
        let (_tmp, outbox) = outbox();
        let first = outbox.publish(AlertSource::Healthcheck, "one").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = outbox.publish(AlertSource::Healthcheck, "two").unwrap();

        let pending = outbox.pending().unwrap();
        assert_eq!(pending[0].id, first.id);
        assert_eq!(pending[1].id, second.id);
    }

    #[test]
    fn unreadable_artifact_is_skipped() {
        let (tmp, outbox) = outbox();
        outbox.publish(AlertSource::Healthcheck, "good").unwrap();
        std::fs::write(tmp.path().join("outbox").join("junk.json"), "{not json").unwrap();

        let pending = outbox.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].text, "good");
    }

    #[test]
    fn non_json_files_ignored() {
        let (tmp, outbox) = outbox();
        std::fs::write(tmp.path().join("outbox").join("README"), "ignore me").unwrap();
        assert!(outbox.pending().unwrap().is_empty());
    }
}
