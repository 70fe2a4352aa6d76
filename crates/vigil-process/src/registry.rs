//! The process-definition registry.
//!
//! A single JSON file maps name -> [`ProcessDefinition`]. Writes replace
//! the whole map atomically (temp file + rename), last writer wins. The
//! [`DefinitionStore`] trait keeps the persistence mechanism swappable
//! without touching callers.

use std::collections::BTreeMap;
use std::path::PathBuf;

use vigil_types::{ProcessDefinition, Result, VigilError};

/// Narrow repository interface over the registry.
pub trait DefinitionStore {
    /// Look up one definition by name.
    fn get(&self, name: &str) -> Result<Option<ProcessDefinition>>;
    /// Insert or overwrite a definition. Idempotent; last write wins.
    fn upsert(&self, def: ProcessDefinition) -> Result<()>;
    /// Remove a definition. Returns `false` if it was absent.
    fn remove(&self, name: &str) -> Result<bool>;
    /// All definitions, ordered by name.
    fn list(&self) -> Result<Vec<ProcessDefinition>>;
}

/// File-backed registry store.
pub struct FileDefinitionStore {
    path: PathBuf,
}

impl FileDefinitionStore {
    /// Open a store backed by the given file. The file need not exist yet.
    pub fn open(path: PathBuf) -> Self {
        Self { path }
    }

    /// Open the store at the default registry path.
    pub fn open_default() -> Self {
        Self::open(vigil_types::paths::registry_path())
    }

    fn read_all(&self) -> Result<BTreeMap<String, ProcessDefinition>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map_err(|e| VigilError::Store(format!("{}: {e}", self.path.display())))
    }

    fn write_all(&self, map: &BTreeMap<String, ProcessDefinition>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(map)
            .map_err(|e| VigilError::Store(format!("serialize registry: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl DefinitionStore for FileDefinitionStore {
    fn get(&self, name: &str) -> Result<Option<ProcessDefinition>> {
        Ok(self.read_all()?.remove(name))
    }

    fn upsert(&self, def: ProcessDefinition) -> Result<()> {
        let mut map = self.read_all()?;
        let replaced = map.insert(def.name.clone(), def).is_some();
        self.write_all(&map)?;
        tracing::debug!(replaced, "registry upsert");
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<bool> {
        let mut map = self.read_all()?;
        let removed = map.remove(name).is_some();
        if removed {
            self.write_all(&map)?;
        }
        Ok(removed)
    }

    fn list(&self) -> Result<Vec<ProcessDefinition>> {
        Ok(self.read_all()?.into_values().collect())
    }
}
