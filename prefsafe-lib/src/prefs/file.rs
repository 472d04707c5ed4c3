//! JSON-file persistence for [`MapStore`].
//!
//! The whole map is rewritten on every flush: serialized to a sibling
//! temporary file, then renamed over the target so readers never see a
//! half-written file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::map_store::{MapStore, Persistence};
use crate::value::Value;
use crate::{PrefsafeError, Result};

/// Store persisted to a JSON file.
pub type FileStore = MapStore<JsonFile>;

/// Writes the entry map to one JSON file.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    /// Persistence targeting `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Read the entries currently on disk. A missing file is an empty map.
    pub fn load(&self) -> Result<BTreeMap<String, Value>> {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                PrefsafeError::Storage(format!("cannot parse {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(PrefsafeError::Storage(format!(
                "cannot read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

impl Persistence for JsonFile {
    fn save(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(entries)?;
        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        tracing::trace!(path = %self.path.display(), entries = entries.len(), "saved preferences");
        Ok(())
    }
}

impl MapStore<JsonFile> {
    /// Open the store persisted at `path`, creating it on first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let file = JsonFile::new(path);
        let entries = file.load()?;
        Ok(Self::with_entries(file, entries))
    }
}
