//! File-backed store for the user's chosen locations.
//!
//! The file holds a JSON object with a single record:
//! `{"locations": {"locations": [...], "current_location": "..." | null}}`.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::types::StoredPreferences;

/// Key the preference record is stored under.
pub const RECORD_KEY: &str = "locations";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read store at {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write store at {}: {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Store file is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("Failed to serialize store: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Sole reader and writer of the preference file.
#[derive(Debug, Clone)]
pub struct LocationStore {
    path: PathBuf,
}

impl LocationStore {
    /// Open a store backed by `path`. The file is created on first save.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        tracing::debug!("Location store at {:?}", path);
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted record, `None` if nothing was ever saved.
    pub fn load(&self) -> Result<Option<StoredPreferences>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut records: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&contents).map_err(StoreError::Corrupt)?;

        records
            .remove(RECORD_KEY)
            .map(|record| serde_json::from_value(record).map_err(StoreError::Corrupt))
            .transpose()
    }

    /// Overwrite the persisted record.
    pub fn save(&self, prefs: &StoredPreferences) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let records = BTreeMap::from([(RECORD_KEY, prefs)]);
        let json = serde_json::to_string_pretty(&records).map_err(StoreError::Serialize)?;

        fs::write(&self.path, json).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        tracing::info!(
            "Saved {} locations (current: {:?})",
            prefs.locations.len(),
            prefs.current_location
        );
        Ok(())
    }

    /// Convenience form of [`save`](Self::save) taking the two fields.
    pub fn save_parts(
        &self,
        locations: &[String],
        current_location: Option<&str>,
    ) -> Result<(), StoreError> {
        self.save(&StoredPreferences {
            locations: locations.to_vec(),
            current_location: current_location.map(str::to_string),
        })
    }

    /// Reset both fields.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.save(&StoredPreferences::default())
    }
}
