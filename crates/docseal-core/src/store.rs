//! Local key/value store for draft recovery.
//!
//! A single JSON object file holds every key. Writes go through a temporary
//! file and a rename so a crash never leaves a half-written store behind.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::SealError;
use crate::models::DraftSnapshot;

pub const DRAFT_KEY: &str = "loan_upload_draft";
pub const PRIVACY_NOTICE_KEY: &str = "privacy_notice_dismissed";

const STORE_FILE_NAME: &str = "local_storage.json";

#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    /// Store rooted in `dir`. The directory is created on first write.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STORE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>, SealError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(SealError::Storage(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            _ => {
                tracing::warn!(path = %self.path.display(), "Local store is corrupt, starting empty");
                Ok(Map::new())
            }
        }
    }

    fn write_all(&self, map: &Map<String, Value>) -> Result<(), SealError> {
        let to_storage = |e: std::io::Error| {
            SealError::Storage(format!("{}: {}", self.path.display(), e))
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(to_storage)?;
        }
        let serialized = serde_json::to_string_pretty(map)
            .map_err(|e| SealError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serialized).map_err(to_storage)?;
        fs::rename(&tmp, &self.path).map_err(to_storage)?;
        Ok(())
    }

    pub fn get_item(&self, key: &str) -> Result<Option<Value>, SealError> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn set_item(&self, key: &str, value: Value) -> Result<(), SealError> {
        let mut map = self.read_all()?;
        map.insert(key.to_string(), value);
        self.write_all(&map)
    }

    pub fn remove_item(&self, key: &str) -> Result<(), SealError> {
        let mut map = self.read_all()?;
        if map.remove(key).is_some() {
            self.write_all(&map)?;
        }
        Ok(())
    }

    pub fn save_draft(&self, snapshot: &DraftSnapshot) -> Result<(), SealError> {
        let value =
            serde_json::to_value(snapshot).map_err(|e| SealError::Storage(e.to_string()))?;
        self.set_item(DRAFT_KEY, value)
    }

    /// Saved draft, if any. An unreadable snapshot is treated as absent.
    pub fn load_draft(&self) -> Result<Option<DraftSnapshot>, SealError> {
        let Some(value) = self.get_item(DRAFT_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable draft snapshot");
                Ok(None)
            }
        }
    }

    pub fn clear_draft(&self) -> Result<(), SealError> {
        self.remove_item(DRAFT_KEY)
    }

    pub fn privacy_notice_dismissed(&self) -> Result<bool, SealError> {
        Ok(matches!(
            self.get_item(PRIVACY_NOTICE_KEY)?,
            Some(Value::Bool(true))
        ))
    }

    pub fn dismiss_privacy_notice(&self) -> Result<(), SealError> {
        self.set_item(PRIVACY_NOTICE_KEY, Value::Bool(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileMetadata;
    use chrono::Utc;

    fn snapshot() -> DraftSnapshot {
        DraftSnapshot {
            file: Some(FileMetadata {
                file_name: "loan.pdf".to_string(),
                size: 42,
                content_type: "application/pdf".to_string(),
                path: None,
            }),
            metadata: r#"{"loan_id":"LN-1"}"#.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_draft_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("state"));
        assert_eq!(store.load_draft().unwrap(), None);

        let draft = snapshot();
        store.save_draft(&draft).unwrap();
        assert_eq!(store.load_draft().unwrap(), Some(draft));

        store.clear_draft().unwrap();
        assert_eq!(store.load_draft().unwrap(), None);
    }

    #[test]
    fn test_keys_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path());
        assert!(!store.privacy_notice_dismissed().unwrap());

        store.dismiss_privacy_notice().unwrap();
        store.save_draft(&snapshot()).unwrap();
        store.clear_draft().unwrap();
        assert!(store.privacy_notice_dismissed().unwrap());
    }

    #[test]
    fn test_corrupt_store_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path());
        fs::write(store.path(), "not json").unwrap();
        assert_eq!(store.load_draft().unwrap(), None);

        store.save_draft(&snapshot()).unwrap();
        assert!(store.load_draft().unwrap().is_some());
    }

    #[test]
    fn test_unreadable_snapshot_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path());
        store
            .set_item(DRAFT_KEY, serde_json::json!({"unexpected": true}))
            .unwrap();
        assert_eq!(store.load_draft().unwrap(), None);
    }
}
