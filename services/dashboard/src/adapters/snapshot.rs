//! services/dashboard/src/adapters/snapshot.rs
//!
//! A `SnapshotStore` backed by a single JSON file.

use dashboard_core::{
    persist::Snapshot,
    ports::{PortError, PortResult, SnapshotStore},
};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> PortError {
    PortError::Unexpected(format!("Failed to {} {}: {}", action, path.display(), e))
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn load(&self) -> PortResult<Option<Snapshot>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No snapshot at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(io_error("open", &self.path, e)),
        };

        serde_json::from_reader(BufReader::new(file))
            .map(Some)
            .map_err(|e| PortError::InvalidData(format!("Unreadable snapshot: {}", e)))
    }

    fn save(&self, snapshot: &Snapshot) -> PortResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error("create", parent, e))?;
        }

        // Write to a sibling file first so a crash never leaves a torn snapshot.
        let tmp_path = self.path.with_extension("tmp");
        {
            let file = File::create(&tmp_path).map_err(|e| io_error("create", &tmp_path, e))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, snapshot)
                .map_err(|e| PortError::Unexpected(format!("Failed to encode snapshot: {}", e)))?;
            writer
                .flush()
                .map_err(|e| io_error("write", &tmp_path, e))?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| io_error("replace", &self.path, e))?;
        debug!("Saved snapshot to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn snapshot() -> Snapshot {
        let mut values = Map::new();
        values.insert("layout".to_string(), json!({"is_extra_column": false}));
        Snapshot { version: 1, values }
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path().join("nested/state.json"));

        store.save(&snapshot()).unwrap();
        assert_eq!(store.load().unwrap(), Some(snapshot()));
        assert!(!dir.path().join("nested/state.tmp").exists());
    }

    #[test]
    fn test_save_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path().join("state.json"));
        store.save(&snapshot()).unwrap();

        let mut newer = snapshot();
        newer.values.insert("player".to_string(), json!({"volume": 0.2}));
        store.save(&newer).unwrap();
        assert_eq!(store.load().unwrap(), Some(newer));
    }

    #[test]
    fn test_garbage_file_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileSnapshotStore::new(path);
        assert!(matches!(store.load(), Err(PortError::InvalidData(_))));
    }
}
