use super::{io_error, LedgerStore, StoreResult};
use crate::ledger::LedgerDocument;
use std::{
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

/// Keeps the ledger as one pretty-printed JSON file. Saves go through a
/// sibling temp file and a rename so a crash never leaves half a document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

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
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> StoreResult<LedgerDocument> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            // First run: nothing persisted yet.
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(LedgerDocument::default()),
            Err(err) => Err(io_error(&self.path, err)),
        }
    }

    fn save(&self, document: &LedgerDocument) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp = self.temp_path();
        let mut file = File::create(&tmp).map_err(|e| io_error(&tmp, e))?;
        file.write_all(&bytes).map_err(|e| io_error(&tmp, e))?;
        file.sync_all().map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| io_error(&self.path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ActorRecord;
    use crate::store::StoreError;
    use crate::types::{ActorId, ResourceHandle, ResourceKind, Timestamp};
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_as_empty_ledger() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("VehicleSpawner.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_restores_every_actor() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("data").join("VehicleSpawner.json"));

        let mut doc = LedgerDocument::default();
        for actor in 1..=3u64 {
            let mut record = ActorRecord::new(6);
            for n in 0..4u64 {
                let kind = if n % 2 == 0 {
                    ResourceKind::Car
                } else {
                    ResourceKind::Helicopter
                };
                record
                    .resource_handles
                    .push(ResourceHandle::new(actor * 100 + n, kind));
            }
            record
                .last_operation_time
                .insert(ResourceKind::Car, Timestamp::from_secs(1000.5 + actor as f64));
            doc.actors.insert(ActorId(actor), record);
        }

        store.save(&doc).unwrap();
        assert!(!store.temp_path().exists());
        assert_eq!(store.load().unwrap(), doc);
    }

    #[test]
    fn corrupt_file_is_reported_not_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("VehicleSpawner.json");
        fs::write(&path, b"{ not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
        assert_eq!(fs::read(&path).unwrap(), b"{ not json");
    }
}
