use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Utc;

use crate::{
    errors::{DuebookError, Result},
    ledger::Business,
    utils::{
        ensure_dir,
        persistence::{backup_file_name, list_backup_names, read_json, write_json_atomic},
        PathResolver,
    },
};

use super::BusinessStore;

const DEFAULT_RETENTION: usize = 5;
const BACKUP_STEM: &str = "businesses";

/// All businesses in one `businesses.json`, with the previous file copied to a
/// timestamped backup before every overwrite.
#[derive(Clone)]
pub struct JsonStorage {
    root: PathBuf,
    data_file: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let app_root = PathResolver::resolve_base(root);
        ensure_dir(&app_root)?;
        let backups_dir = PathResolver::backup_dir_in(&app_root);
        ensure_dir(&backups_dir)?;
        Ok(Self {
            data_file: PathResolver::businesses_file_in(&app_root),
            root: app_root,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None, None)
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// Snapshots the current data file under an optional note; returns the backup name.
    pub fn backup(&self, note: Option<&str>) -> Result<Option<String>> {
        if !self.data_file.exists() {
            return Ok(None);
        }
        let name = backup_file_name(BACKUP_STEM, Utc::now(), note);
        fs::copy(&self.data_file, self.backups_dir.join(&name))?;
        self.prune_backups()?;
        tracing::debug!(backup = %name, "wrote backup");
        Ok(Some(name))
    }

    pub fn list_backups(&self) -> Result<Vec<String>> {
        list_backup_names(&self.backups_dir)
    }

    /// Replaces the data file with a backup and returns its businesses.
    pub fn restore(&self, backup_name: &str) -> Result<Vec<Business>> {
        let backup_path = self.backups_dir.join(backup_name);
        if !backup_path.exists() {
            return Err(DuebookError::StorageError(format!(
                "backup `{}` not found",
                backup_name
            )));
        }
        let restored: Vec<Business> = read_json(&backup_path)?;
        self.backup(Some("before restore"))?;
        write_json_atomic(&self.data_file, &restored)?;
        tracing::info!(backup = %backup_name, count = restored.len(), "restored backup");
        Ok(restored)
    }

    fn prune_backups(&self) -> Result<()> {
        let backups = self.list_backups()?;
        for stale in backups.iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(self.backups_dir.join(stale)) {
                tracing::warn!(backup = %stale, error = %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

impl BusinessStore for JsonStorage {
    fn load_all(&self) -> Result<Vec<Business>> {
        if !self.data_file.exists() {
            return Ok(Vec::new());
        }
        read_json(&self.data_file)
    }

    fn save_all(&self, businesses: &[Business]) -> Result<()> {
        self.backup(None)?;
        write_json_atomic(&self.data_file, businesses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::BusinessKind;
    use tempfile::TempDir;

    fn storage_with_temp_dir(retention: usize) -> (JsonStorage, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let storage = JsonStorage::new(Some(temp.path().to_path_buf()), Some(retention))
            .expect("json storage");
        (storage, temp)
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (storage, _guard) = storage_with_temp_dir(3);
        assert!(storage.load_all().unwrap().is_empty());
        let shop = Business::new(BusinessKind::Shop, "Store", None);
        storage.upsert(&shop).expect("save business");
        let loaded = storage.load_all().expect("load businesses");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Store");
        assert_eq!(loaded[0].customer_groups[0].id, "general");
    }

    #[test]
    fn overwrites_keep_a_backup_and_delete_reports_missing() {
        let (storage, _guard) = storage_with_temp_dir(3);
        let mut shop = Business::new(BusinessKind::Shop, "Store", None);
        storage.upsert(&shop).unwrap();
        shop.name = "Renamed".into();
        storage.upsert(&shop).unwrap();

        let backups = storage.list_backups().unwrap();
        assert_eq!(backups.len(), 1);
        let restored = storage.restore(&backups[0]).unwrap();
        assert_eq!(restored[0].name, "Store");

        assert!(storage.delete(shop.id).unwrap());
        assert!(!storage.delete(shop.id).unwrap());
        assert!(storage.restore("missing.json").is_err());
    }

    #[test]
    fn labelled_backups_are_pruned_to_retention() {
        let (storage, _guard) = storage_with_temp_dir(2);
        storage
            .save_all(&[Business::new(BusinessKind::Shop, "Store", None)])
            .unwrap();
        for note in ["one", "two", "three"] {
            storage.backup(Some(note)).unwrap();
        }
        assert_eq!(storage.list_backups().unwrap().len(), 2);
    }
}
