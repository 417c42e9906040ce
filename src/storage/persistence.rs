//! Ledger persistence layer
//!
//! Saves the whole ledger as JSON and reloads it, rejecting any snapshot
//! whose balances do not add up.

use crate::token::{TokenError, TokenLedger};
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Corrupt ledger: {0}")]
    Corrupt(#[from] TokenError),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub ledger_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".token_ledger"),
            ledger_file: "ledger.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Ledger storage manager
#[derive(Debug)]
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn ledger_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.ledger_file)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.ledger_file, index))
    }

    /// Write the ledger, keeping the previous file as backup 0
    pub fn save(&self, ledger: &TokenLedger) -> Result<(), StorageError> {
        let path = self.ledger_path();

        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Temp file + rename so a crash never leaves a half-written ledger
        let temp_path = self
            .config
            .data_dir
            .join(format!("{}.tmp", self.config.ledger_file));
        write_ledger(&temp_path, ledger)?;
        fs::rename(&temp_path, &path)?;

        log::debug!(
            "Saved ledger to {} (sequence {})",
            path.display(),
            ledger.sequence()
        );
        Ok(())
    }

    pub fn load(&self) -> Result<TokenLedger, StorageError> {
        let path = self.ledger_path();

        if !path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Ledger file not found: {}",
                path.display()
            )));
        }

        let ledger = read_ledger(&path)?;
        log::debug!(
            "Loaded ledger from {} (sequence {})",
            path.display(),
            ledger.sequence()
        );
        Ok(ledger)
    }

    pub fn exists(&self) -> bool {
        self.ledger_path().exists()
    }

    /// Remove the ledger file; backups are kept
    pub fn delete(&self) -> Result<(), StorageError> {
        let path = self.ledger_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn rotate_backups(&self) -> Result<(), StorageError> {
        let last = self.config.max_backups - 1;

        let oldest = self.backup_path(last);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        for i in (0..last).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                fs::rename(&current, self.backup_path(i + 1))?;
            }
        }

        Ok(())
    }

    /// Read a backup; 0 is the most recent
    pub fn restore_backup(&self, backup_index: usize) -> Result<TokenLedger, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }

        read_ledger(&backup_path)
    }

    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|&i| self.backup_path(i).exists())
            .collect()
    }

    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let path = self.ledger_path();

        let file_size = if path.exists() {
            fs::metadata(&path)?.len()
        } else {
            0
        };

        Ok(StorageStats {
            file_size,
            backup_count: self.list_backups().len(),
            data_dir: self.config.data_dir.clone(),
        })
    }
}

/// Storage statistics
#[derive(Debug)]
pub struct StorageStats {
    pub file_size: u64,
    pub backup_count: usize,
    pub data_dir: PathBuf,
}

fn read_ledger(path: &Path) -> Result<TokenLedger, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let ledger: TokenLedger = serde_json::from_reader(reader)?;
    ledger.verify_invariants()?;
    Ok(ledger)
}

/// Write pretty JSON and sync it; write errors surface here, not on drop
fn write_ledger(path: &Path, ledger: &TokenLedger) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, ledger)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

/// Export the ledger to an arbitrary path
pub fn save_to_file(ledger: &TokenLedger, path: &Path) -> Result<(), StorageError> {
    write_ledger(path, ledger)
}

/// Import a ledger from an arbitrary path, checking its invariants
pub fn load_from_file(path: &Path) -> Result<TokenLedger, StorageError> {
    read_ledger(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Address, GenesisConfig};

    fn owner() -> Address {
        Address::new([1; 20])
    }

    fn create_test_storage(dir: &Path, max_backups: usize) -> Storage {
        let config = StorageConfig {
            data_dir: dir.to_path_buf(),
            max_backups,
            ..Default::default()
        };
        Storage::new(config).unwrap()
    }

    #[test]
    fn test_save_load_ledger() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = create_test_storage(temp_dir.path(), 5);
        assert!(!storage.exists());
        assert!(storage.load().is_err());

        let mut ledger = TokenLedger::new(&GenesisConfig::default(), owner()).unwrap();
        ledger
            .transfer(&owner(), Address::new([2; 20]), 1_000)
            .unwrap();

        storage.save(&ledger).unwrap();
        assert!(storage.exists());

        let loaded = storage.load().unwrap();
        assert_eq!(loaded, ledger);
        assert_eq!(loaded.balance_of(&Address::new([2; 20])), 1_000);
        assert_eq!(loaded.history().count(), 1);

        storage.delete().unwrap();
        assert!(!storage.exists());
    }

    #[test]
    fn test_backup_rotation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = create_test_storage(temp_dir.path(), 3);
        let mut ledger = TokenLedger::new(&GenesisConfig::default(), owner()).unwrap();

        for _ in 0..5 {
            storage.save(&ledger).unwrap();
            ledger.burn(&owner(), 1).unwrap();
        }

        assert_eq!(storage.list_backups(), vec![0, 1, 2]);
        assert_eq!(storage.stats().unwrap().backup_count, 3);

        // Backup 0 is the save before the last one: 3 burns applied
        let restored = storage.restore_backup(0).unwrap();
        assert_eq!(restored.sequence(), 3);
        assert!(storage.restore_backup(3).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_write_is_reported() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = create_test_storage(temp_dir.path(), 5);
        let mut ledger = TokenLedger::new(&GenesisConfig::default(), owner()).unwrap();
        storage.save(&ledger).unwrap();

        // Every write to /dev/full fails with ENOSPC
        let temp_path = temp_dir.path().join("ledger.json.tmp");
        std::os::unix::fs::symlink("/dev/full", &temp_path).unwrap();

        ledger.burn(&owner(), 1).unwrap();
        assert!(storage.save(&ledger).is_err());

        // The previous ledger is still intact
        let loaded = storage.load().unwrap();
        assert_eq!(loaded.sequence(), 0);
        assert_eq!(loaded.total_supply(), ledger.total_supply() + 1);

        let export_path = temp_dir.path().join("export.json");
        std::os::unix::fs::symlink("/dev/full", &export_path).unwrap();
        assert!(save_to_file(&ledger, &export_path).is_err());
    }

    #[test]
    fn test_backups_disabled() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = create_test_storage(temp_dir.path(), 0);
        let ledger = TokenLedger::new(&GenesisConfig::default(), owner()).unwrap();

        storage.save(&ledger).unwrap();
        storage.save(&ledger).unwrap();
        assert!(storage.list_backups().is_empty());
    }

    #[test]
    fn test_load_rejects_inconsistent_ledger() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("export.json");
        let ledger = TokenLedger::new(&GenesisConfig::default(), owner()).unwrap();

        save_to_file(&ledger, &path).unwrap();
        assert_eq!(load_from_file(&path).unwrap(), ledger);

        let json = fs::read_to_string(&path).unwrap();
        let tampered = json.replacen(
            &format!("\"total_supply\": {}", ledger.total_supply()),
            "\"total_supply\": 1",
            1,
        );
        assert_ne!(json, tampered);
        fs::write(&path, tampered).unwrap();

        assert!(matches!(
            load_from_file(&path),
            Err(StorageError::Corrupt(TokenError::InvariantViolation(_)))
        ));
    }
}
