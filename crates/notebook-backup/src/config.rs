use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{PathError, RetentionLimits, expand_backup_dir, resolve_backup_directory};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// The backup config. Loaded once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConfig")]
pub struct Config {
    /// Where snapshots are stored.
    /// A relative path is resolved next to each document, an absolute path
    /// mirrors the document's location below the document root.
    pub backup_dir: String,

    /// The maximum number of snapshots to keep per document. `0` disables backups.
    pub max_backup_files: u64,

    /// The maximum total size of one document's snapshots in MiB. `0` is unlimited.
    pub max_backup_size_mb: u64,

    /// Saves closer together than this overwrite the newest snapshot.
    pub min_seconds_between_backups: u64,
}

impl Config {
    /// Tries to load a config from a toml file.
    pub fn load_toml(file_path: PathBuf) -> Result<Self, LoadConfigError> {
        if !file_path.exists() {
            return Err(LoadConfigError::NoFile);
        }

        let contents = fs::read_to_string(file_path).map_err(LoadConfigError::Read)?;
        let raw: RawConfig = toml::from_str(&contents)?;
        let config = Self::try_from(raw)?;

        Ok(config)
    }

    /// If backups are written at all.
    pub fn is_enabled(&self) -> bool {
        self.max_backup_files > 0
    }

    /// The limits applied when pruning.
    pub fn retention_limits(&self) -> RetentionLimits {
        RetentionLimits {
            max_count: self.max_backup_files,
            max_total_bytes: self.max_backup_size_mb.saturating_mul(BYTES_PER_MB),
        }
    }

    /// The directory snapshots of `document` are stored in.
    pub fn backup_directory(&self, document: &Path, root: &Path) -> Result<PathBuf, PathError> {
        let backup_dir = expand_backup_dir(&self.backup_dir)?;
        resolve_backup_directory(document, root, &backup_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backup_dir: ".backup".to_string(),
            max_backup_files: 10,
            max_backup_size_mb: 100,
            min_seconds_between_backups: 20,
        }
    }
}

/// The config as written by the operator, before validation.
#[allow(missing_docs)]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub backup_dir: String,
    pub max_backup_files: i64,
    pub max_backup_size_mb: i64,
    pub min_seconds_between_backups: i64,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            backup_dir: ".backup".to_string(),
            max_backup_files: 10,
            max_backup_size_mb: 100,
            min_seconds_between_backups: 20,
        }
    }
}

impl TryFrom<RawConfig> for Config {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        if raw.backup_dir.trim().is_empty() {
            return Err(ConfigError::EmptyBackupDir);
        }

        let non_negative = |field: &'static str, value: i64| {
            u64::try_from(value).map_err(|_| ConfigError::Negative(field, value))
        };

        let max_backup_size_mb = non_negative("max_backup_size_mb", raw.max_backup_size_mb)?;
        if max_backup_size_mb.checked_mul(BYTES_PER_MB).is_none() {
            return Err(ConfigError::SizeOverflow(max_backup_size_mb));
        }

        Ok(Self {
            backup_dir: raw.backup_dir,
            max_backup_files: non_negative("max_backup_files", raw.max_backup_files)?,
            max_backup_size_mb,
            min_seconds_between_backups: non_negative(
                "min_seconds_between_backups",
                raw.min_seconds_between_backups,
            )?,
        })
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("The file does not exist.")]
    NoFile,

    #[error("Failed to read the file:\n{0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to deserialize the file:\n{0}")]
    Deserialize(#[from] toml::de::Error),

    #[error("Invalid config:\n{0}")]
    Invalid(#[from] ConfigError),
}

#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("backup_dir must not be empty")]
    EmptyBackupDir,

    /// `field, value`
    #[error("{0} must not be negative, got {1}")]
    Negative(&'static str, i64),

    #[error("max_backup_size_mb {0} is too large to express in bytes")]
    SizeOverflow(u64),
}
