use std::{
    path::PathBuf,
    sync::{Arc, PoisonError, RwLock},
};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    Clock, Config, Context, Document, DocumentKind, PathError, PruneReport, Snapshot,
    StorageError, SystemClock, list_snapshots, lock::DocumentLocks, prepare_backup_directory,
    prune, snapshot_name, storage::write_snapshot,
};

/// What happened to a save. Advisory, a host may ignore it.
#[derive(Debug)]
pub enum BackupOutcome {
    /// Backups are disabled by config, nothing was touched.
    Disabled,

    /// The document is not a notebook.
    Skipped,

    /// A new snapshot was written.
    Created {
        /// The new snapshot.
        snapshot: PathBuf,
        /// What pruning removed afterwards.
        pruned: PruneReport,
    },

    /// The newest snapshot was replaced because the last one was too recent.
    Overwritten {
        /// The replaced snapshot.
        snapshot: PathBuf,
        /// What pruning removed afterwards.
        pruned: PruneReport,
    },

    /// The backup failed. The failure has been logged.
    Failed(BackupError),
}

/// Writes and prunes snapshots on every save.
pub struct BackupEngine<C: Clock = SystemClock> {
    config: RwLock<Arc<Config>>,
    clock: C,
    locks: DocumentLocks,
}

impl BackupEngine {
    /// Create an engine using the system clock.
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> BackupEngine<C> {
    /// Create an engine that names snapshots using `clock`.
    pub fn with_clock(config: Config, clock: C) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
            clock,
            locks: DocumentLocks::default(),
        }
    }

    /// The config used by the next save.
    pub fn config(&self) -> Arc<Config> {
        let config = self.config.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&config)
    }

    /// Replace the config. Saves already running keep the config they started with.
    pub fn reload_config(&self, config: Config) {
        let mut current = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(config);
    }

    /// Back up a document that has just been saved.
    ///
    /// Never fails the save. Errors are logged and returned as [`BackupOutcome::Failed`].
    pub fn on_save(&self, document: &Document<'_>) -> BackupOutcome {
        let config = self.config();
        let mut context = Context::for_document(document.path);

        if !config.is_enabled() {
            debug!("{context}Backups disabled");
            return BackupOutcome::Disabled;
        }

        if document.kind != DocumentKind::Notebook {
            debug!("{context}Not a notebook, skipping");
            return BackupOutcome::Skipped;
        }

        let lock = self.locks.get(document.path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        match self.backup(&mut context, &config, document) {
            Ok(outcome) => outcome,
            Err(error) => {
                error!("{context}Backup failed: {error}");
                BackupOutcome::Failed(error)
            }
        }
    }

    /// The retained snapshots of a document, oldest first.
    pub fn snapshots(&self, document: &Document<'_>) -> Result<Vec<Snapshot>, BackupError> {
        let config = self.config();
        let context = Context::for_document(document.path);

        let file_name = document.file_name()?;
        let backup_directory = config.backup_directory(document.path, document.root)?;

        Ok(list_snapshots(&context, &backup_directory, file_name)?)
    }

    fn backup(
        &self,
        context: &mut Context,
        config: &Config,
        document: &Document<'_>,
    ) -> Result<BackupOutcome, BackupError> {
        // Prepare backup directory
        let (file_name, backup_directory) = {
            context.current_context = "Prepare Backup";

            let file_name = document.file_name()?;
            let backup_directory = config.backup_directory(document.path, document.root)?;
            prepare_backup_directory(&backup_directory)?;

            (file_name, backup_directory)
        };

        // Choose between a new snapshot and overwriting the newest one
        let (target, overwrite) = {
            context.current_context = "List Snapshots";

            let existing = list_snapshots(context, &backup_directory, file_name)?;
            let now = self.clock.now();
            let candidate = snapshot_name(file_name, now);

            match existing.last() {
                Some(latest) if latest.file_name() == candidate.as_os_str() => {
                    (latest.path.clone(), true)
                }
                Some(latest) if is_throttled(context, config, latest.created, now) => {
                    (latest.path.clone(), true)
                }
                _ => (backup_directory.join(candidate), false),
            }
        };

        // Write snapshot
        {
            context.current_context = if overwrite {
                "Overwrite Snapshot"
            } else {
                "Write Snapshot"
            };

            write_snapshot(context, document, &target)?;

            if overwrite {
                info!("{context}Overwrote most recent backup {target:?}");
            } else {
                info!("{context}Backed up to {target:?}");
            }
        }

        // Prune against what is on disk now, not what was listed before writing.
        context.current_context = "Prune";
        let pruned = match list_snapshots(context, &backup_directory, file_name) {
            Ok(snapshots) => prune(context, &config.retention_limits(), &snapshots),
            Err(error) => {
                warn!("{context}Could not list snapshots for pruning: {error}");
                PruneReport::default()
            }
        };

        if overwrite {
            Ok(BackupOutcome::Overwritten {
                snapshot: target,
                pruned,
            })
        } else {
            Ok(BackupOutcome::Created {
                snapshot: target,
                pruned,
            })
        }
    }
}

/// If a save at `now` is too close to the snapshot created at `latest`.
fn is_throttled(
    context: &Context,
    config: &Config,
    latest: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    let elapsed = now.signed_duration_since(latest).num_seconds();

    match u64::try_from(elapsed) {
        Ok(elapsed) => elapsed < config.min_seconds_between_backups,
        Err(_) => {
            // A newer snapshot than now would sort after a new one, keep it current instead.
            warn!(
                "{context}Most recent backup is {}s in the future, system time may have changed",
                -elapsed
            );
            true
        }
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Failed to resolve backup directory:\n{0}")]
    Path(#[from] PathError),

    #[error("Storage error:\n{0}")]
    Storage(#[from] StorageError),
}
