//! # notebook-backup
//! Save-triggered snapshots of notebooks, pruned by file count and total size.
//!
//! A host calls [`BackupEngine::on_save`] after every successful save. The
//! engine copies the document into a backup directory under a UTC timestamped
//! name, throttles rapid saves by overwriting the newest snapshot, then prunes
//! the oldest snapshots until the configured limits hold.
//!
//! Saves of the same document must not overlap. The host's save path
//! normally guarantees this, the engine also holds a per-document lock for the
//! duration of each call.
//!

mod clock;
mod config;
mod context;
mod document;
mod engine;
mod lock;
mod path;
mod retention;
mod snapshot;
mod storage;

pub use clock::{Clock, SystemClock};
pub use config::{Config, ConfigError, LoadConfigError, RawConfig};
pub use context::Context;
pub use document::{Document, DocumentKind};
pub use engine::{BackupEngine, BackupError, BackupOutcome};
pub use path::{
    PathError, expand_backup_dir, normalize, prepare_backup_directory, resolve_backup_directory,
};
pub use retention::{PruneReport, RetentionLimits, prune};
pub use snapshot::{
    NamingError, Snapshot, TIMESTAMP_FORMAT, list_snapshots, parse_snapshot_name, snapshot_name,
};
pub use storage::StorageError;
