use std::{fs, io::ErrorKind, path::PathBuf};

use tracing::{info, warn};

use crate::{Context, Snapshot};

/// The limits a document's snapshots are pruned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionLimits {
    /// The maximum number of snapshots. `0` does not limit the count.
    pub max_count: u64,

    /// The maximum total size of the snapshots in bytes. `0` is unlimited.
    pub max_total_bytes: u64,
}

impl RetentionLimits {
    /// The snapshots to delete, always the oldest.
    ///
    /// `snapshots` must be ordered oldest first. Size pruning continues past
    /// the count limit and may select every snapshot.
    pub fn select_for_deletion<'a>(&self, snapshots: &'a [Snapshot]) -> &'a [Snapshot] {
        let count = snapshots.len();
        let max_count = usize::try_from(self.max_count).unwrap_or(usize::MAX);

        let mut marked = if max_count > 0 && count > max_count {
            count - max_count
        } else {
            0
        };

        if self.max_total_bytes > 0 {
            let mut total_bytes = snapshots[marked..]
                .iter()
                .fold(0u64, |total, snapshot| total.saturating_add(snapshot.size_bytes));

            while total_bytes > self.max_total_bytes {
                let Some(oldest) = snapshots.get(marked) else {
                    break;
                };
                total_bytes = total_bytes.saturating_sub(oldest.size_bytes);
                marked += 1;
            }
        }

        &snapshots[..marked]
    }
}

/// The result of pruning a document's snapshots.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PruneReport {
    /// Snapshots that were removed.
    pub deleted: Vec<PathBuf>,

    /// Snapshots that should have been removed but could not be.
    pub failed: Vec<PathBuf>,
}

/// Delete the snapshots over the limits.
///
/// A snapshot that cannot be removed is logged and skipped, the rest are still pruned.
pub fn prune(
    context: &mut Context,
    limits: &RetentionLimits,
    snapshots: &[Snapshot],
) -> PruneReport {
    context.current_context = "Prune";

    let mut report = PruneReport::default();

    for snapshot in limits.select_for_deletion(snapshots) {
        match fs::remove_file(&snapshot.path) {
            Ok(()) => {
                info!("{context}Deleted old backup {:?}", snapshot.path);
                report.deleted.push(snapshot.path.clone());
            }

            // Already gone, the limit holds either way.
            Err(error) if error.kind() == ErrorKind::NotFound => {
                report.deleted.push(snapshot.path.clone());
            }

            Err(error) => {
                warn!("{context}Could not remove old backup {:?}: {error}", snapshot.path);
                report.failed.push(snapshot.path.clone());
            }
        }
    }

    report
}
