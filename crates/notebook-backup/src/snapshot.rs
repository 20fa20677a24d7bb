use std::{
    ffi::{OsStr, OsString},
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{Context, StorageError};

/// The timestamp prefix of a snapshot name, always in UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// `YYYY-MM-DD_HH-MM-SS`
const TIMESTAMP_LENGTH: usize = 19;

/// A retained copy of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// The path to the snapshot file.
    pub path: PathBuf,

    /// When the snapshot was first created, to the second.
    pub created: DateTime<Utc>,

    /// The snapshot's size in bytes.
    pub size_bytes: u64,
}

impl Snapshot {
    /// The snapshot's file name.
    pub fn file_name(&self) -> &OsStr {
        self.path.file_name().unwrap_or_default()
    }

    /// Read the snapshot back, to restore it.
    pub fn read(&self) -> Result<Vec<u8>, StorageError> {
        fs::read(&self.path).map_err(|e| StorageError::Read(self.path.clone(), e))
    }
}

/// The name of a snapshot of `file_name` taken at `timestamp`.
///
/// The file name is kept byte for byte, it does not need to be unicode.
pub fn snapshot_name(file_name: impl AsRef<OsStr>, timestamp: DateTime<Utc>) -> OsString {
    let file_name = file_name.as_ref();

    let mut name = OsString::with_capacity(TIMESTAMP_LENGTH + 1 + file_name.len());
    name.push(timestamp.format(TIMESTAMP_FORMAT).to_string());
    name.push("_");
    name.push(file_name);
    name
}

/// Parse the creation time out of a snapshot name for `file_name`.
pub fn parse_snapshot_name(
    name: impl AsRef<OsStr>,
    file_name: impl AsRef<OsStr>,
) -> Result<DateTime<Utc>, NamingError> {
    let prefix = name
        .as_ref()
        .as_encoded_bytes()
        .strip_suffix(file_name.as_ref().as_encoded_bytes())
        .and_then(|prefix| prefix.strip_suffix(b"_"))
        .ok_or(NamingError::OtherDocument)?;

    // chrono accepts unpadded fields, the name must be fixed width to sort.
    let is_fixed_width = prefix.len() == TIMESTAMP_LENGTH
        && prefix.iter().enumerate().all(|(index, byte)| match index {
            4 | 7 | 13 | 16 => *byte == b'-',
            10 => *byte == b'_',
            _ => byte.is_ascii_digit(),
        });
    let prefix = match core::str::from_utf8(prefix) {
        Ok(prefix) if is_fixed_width => prefix,
        _ => return Err(NamingError::Timestamp(String::from_utf8_lossy(prefix).into_owned())),
    };

    let timestamp = NaiveDateTime::parse_from_str(prefix, TIMESTAMP_FORMAT)
        .map_err(|_| NamingError::Timestamp(prefix.to_string()))?;

    Ok(timestamp.and_utc())
}

/// List the snapshots of `file_name` in `directory`, oldest first.
///
/// Entries that are not snapshots of this document are skipped. A missing
/// directory has no snapshots.
pub fn list_snapshots(
    context: &Context,
    directory: &Path,
    file_name: impl AsRef<OsStr>,
) -> Result<Vec<Snapshot>, StorageError> {
    let file_name = file_name.as_ref();

    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(error) => {
            if error.kind() == ErrorKind::NotFound {
                return Ok(Vec::new());
            }
            return Err(StorageError::ReadDirectory(directory.to_path_buf(), error));
        }
    };

    let mut snapshots: Vec<Snapshot> = entries
        .filter_map(|entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    warn!("{context}Could not read entry: {error}");
                    return None;
                }
            };
            let path = entry.path();

            let created = match parse_snapshot_name(entry.file_name(), file_name) {
                Ok(created) => created,
                Err(NamingError::OtherDocument) => return None,
                Err(error) => {
                    debug!("{context}Skipping {path:?}: {error}");
                    return None;
                }
            };

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(error) => {
                    warn!("{context}Could not get entry '{path:?}' metadata: {error}");
                    return None;
                }
            };

            if !metadata.is_file() {
                return None;
            }

            Some(Snapshot {
                path,
                created,
                size_bytes: metadata.len(),
            })
        })
        .collect();

    // The fixed width prefix makes name order creation order.
    snapshots.sort_by(|a, b| a.file_name().cmp(b.file_name()));

    Ok(snapshots)
}

#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamingError {
    #[error("Name does not end with the document's file name")]
    OtherDocument,

    #[error("Invalid timestamp prefix '{0}'")]
    Timestamp(String),
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};

    use super::{NamingError, parse_snapshot_name, snapshot_name};

    #[test]
    fn name_is_fixed_width() {
        let timestamp = Utc.with_ymd_and_hms(2026, 2, 6, 14, 30, 15).unwrap();
        assert_eq!(
            snapshot_name("a.ipynb", timestamp),
            "2026-02-06_14-30-15_a.ipynb"
        );

        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 3, 4, 5).unwrap();
        assert_eq!(
            snapshot_name("a.ipynb", timestamp),
            "2024-01-01_03-04-05_a.ipynb"
        );
    }

    #[test]
    fn parse_name() {
        let timestamp = Utc.with_ymd_and_hms(2026, 2, 6, 14, 30, 15).unwrap();
        assert_eq!(
            parse_snapshot_name("2026-02-06_14-30-15_a.ipynb", "a.ipynb"),
            Ok(timestamp)
        );

        // Document names may themselves look like snapshot names.
        assert_eq!(
            parse_snapshot_name(
                "2026-02-06_14-30-15_2020-01-01_00-00-00_a.ipynb",
                "2020-01-01_00-00-00_a.ipynb"
            ),
            Ok(timestamp)
        );
    }

    #[test]
    fn reject_other_names() {
        assert_eq!(
            parse_snapshot_name("2026-02-06_14-30-15_b.ipynb", "a.ipynb"),
            Err(NamingError::OtherDocument)
        );
        assert_eq!(
            parse_snapshot_name("2026-02-06_14-30-15a.ipynb", "a.ipynb"),
            Err(NamingError::OtherDocument)
        );
        assert!(matches!(
            parse_snapshot_name("x_2026-02-06_14-30-15_a.ipynb", "a.ipynb"),
            Err(NamingError::Timestamp(_))
        ));
        assert!(matches!(
            parse_snapshot_name("2026-2-06_14-30-15_a.ipynb", "a.ipynb"),
            Err(NamingError::Timestamp(_))
        ));
        assert!(matches!(
            parse_snapshot_name("2026-13-06_14-30-15_a.ipynb", "a.ipynb"),
            Err(NamingError::Timestamp(_))
        ));
        assert!(matches!(
            parse_snapshot_name(".2026-02-06_14-30-15_a.ipynb.tmp", "a.ipynb"),
            Err(NamingError::OtherDocument)
        ));
    }

    #[test]
    fn name_order_is_time_order() {
        let earlier = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert!(snapshot_name("a.ipynb", earlier) < snapshot_name("a.ipynb", later));
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_file_names() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let file_name = OsStr::from_bytes(b"caf\xe9.ipynb");
        let timestamp = Utc.with_ymd_and_hms(2026, 2, 6, 14, 30, 15).unwrap();

        let name = snapshot_name(file_name, timestamp);
        assert_eq!(name.as_bytes(), b"2026-02-06_14-30-15_caf\xe9.ipynb");
        assert_eq!(parse_snapshot_name(&name, file_name), Ok(timestamp));

        assert_eq!(
            parse_snapshot_name(&name, "caf.ipynb"),
            Err(NamingError::OtherDocument)
        );
        assert!(matches!(
            parse_snapshot_name(OsStr::from_bytes(b"2026-02-06_14-30-\xff_a.ipynb"), "a.ipynb"),
            Err(NamingError::Timestamp(_))
        ));
    }
}
