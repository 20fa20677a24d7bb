use std::{
    ffi::OsString,
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::warn;

use crate::{Context, Document};

/// Write the document's content to `target`.
///
/// The content is written to a hidden file next to `target` and renamed over
/// it, so a snapshot is either the old or the new content, never partial.
pub fn write_snapshot(
    context: &Context,
    document: &Document<'_>,
    target: &Path,
) -> Result<(), StorageError> {
    let temporary = temporary_path(target);

    let written = match document.content {
        Some(content) => {
            fs::write(&temporary, content).map_err(|e| StorageError::Write(temporary.clone(), e))
        }
        None => copy_with_modified(context, document.path, &temporary),
    };

    if let Err(error) = written.and_then(|()| {
        fs::rename(&temporary, target).map_err(|e| StorageError::Persist(target.to_path_buf(), e))
    }) {
        if let Err(remove_error) = fs::remove_file(&temporary) {
            if remove_error.kind() != io::ErrorKind::NotFound {
                warn!("{context}Could not remove temporary file {temporary:?}: {remove_error}");
            }
        }
        return Err(error);
    }

    Ok(())
}

/// Copy `source` to `destination`, carrying over the modification time.
fn copy_with_modified(
    context: &Context,
    source: &Path,
    destination: &Path,
) -> Result<(), StorageError> {
    fs::copy(source, destination)
        .map_err(|e| StorageError::Copy(source.to_path_buf(), destination.to_path_buf(), e))?;

    // The snapshot is still valid without the document's timestamp.
    let modified = fs::metadata(source).and_then(|metadata| metadata.modified());
    let applied = modified.and_then(|modified| {
        File::options()
            .write(true)
            .open(destination)?
            .set_modified(modified)
    });
    if let Err(error) = applied {
        warn!("{context}Could not preserve modification time of {source:?}: {error}");
    }

    Ok(())
}

fn temporary_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(target.file_name().unwrap_or_default());
    name.push(".tmp");

    target.with_file_name(name)
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create directory {0:?}: {1}")]
    CreateDirectory(PathBuf, #[source] io::Error),

    #[error("{0:?} exists but is not a directory")]
    NotDirectory(PathBuf),

    #[error("Failed to get metadata for {0:?}: {1}")]
    Metadata(PathBuf, #[source] io::Error),

    #[error("Failed to read directory {0:?}: {1}")]
    ReadDirectory(PathBuf, #[source] io::Error),

    #[error("Failed to write {0:?}: {1}")]
    Write(PathBuf, #[source] io::Error),

    #[error("Failed to copy {0:?} to {1:?}: {2}")]
    Copy(PathBuf, PathBuf, #[source] io::Error),

    #[error("Failed to move snapshot into place at {0:?}: {1}")]
    Persist(PathBuf, #[source] io::Error),

    #[error("Failed to read snapshot {0:?}: {1}")]
    Read(PathBuf, #[source] io::Error),
}

#[cfg(test)]
mod test {
    use std::{fs, path::Path, time::SystemTime};

    use crate::{Context, Document};

    use super::{temporary_path, write_snapshot};

    #[test]
    fn temporary_is_hidden_sibling() {
        assert_eq!(
            temporary_path(Path::new("/b/2026-02-06_14-30-15_a.ipynb")),
            Path::new("/b/.2026-02-06_14-30-15_a.ipynb.tmp")
        );
    }

    #[cfg(unix)]
    #[test]
    fn temporary_keeps_non_unicode_bytes() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let first = temporary_path(Path::new(OsStr::from_bytes(b"/b/caf\xe9.ipynb")));
        let second = temporary_path(Path::new(OsStr::from_bytes(b"/b/caf\xff.ipynb")));

        assert_eq!(first.as_os_str().as_bytes(), b"/b/.caf\xe9.ipynb.tmp");
        assert_ne!(first, second);
    }

    #[test]
    fn write_replaces_content() {
        let directory = tempfile::tempdir().unwrap();
        let document = directory.path().join("a.ipynb");
        let target = directory.path().join("snapshot");
        let context = Context::default();

        let first = Document::notebook(&document, directory.path()).with_content(b"first");
        write_snapshot(&context, &first, &target).unwrap();
        let second = Document::notebook(&document, directory.path()).with_content(b"second");
        write_snapshot(&context, &second, &target).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"second");
        assert!(!temporary_path(&target).exists());
    }

    #[test]
    fn copy_keeps_modified_time() {
        let directory = tempfile::tempdir().unwrap();
        let document = directory.path().join("a.ipynb");
        fs::write(&document, "{}").unwrap();

        let modified = SystemTime::UNIX_EPOCH + core::time::Duration::from_secs(1_700_000_000);
        fs::File::options()
            .write(true)
            .open(&document)
            .unwrap()
            .set_modified(modified)
            .unwrap();

        let target = directory.path().join("snapshot");
        let context = Context::default();
        write_snapshot(
            &context,
            &Document::notebook(&document, directory.path()),
            &target,
        )
        .unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"{}");
        assert_eq!(fs::metadata(&target).unwrap().modified().unwrap(), modified);
    }

    #[test]
    fn missing_source_leaves_nothing_behind() {
        let directory = tempfile::tempdir().unwrap();
        let document = directory.path().join("missing.ipynb");
        let target = directory.path().join("snapshot");
        let context = Context::default();

        let result = write_snapshot(
            &context,
            &Document::notebook(&document, directory.path()),
            &target,
        );

        assert!(result.is_err());
        assert!(!target.exists());
        assert!(!temporary_path(&target).exists());
    }
}
