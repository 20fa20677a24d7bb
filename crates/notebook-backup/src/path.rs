use std::{
    env, fs,
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use thiserror::Error;

use crate::StorageError;

/// Expand `~` and `$VAR` or `${VAR}` in a configured backup directory.
///
/// Unknown variables are left as written.
pub fn expand_backup_dir(backup_dir: &str) -> Result<PathBuf, PathError> {
    let expanded = expand_variables(backup_dir, |name| env::var(name).ok());

    if expanded == "~" {
        return home_directory();
    }

    if let Some(rest) = expanded.strip_prefix("~/") {
        return Ok(home_directory()?.join(rest));
    }

    Ok(PathBuf::from(expanded))
}

fn home_directory() -> Result<PathBuf, PathError> {
    dirs::home_dir()
        .filter(|home| !home.as_os_str().is_empty())
        .ok_or(PathError::NoHome)
}

/// Replace `$NAME` and `${NAME}` with `lookup(NAME)`, leaving misses as written.
fn expand_variables<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(index) = rest.find('$') {
        output.push_str(&rest[..index]);
        let after = &rest[index + 1..];

        // (name, what follows it, the text as written)
        let (name, remainder, written) = match after.strip_prefix('{') {
            Some(braced) => match braced.find('}') {
                Some(end) => (&braced[..end], &braced[end + 1..], &rest[index..index + end + 3]),
                None => ("", after, "$"),
            },
            None => {
                let end = after
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(after.len());
                (&after[..end], &after[end..], &rest[index..index + end + 1])
            }
        };

        let value = if name.is_empty() {
            None
        } else {
            lookup(name)
        };

        match value {
            Some(value) => output.push_str(&value),
            None => output.push_str(written),
        }

        rest = remainder;
    }

    output.push_str(rest);
    output
}

/// Lexically resolve `.` and `..` segments.
///
/// `..` never climbs above the root of an absolute path.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component),
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                Some(Component::ParentDir | Component::CurDir) | None => {
                    normalized.push(component)
                }
            },
            Component::Normal(segment) => normalized.push(segment),
        }
    }

    normalized
}

/// The directory snapshots of `document` are stored in.
///
/// * A relative `backup_dir` is placed next to the document.
/// * An absolute `backup_dir` mirrors the document's directory relative to `root`.
pub fn resolve_backup_directory(
    document: &Path,
    root: &Path,
    backup_dir: &Path,
) -> Result<PathBuf, PathError> {
    if !document.is_absolute() {
        return Err(PathError::NotAbsolute(document.to_path_buf()));
    }

    let document = normalize(document);
    if document.file_name().is_none() {
        return Err(PathError::NoFileName(document));
    }
    let parent = document
        .parent()
        .ok_or_else(|| PathError::NoFileName(document.clone()))?;

    if !backup_dir.is_absolute() {
        return Ok(normalize(&parent.join(backup_dir)));
    }

    let root = normalize(root);
    let relative = parent
        .strip_prefix(&root)
        .map_err(|_| PathError::OutsideRoot {
            document: document.clone(),
            root: root.clone(),
        })?;

    Ok(normalize(&backup_dir.join(relative)))
}

/// Ensure the backup directory exists, creating it and its parents if needed.
pub fn prepare_backup_directory(directory: &Path) -> Result<(), StorageError> {
    // Check if the backup dir exists
    let directory_metadata = match fs::metadata(directory) {
        Ok(metadata) => Some(metadata),
        Err(error) => {
            if error.kind() == ErrorKind::NotFound {
                None
            } else {
                return Err(StorageError::Metadata(directory.to_path_buf(), error));
            }
        }
    };

    match directory_metadata {
        // If the backup dir exists, ensure it is a directory
        Some(metadata) => {
            if !metadata.is_dir() {
                return Err(StorageError::NotDirectory(directory.to_path_buf()));
            }
        }

        // If it does not exist, create it.
        None => {
            fs::create_dir_all(directory)
                .map_err(|e| StorageError::CreateDirectory(directory.to_path_buf(), e))?;
        }
    }

    Ok(())
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum PathError {
    #[error("Document path {0:?} is not absolute")]
    NotAbsolute(PathBuf),

    #[error("Document path {0:?} has no file name")]
    NoFileName(PathBuf),

    #[error("Document {document:?} is not inside the document root {root:?}")]
    OutsideRoot { document: PathBuf, root: PathBuf },

    #[error("Could not expand '~', no home directory")]
    NoHome,
}
