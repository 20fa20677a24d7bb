use std::{ffi::OsStr, path::Path};

use serde::{Deserialize, Serialize};

use crate::PathError;

/// What the host reports having saved.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum DocumentKind {
    /// A notebook, the only kind that is backed up.
    Notebook,

    /// Any other file.
    File,

    /// A directory.
    Directory,
}

impl DocumentKind {
    /// Guess the kind of a document from its path.
    pub fn from_path(path: &Path) -> Self {
        if path.is_dir() {
            Self::Directory
        } else if path.extension().is_some_and(|extension| extension == "ipynb") {
            Self::Notebook
        } else {
            Self::File
        }
    }
}

/// A saved document, as handed to the engine by the host's post-save hook.
#[derive(Clone, Copy, Debug)]
pub struct Document<'a> {
    /// Absolute path to the document.
    pub path: &'a Path,

    /// The directory the host serves documents from.
    pub root: &'a Path,

    /// The kind of document.
    pub kind: DocumentKind,

    /// The saved content. If `None` the document is copied from `path`.
    pub content: Option<&'a [u8]>,
}

impl<'a> Document<'a> {
    /// A document whose content is read back from disk.
    pub fn new(path: &'a Path, root: &'a Path, kind: DocumentKind) -> Self {
        Self {
            path,
            root,
            kind,
            content: None,
        }
    }

    /// A notebook whose content is read back from disk.
    pub fn notebook(path: &'a Path, root: &'a Path) -> Self {
        Self::new(path, root, DocumentKind::Notebook)
    }

    /// Use the given bytes as the saved content instead of re-reading the file.
    pub fn with_content(self, content: &'a [u8]) -> Self {
        Self {
            content: Some(content),
            ..self
        }
    }

    /// The document's file name, used as the suffix of its snapshot names.
    pub fn file_name(&self) -> Result<&'a OsStr, PathError> {
        self.path
            .file_name()
            .ok_or_else(|| PathError::NoFileName(self.path.to_path_buf()))
    }
}
