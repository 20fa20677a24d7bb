use core::fmt::Display;
use std::path::PathBuf;

/// Holds the context for the current backup. Used for prefixing logs.
#[derive(Default, Debug)]
pub struct Context {
    /// The document being backed up.
    pub document: Option<PathBuf>,
    /// The current context
    pub current_context: &'static str,
}

impl Context {
    /// Create a context for a document.
    pub fn for_document(document: impl Into<PathBuf>) -> Self {
        Self {
            document: Some(document.into()),
            current_context: "On Save",
        }
    }
}

impl Display for Context {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if let Some(document) = &self.document {
            write!(f, "[{}] ", document.display())?;
        }

        write!(f, "[{}] ", self.current_context)?;

        Ok(())
    }
}
