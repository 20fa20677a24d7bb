//! # Shared
//! Logging and failure helpers shared between the workspace crates.
//!

#![warn(missing_docs)]

mod failure;
mod logger;
#[cfg(feature = "test")]
pub mod test;

pub use failure::{Failure, failure_message, log_and_panic};
pub use logger::{LoggerError, init_logger};
