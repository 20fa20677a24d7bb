use core::{error::Error, fmt::Write};

use tracing::error;

/// `message`, the error, then each cause the error's own text does not already include.
pub fn failure_message(error: &dyn Error, message: &str) -> String {
    let mut output = format!("{message}: {error}");

    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !output.contains(&cause_text) {
            let _ = write!(output, "\n  caused by: {cause_text}");
        }
        source = cause.source();
    }

    output
}

/// Log an error with its causes then panic with the same message.
///
/// Panicking unwinds `main`, so the logger guards still flush.
pub fn log_and_panic(error: &dyn Error, message: &str) -> ! {
    let message = failure_message(error, message);
    error!("{message}");

    panic!("{message}");
}

/// Extension trait for results that cannot be recovered from at startup.
pub trait Failure<T> {
    /// The value, or log the error and its causes and panic.
    fn or_log_and_panic(self, message: &str) -> T;
}

impl<T, E: Error> Failure<T> for Result<T, E> {
    fn or_log_and_panic(self, message: &str) -> T {
        match self {
            Ok(value) => value,
            Err(error) => log_and_panic(&error, message),
        }
    }
}
