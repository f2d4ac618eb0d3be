//! CLI error types.

use std::{fmt, io};

use postboard_app::{RuntimeError, StoreError, TransportError};
use postboard_client::ClassifiedError;
use thiserror::Error;

/// Errors that end a command.
///
/// `Debug` prints the same text as `Display`: `main` returns this error and
/// the process reports it through `Debug`.
#[derive(Error)]
pub enum CliError {
    /// The client rejected or failed the operation. Carries display text.
    #[error("{0}")]
    Failed(ClassifiedError),

    /// An error dialog was shown.
    #[error("{0}")]
    Dialog(String),

    /// Token storage or another runtime concern failed.
    #[error(transparent)]
    Runtime(RuntimeError),

    /// The HTTP client could not be built.
    #[error("http client: {0}")]
    Transport(#[from] TransportError),

    /// Terminal I/O failed.
    #[error("terminal: {0}")]
    Io(#[from] io::Error),

    /// Input ended while waiting for an answer.
    #[error("input closed before an answer was given")]
    InputClosed,
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<RuntimeError> for CliError {
    fn from(error: RuntimeError) -> Self {
        match error {
            RuntimeError::Client(e) => Self::Failed(e.classified()),
            other => Self::Runtime(other),
        }
    }
}

impl From<StoreError> for CliError {
    fn from(error: StoreError) -> Self {
        Self::Runtime(RuntimeError::Store(error))
    }
}
