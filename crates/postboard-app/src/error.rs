//! Error types for the I/O layer.

use std::{io, path::PathBuf};

use postboard_client::ClientError;
use thiserror::Error;

/// Failure of a single outward call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No response was received (connection refused, timeout, TLS...).
    #[error("{0}")]
    NoResponse(String),

    /// The call was aborted before it completed.
    #[error("request cancelled")]
    Cancelled,
}

/// Token storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No location could be determined for the token file.
    #[error("could not determine home directory")]
    NoHome,

    /// Reading or writing the token file failed.
    #[error("token file {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

/// Errors surfaced by [`crate::Runtime`].
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The client rejected the event.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The token slot could not be updated.
    #[error(transparent)]
    Store(#[from] StoreError),
}
