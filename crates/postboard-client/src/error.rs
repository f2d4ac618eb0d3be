//! Client error types.

use postboard_proto::ProtocolError;
use thiserror::Error;

use crate::classify::{ClassifiedError, ErrorKind};

/// Errors raised synchronously by the client state machine.
///
/// None of these involve an outward call: they are detected before a request
/// is queued. Failures of outward calls are reported as
/// [`ClassifiedError`]s through actions instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Local input check failed. Carries the user-facing text.
    #[error("{0}")]
    Validation(String),

    /// Token could not be decoded into claims.
    #[error("invalid token: {reason}")]
    InvalidToken {
        /// Why decoding failed
        reason: String,
    },

    /// Operation is only offered to admin sessions.
    #[error("admin session required")]
    AdminRequired,

    /// Target is the sentinel super-admin account.
    #[error("account '{username}' is protected")]
    ProtectedAccount {
        /// Username of the protected account
        username: String,
    },

    /// Referenced item is not in the local collection.
    #[error("{kind} {id} not found in local collection")]
    UnknownResource {
        /// Resource kind
        kind: &'static str,
        /// Requested identifier
        id: String,
    },

    /// The backend offers no such call for this resource.
    #[error("cannot {operation} a {kind}")]
    Unsupported {
        /// Resource kind
        kind: &'static str,
        /// Attempted operation
        operation: &'static str,
    },

    /// Dialog discipline violated.
    #[error(transparent)]
    Modal(#[from] ModalError),

    /// Payload encoding failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ClientError {
    /// Same error in the classified form used for display.
    pub fn classified(&self) -> ClassifiedError {
        match self {
            Self::Validation(message) => {
                ClassifiedError { kind: ErrorKind::Validation, message: message.clone() }
            },
            Self::AdminRequired => ClassifiedError {
                kind: ErrorKind::Forbidden,
                message: "You do not have permission to view this page.".to_string(),
            },
            Self::ProtectedAccount { username } => ClassifiedError {
                kind: ErrorKind::Forbidden,
                message: format!("Cannot delete the default '{username}' account."),
            },
            other => ClassifiedError { kind: ErrorKind::Unknown, message: other.to_string() },
        }
    }
}

/// Errors from the single-slot dialog coordinator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModalError {
    /// A dialog is already open.
    #[error("a dialog is already open")]
    Busy,

    /// No dialog with this identifier is open.
    #[error("no open dialog with id {0}")]
    NotOpen(u64),

    /// Resolution does not fit the open dialog's kind.
    #[error("dialog {id} cannot be resolved with {resolution}")]
    Mismatch {
        /// Dialog identifier
        id: u64,
        /// Attempted resolution
        resolution: &'static str,
    },
}
