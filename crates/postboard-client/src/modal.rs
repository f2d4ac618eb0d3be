//! Single-slot dialog coordinator.
//!
//! At most one dialog is open at a time. Opening a second one while the slot
//! is taken fails with [`ModalError::Busy`] instead of stacking.
//!
//! Each dialog carries a continuation `C`, the work to resume once the user
//! answers. Confirmation dialogs hand it back on both answers (so the caller
//! can unwind on cancel); message dialogs hand back their optional follow-up on
//! acknowledgment.
//!
//! # States
//!
//! ```text
//! Closed --confirm()--> Confirm --Confirm/Cancel--> Closed
//! Closed --message()--> Message --Acknowledge-----> Closed
//! ```
//!
//! A dialog resolves exactly once: after resolution its id is no longer open
//! and any further answer fails with [`ModalError::NotOpen`].

use std::fmt;

use crate::error::ModalError;

/// Dialog identifier, unique per coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModalId(pub u64);

impl fmt::Display for ModalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "modal#{}", self.0)
    }
}

/// Severity of a message dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Neutral information.
    Info,
    /// Something worked.
    Success,
    /// Something failed.
    Error,
}

/// Dialog kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    /// Yes/no question.
    Confirm,
    /// Text with an OK button.
    Message(MessageKind),
}

/// What the presentation layer needs to draw a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalRequest {
    /// Identifier to answer with.
    pub id: ModalId,
    /// Kind of dialog.
    pub kind: ModalKind,
    /// Text to display.
    pub message: String,
}

/// Answer to a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalResolution {
    /// "Yes" on a confirmation.
    Confirm,
    /// "No" on a confirmation.
    Cancel,
    /// "OK" on a message.
    Acknowledge,
}

impl ModalResolution {
    fn name(self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Cancel => "cancel",
            Self::Acknowledge => "acknowledge",
        }
    }
}

/// How a dialog was resolved, with its continuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<C> {
    /// Confirmation accepted.
    Confirmed(C),
    /// Confirmation declined.
    Cancelled(C),
    /// Message acknowledged, with its follow-up if one was attached.
    Closed(Option<C>),
}

struct OpenModal<C> {
    request: ModalRequest,
    continuation: Option<C>,
}

/// Owner of the single dialog slot.
pub struct ModalCoordinator<C> {
    open: Option<OpenModal<C>>,
    next_id: u64,
}

impl<C> Default for ModalCoordinator<C> {
    fn default() -> Self {
        Self { open: None, next_id: 0 }
    }
}

impl<C> ModalCoordinator<C> {
    /// Coordinator with the slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a confirmation dialog.
    pub fn confirm(
        &mut self,
        message: impl Into<String>,
        continuation: C,
    ) -> Result<ModalRequest, ModalError> {
        self.open(ModalKind::Confirm, message.into(), Some(continuation))
    }

    /// Open a message dialog, optionally with a follow-up run on close.
    pub fn message(
        &mut self,
        message: impl Into<String>,
        kind: MessageKind,
        on_close: Option<C>,
    ) -> Result<ModalRequest, ModalError> {
        self.open(ModalKind::Message(kind), message.into(), on_close)
    }

    fn open(
        &mut self,
        kind: ModalKind,
        message: String,
        continuation: Option<C>,
    ) -> Result<ModalRequest, ModalError> {
        if self.open.is_some() {
            return Err(ModalError::Busy);
        }

        self.next_id += 1;
        let request = ModalRequest { id: ModalId(self.next_id), kind, message };
        self.open = Some(OpenModal { request: request.clone(), continuation });
        Ok(request)
    }

    /// Answer the open dialog.
    ///
    /// The slot is only freed when the answer fits the dialog kind.
    pub fn resolve(
        &mut self,
        id: ModalId,
        resolution: ModalResolution,
    ) -> Result<Resolved<C>, ModalError> {
        let kind = match &self.open {
            Some(open) if open.request.id == id => open.request.kind,
            _ => return Err(ModalError::NotOpen(id.0)),
        };

        let fits = matches!(
            (kind, resolution),
            (ModalKind::Confirm, ModalResolution::Confirm | ModalResolution::Cancel)
                | (ModalKind::Message(_), ModalResolution::Acknowledge)
        );
        if !fits {
            return Err(ModalError::Mismatch { id: id.0, resolution: resolution.name() });
        }

        let Some(open) = self.open.take() else {
            return Err(ModalError::NotOpen(id.0));
        };

        match (resolution, open.continuation) {
            (ModalResolution::Confirm, Some(c)) => Ok(Resolved::Confirmed(c)),
            (ModalResolution::Cancel, Some(c)) => Ok(Resolved::Cancelled(c)),
            (_, continuation) => Ok(Resolved::Closed(continuation)),
        }
    }

    /// Close the open dialog without an answer, returning its continuation.
    ///
    /// Used when the view that owns the dialog goes away.
    pub fn dismiss(&mut self) -> Option<(ModalId, Option<C>)> {
        self.open.take().map(|open| (open.request.id, open.continuation))
    }

    /// The open dialog, if any.
    pub fn active(&self) -> Option<&ModalRequest> {
        self.open.as_ref().map(|open| &open.request)
    }

    /// Continuation of the open dialog, if any.
    pub fn continuation(&self) -> Option<&C> {
        self.open.as_ref().and_then(|open| open.continuation.as_ref())
    }

    /// Whether the slot is taken.
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }
}
