//! Failure classification.
//!
//! Maps a failed outward call onto the fixed [`ErrorKind`] taxonomy and
//! composes the message shown to the user. Both presentation paths (inline and
//! dialog) go through [`classify`], so the text for a given failure is the
//! same wherever it ends up.
//!
//! The composition rule, in order:
//!
//! 1. 401 and the action defines an auth-required text: that text.
//! 2. 403 and the action defines an authorization text: that text.
//! 3. Body carries `error` or `msg`: `<base> Server says: <detail>`.
//! 4. No response at all: `<base> Network error: <detail>`.
//! 5. Otherwise: `<base>`.
//!
//! The kind always follows the status, even when the message falls through to
//! a later branch.

use std::fmt;

use postboard_proto::Response;

use crate::event::{CallResult, NoResponse, Operation};

/// Failure taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally before any outward call.
    Validation,
    /// HTTP 401.
    Unauthorized,
    /// HTTP 403.
    Forbidden,
    /// Server supplied an error text.
    ServerMessage(String),
    /// No response was received.
    NetworkFailure(String),
    /// Anything else (unexpected status without a body, undecodable success).
    Unknown,
}

/// A failure ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    /// Taxonomy bucket.
    pub kind: ErrorKind,
    /// Composed user-facing text.
    pub message: String,
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ClassifiedError {}

/// Per-action message texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionMessages {
    /// Prefix used by every fall-through branch.
    pub base: &'static str,
    /// Replacement text for 401, if the action has one.
    pub unauthorized: Option<&'static str>,
    /// Replacement text for 403, if the action has one.
    pub forbidden: Option<&'static str>,
}

/// Message table.
pub fn messages(operation: Operation) -> ActionMessages {
    match operation {
        Operation::FetchPosts => {
            ActionMessages { base: "Failed to load posts.", unauthorized: None, forbidden: None }
        },
        Operation::CreatePost => ActionMessages {
            base: "Failed to add post.",
            unauthorized: Some("You must be logged in to add posts."),
            forbidden: None,
        },
        Operation::UpdatePost => ActionMessages {
            base: "Failed to update post.",
            unauthorized: Some("You are not authorized to edit this post."),
            forbidden: Some("You are not authorized to edit this post."),
        },
        Operation::DeletePost => ActionMessages {
            base: "Failed to delete post.",
            unauthorized: Some("You are not authorized to delete this post."),
            forbidden: Some("You are not authorized to delete this post."),
        },
        Operation::FetchUsers => ActionMessages {
            base: "Failed to load users.",
            unauthorized: None,
            forbidden: Some("You do not have permission to view this page."),
        },
        Operation::DeleteUser => ActionMessages {
            base: "Failed to delete user.",
            unauthorized: None,
            forbidden: Some("You do not have permission to delete this user."),
        },
        Operation::Login => ActionMessages {
            base: "Login failed. Please check your credentials.",
            unauthorized: None,
            forbidden: None,
        },
        Operation::Register => ActionMessages {
            base: "Registration failed. Please try again.",
            unauthorized: None,
            forbidden: None,
        },
    }
}

/// Classify the outcome of a failed call.
///
/// A success status reaching this function means the body could not be
/// decoded; it classifies as [`ErrorKind::Unknown`] with the base text.
pub fn classify(operation: Operation, result: &CallResult) -> ClassifiedError {
    let texts = messages(operation);
    match result {
        Ok(response) => classify_response(texts, response),
        Err(NoResponse { detail }) => ClassifiedError {
            kind: ErrorKind::NetworkFailure(detail.clone()),
            message: format!("{} Network error: {detail}", texts.base),
        },
    }
}

fn classify_response(texts: ActionMessages, response: &Response) -> ClassifiedError {
    let detail = response.error_body().and_then(|b| b.detail().map(str::to_string));

    let kind = match (response.status, &detail) {
        (401, _) => ErrorKind::Unauthorized,
        (403, _) => ErrorKind::Forbidden,
        (_, Some(d)) => ErrorKind::ServerMessage(d.clone()),
        (_, None) => ErrorKind::Unknown,
    };

    let message = match (response.status, texts.unauthorized, texts.forbidden, detail) {
        (401, Some(text), _, _) | (403, _, Some(text), _) => text.to_string(),
        (_, _, _, Some(d)) => format!("{} Server says: {d}", texts.base),
        _ => texts.base.to_string(),
    };

    ClassifiedError { kind, message }
}
