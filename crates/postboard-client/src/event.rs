//! Client events and actions.

use std::fmt;

use postboard_proto::{AuthorizedRequest, Response};

use crate::{
    claims::{BearerToken, Claims},
    classify::ClassifiedError,
    modal::{ModalId, ModalRequest, ModalResolution},
};

/// Identifier of one outward call, unique per [`crate::Client`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

/// Monotonic request id allocator.
#[derive(Debug, Default)]
pub struct RequestIds {
    next: u64,
}

impl RequestIds {
    /// Allocate the next id.
    pub fn allocate(&mut self) -> RequestId {
        self.next += 1;
        RequestId(self.next)
    }
}

/// Lifetime a request belongs to.
///
/// Closing a scope abandons every request issued under it; responses that
/// arrive afterwards are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Login and registration.
    Session,
    /// The post list view.
    Posts,
    /// The admin user view.
    Users,
}

/// User-visible operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Load the post list.
    FetchPosts,
    /// Publish a post.
    CreatePost,
    /// Edit a post.
    UpdatePost,
    /// Remove a post.
    DeletePost,
    /// Load the user list.
    FetchUsers,
    /// Remove a user account.
    DeleteUser,
    /// Start a session.
    Login,
    /// Create an account.
    Register,
}

/// Where a failure of an operation is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Next to the form or list that triggered it.
    Inline,
    /// In a blocking message dialog.
    Dialog,
}

impl Operation {
    /// How failures of this operation are presented.
    pub fn presentation(self) -> Presentation {
        match self {
            Self::DeleteUser => Presentation::Dialog,
            Self::FetchPosts
            | Self::CreatePost
            | Self::UpdatePost
            | Self::DeletePost
            | Self::FetchUsers
            | Self::Login
            | Self::Register => Presentation::Inline,
        }
    }
}

/// The call failed before any response arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoResponse {
    /// Transport-level description.
    pub detail: String,
}

/// Outcome of an outward call as fed back into the client.
pub type CallResult = Result<Response, NoResponse>;

/// Follow-up requested when a dialog closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// Move the user to the login form.
    NavigateToLogin,
}

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Forwarding user intents (submit, delete, dialog answers)
/// - Executing queued requests and feeding their results back as
///   [`ClientEvent::Response`]
/// - Loading the persisted token on startup
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Restore the session from the persisted token, if any.
    Initialize {
        /// Token read from the storage slot.
        persisted_token: Option<String>,
    },

    /// Start a session.
    Login {
        /// Login name.
        username: String,
        /// Password.
        password: String,
    },

    /// Create an account. Does not start a session.
    Register {
        /// Login name.
        username: String,
        /// Password.
        password: String,
        /// Password typed a second time.
        confirm_password: String,
    },

    /// End the session.
    Logout,

    /// Reload the post list.
    FetchPosts,

    /// Publish a post.
    CreatePost {
        /// Post body.
        content: String,
    },

    /// Replace a post's body.
    UpdatePost {
        /// Post identifier.
        id: String,
        /// New body.
        content: String,
    },

    /// Ask to delete a post (opens a confirmation).
    DeletePost {
        /// Post identifier.
        id: String,
    },

    /// Reload the user list (admin only).
    FetchUsers,

    /// Ask to delete a user (opens a confirmation).
    DeleteUser {
        /// User identifier.
        id: String,
    },

    /// Answer to the open dialog.
    ResolveModal {
        /// Dialog being answered.
        modal_id: ModalId,
        /// The answer.
        resolution: ModalResolution,
    },

    /// Result of a previously queued request.
    Response {
        /// Request the result belongs to.
        request_id: RequestId,
        /// Response or transport failure.
        result: CallResult,
    },

    /// A consuming view went away; abandon its requests.
    CloseScope(Scope),
}

/// Actions the client produces for the caller to execute or render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Write the token to the storage slot.
    PersistToken(BearerToken),

    /// Empty the storage slot.
    ClearPersistedToken,

    /// Session identity changed. `None` when logged out.
    SessionChanged {
        /// Claims of the new session.
        claims: Option<Claims>,
    },

    /// A collection was replaced by a fresh server copy.
    CollectionReplaced {
        /// Which collection.
        scope: Scope,
        /// Number of items now held.
        len: usize,
    },

    /// An operation finished successfully.
    Completed {
        /// The operation.
        operation: Operation,
    },

    /// An operation failed; show the error inline.
    Failed {
        /// The operation.
        operation: Operation,
        /// Classified failure.
        error: ClassifiedError,
    },

    /// Open a dialog.
    ShowModal(ModalRequest),

    /// Close a dialog.
    CloseModal(ModalId),

    /// Perform a follow-up (navigation) requested by a closed dialog.
    FollowUp(FollowUp),

    /// Abort an in-flight request; its result will be ignored.
    Cancel(RequestId),
}

/// A request ready for the transport.
#[derive(Debug, Clone)]
pub struct Outbound {
    /// Identifier to report the result under.
    pub id: RequestId,
    /// Request with its credential header resolved.
    pub request: AuthorizedRequest,
}
