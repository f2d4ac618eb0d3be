//! Resource kinds synchronized by [`crate::ResourceController`].

use postboard_proto::{Endpoint, Payload, Post, PostContent, ProtocolError, Request, User};
use serde::de::DeserializeOwned;

use crate::{
    error::ClientError,
    event::{Operation, Scope},
    session::AuthSession,
};

/// A collection item kept in sync with a protected list endpoint.
pub trait Resource: Clone + DeserializeOwned + std::fmt::Debug {
    /// Input for create and update.
    type Draft;

    /// Kind name for logs and errors.
    const KIND: &'static str;

    /// View scope the collection belongs to.
    const SCOPE: Scope;

    /// Operation reported for list loads.
    const FETCH: Operation;

    /// Operation reported for deletes.
    const DELETE: Operation;

    /// Operation reported for creates, if the backend has one.
    const CREATE: Option<Operation> = None;

    /// Operation reported for updates, if the backend has one.
    const UPDATE: Option<Operation> = None;

    /// Server identifier.
    fn id(&self) -> &str;

    /// Username allowed to modify this item besides admins. `None` means
    /// admins only.
    fn owner(&self) -> Option<&str>;

    /// Human-readable label for dialogs.
    fn label(&self) -> &str;

    /// Whether this item may never be deleted, whoever asks.
    fn is_protected(&self, _sentinel: &str) -> bool {
        false
    }

    /// List call.
    fn list_endpoint() -> Endpoint;

    /// Delete call.
    fn delete_endpoint(id: String) -> Endpoint;

    /// Validate a draft and build the create call.
    fn create_request(_draft: &Self::Draft) -> Result<Request, ClientError> {
        Err(ClientError::Unsupported { kind: Self::KIND, operation: "create" })
    }

    /// Validate a draft and build the update call.
    fn update_request(_id: &str, _draft: &Self::Draft) -> Result<Request, ClientError> {
        Err(ClientError::Unsupported { kind: Self::KIND, operation: "update" })
    }
}

/// Advisory permission check for showing edit/delete controls.
///
/// The server decides for real; this only avoids offering actions that are
/// certain to be refused.
pub fn can_modify<R: Resource>(item: &R, session: &AuthSession, sentinel: &str) -> bool {
    if !session.is_authenticated() || item.is_protected(sentinel) {
        return false;
    }
    let Some(claims) = session.claims() else {
        return false;
    };
    claims.is_admin || item.owner().is_some_and(|owner| owner == claims.subject)
}

const EMPTY_POST: &str = "Post content cannot be empty!";

fn post_content(draft: &str) -> Result<Payload, ClientError> {
    if draft.trim().is_empty() {
        return Err(ClientError::Validation(EMPTY_POST.to_string()));
    }
    Ok(Payload::PostContent(PostContent { content: draft.to_string() }))
}

pub(crate) fn with_payload(endpoint: Endpoint, payload: Payload) -> Result<Request, ClientError> {
    let what = endpoint.to_string();
    Request::with_payload(endpoint, payload).ok_or_else(|| {
        ClientError::Protocol(ProtocolError::Encode {
            what: "request",
            reason: format!("{what} takes no body"),
        })
    })
}

pub(crate) fn bodyless(endpoint: Endpoint) -> Result<Request, ClientError> {
    let what = endpoint.to_string();
    Request::bodyless(endpoint).ok_or_else(|| {
        ClientError::Protocol(ProtocolError::Encode {
            what: "request",
            reason: format!("{what} requires a body"),
        })
    })
}

impl Resource for Post {
    type Draft = String;

    const KIND: &'static str = "post";
    const SCOPE: Scope = Scope::Posts;
    const FETCH: Operation = Operation::FetchPosts;
    const DELETE: Operation = Operation::DeletePost;
    const CREATE: Option<Operation> = Some(Operation::CreatePost);
    const UPDATE: Option<Operation> = Some(Operation::UpdatePost);

    fn id(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> Option<&str> {
        Some(&self.author)
    }

    fn label(&self) -> &str {
        &self.content
    }

    fn list_endpoint() -> Endpoint {
        Endpoint::ListPosts
    }

    fn delete_endpoint(id: String) -> Endpoint {
        Endpoint::DeletePost { id }
    }

    fn create_request(draft: &String) -> Result<Request, ClientError> {
        with_payload(Endpoint::CreatePost, post_content(draft)?)
    }

    fn update_request(id: &str, draft: &String) -> Result<Request, ClientError> {
        with_payload(Endpoint::UpdatePost { id: id.to_string() }, post_content(draft)?)
    }
}

impl Resource for User {
    type Draft = ();

    const KIND: &'static str = "user";
    const SCOPE: Scope = Scope::Users;
    const FETCH: Operation = Operation::FetchUsers;
    const DELETE: Operation = Operation::DeleteUser;

    fn id(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> Option<&str> {
        None
    }

    fn label(&self) -> &str {
        &self.username
    }

    fn is_protected(&self, sentinel: &str) -> bool {
        self.username == sentinel
    }

    fn list_endpoint() -> Endpoint {
        Endpoint::ListUsers
    }

    fn delete_endpoint(id: String) -> Endpoint {
        Endpoint::DeleteUser { id }
    }
}
