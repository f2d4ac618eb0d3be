//! REST call table and request/response envelopes.
//!
//! # Invariants
//!
//! - Every [`Endpoint`] maps to exactly one method and path (enforced by match
//!   exhaustiveness).
//! - A [`Request`] carries a body iff its method is `POST` or `PUT`; the
//!   constructors are the only way to build one.

use std::fmt;

use serde::de::DeserializeOwned;

use crate::{
    ErrorBody, Payload,
    errors::{ProtocolError, Result},
};

/// Name of the credential header.
pub const AUTHORIZATION: &str = "Authorization";

/// HTTP methods used by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl Method {
    /// Upper-case method token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every REST call the client core makes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET /api/posts`
    ListPosts,
    /// `POST /api/posts`
    CreatePost,
    /// `PUT /api/posts/:id`
    UpdatePost {
        /// Post identifier
        id: String,
    },
    /// `DELETE /api/posts/:id`
    DeletePost {
        /// Post identifier
        id: String,
    },
    /// `POST /api/login`
    Login,
    /// `POST /api/register`
    Register,
    /// `GET /api/users`
    ListUsers,
    /// `DELETE /api/users/:id`
    DeleteUser {
        /// User identifier
        id: String,
    },
}

impl Endpoint {
    /// HTTP method of the call.
    pub fn method(&self) -> Method {
        match self {
            Self::ListPosts | Self::ListUsers => Method::Get,
            Self::CreatePost | Self::Login | Self::Register => Method::Post,
            Self::UpdatePost { .. } => Method::Put,
            Self::DeletePost { .. } | Self::DeleteUser { .. } => Method::Delete,
        }
    }

    /// Path relative to the server root, including the `/api` prefix.
    pub fn path(&self) -> String {
        match self {
            Self::ListPosts | Self::CreatePost => "/api/posts".to_string(),
            Self::UpdatePost { id } | Self::DeletePost { id } => format!("/api/posts/{id}"),
            Self::Login => "/api/login".to_string(),
            Self::Register => "/api/register".to_string(),
            Self::ListUsers => "/api/users".to_string(),
            Self::DeleteUser { id } => format!("/api/users/{id}"),
        }
    }

    /// Whether the call sends a JSON body.
    pub fn has_body(&self) -> bool {
        matches!(self.method(), Method::Post | Method::Put)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

/// An outward call before credentials are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    endpoint: Endpoint,
    payload: Option<Payload>,
}

impl Request {
    /// Bodyless call (`GET` / `DELETE`).
    ///
    /// Returns `None` if the endpoint requires a body.
    pub fn bodyless(endpoint: Endpoint) -> Option<Self> {
        (!endpoint.has_body()).then_some(Self { endpoint, payload: None })
    }

    /// Call with a JSON body (`POST` / `PUT`).
    ///
    /// Returns `None` if the endpoint takes no body.
    pub fn with_payload(endpoint: Endpoint, payload: Payload) -> Option<Self> {
        endpoint.has_body().then_some(Self { endpoint, payload: Some(payload) })
    }

    /// Target endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Body, if the call has one.
    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// JSON-encoded body.
    pub fn encode_body(&self) -> Result<Option<Vec<u8>>> {
        self.payload
            .as_ref()
            .map(|p| {
                serde_json::to_vec(p)
                    .map_err(|e| ProtocolError::Encode { what: p.name(), reason: e.to_string() })
            })
            .transpose()
    }
}

/// A request with the credential header resolved.
///
/// Produced at hand-off time so the header always reflects the session as it
/// is when the call leaves the client, not when it was queued.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizedRequest {
    /// The call itself.
    pub request: Request,
    /// Value of the `Authorization` header, if a session is active.
    pub authorization: Option<String>,
}

impl AuthorizedRequest {
    /// Attach a bearer token (or none) to a request.
    pub fn new(request: Request, token: Option<&str>) -> Self {
        Self { request, authorization: token.map(|t| format!("Bearer {t}")) }
    }

    /// Header name/value pair to send, if any.
    pub fn header(&self) -> Option<(&'static str, &str)> {
        self.authorization.as_deref().map(|v| (AUTHORIZATION, v))
    }
}

impl fmt::Debug for AuthorizedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizedRequest")
            .field("request", &self.request)
            .field("authorized", &self.authorization.is_some())
            .finish()
    }
}

/// A response as received by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Raw body bytes (may be empty).
    pub body: Vec<u8>,
}

impl Response {
    /// Response with a JSON-serializable body.
    pub fn json<T: serde::Serialize>(status: u16, body: &T) -> Self {
        Self { status, body: serde_json::to_vec(body).unwrap_or_default() }
    }

    /// Response without a body.
    pub fn empty(status: u16) -> Self {
        Self { status, body: Vec::new() }
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as `T`.
    pub fn decode<T: DeserializeOwned>(&self, what: &'static str) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ProtocolError::Decode { what, reason: e.to_string() })
    }

    /// Structured error body, if the response carries one.
    ///
    /// Non-JSON and non-object bodies yield `None`.
    pub fn error_body(&self) -> Option<ErrorBody> {
        serde_json::from_slice(&self.body).ok()
    }
}
