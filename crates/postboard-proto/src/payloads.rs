//! JSON payloads exchanged with the backend.
//!
//! Identifiers travel as `_id` on the wire (document-store object ids rendered
//! as strings). Error bodies come in two dialects: most endpoints answer with
//! `{"error": ...}`, the auth and admin endpoints with `{"msg": ...}`.
//! [`ErrorBody::detail`] folds both into one value so nothing above this crate
//! has to know which dialect a given endpoint speaks.

use serde::{Deserialize, Serialize};

/// A short text post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Server-assigned identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Username of the author.
    pub author: String,
    /// Post body (plain text).
    pub content: String,
    /// ISO-8601 creation time, as formatted by the server.
    pub timestamp: String,
    /// Calendar date (`YYYY-MM-DD`). Older posts may not carry it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// A registered account as listed by the admin endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Login name, unique per server.
    pub username: String,
    /// Whether the account has admin rights.
    #[serde(default)]
    pub is_admin: bool,
}

/// Body of `POST /api/login` and `POST /api/register`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Plaintext password, sent over the transport as-is.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of post create/update calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContent {
    /// New post body.
    pub content: String,
}

/// Success body of `POST /api/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token (`header.payload.signature`).
    pub access_token: String,
    /// Username the server authenticated.
    pub username: String,
    /// Admin flag the server reports for the account.
    #[serde(default)]
    pub is_admin: bool,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &"<redacted>")
            .field("username", &self.username)
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

/// Structured error body in either dialect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Dialect used by the post endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Dialect used by auth and admin endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl ErrorBody {
    /// Error body in the `error` dialect.
    pub fn error(detail: impl Into<String>) -> Self {
        Self { error: Some(detail.into()), msg: None }
    }

    /// Error body in the `msg` dialect.
    pub fn msg(detail: impl Into<String>) -> Self {
        Self { error: None, msg: Some(detail.into()) }
    }

    /// The server's error text, `error` taking precedence over `msg`.
    ///
    /// Empty strings count as absent.
    pub fn detail(&self) -> Option<&str> {
        self.error
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.msg.as_deref().filter(|s| !s.is_empty()))
    }
}

/// Request bodies.
///
/// Serialized untagged: the endpoint already determines which shape the
/// server expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Login / register body.
    Credentials(Credentials),
    /// Post create / update body.
    PostContent(PostContent),
}

impl Payload {
    /// Short name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Credentials(_) => "credentials",
            Self::PostContent(_) => "post content",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_reads_underscore_id() {
        let json = r#"{"_id":"65a1","author":"alice","content":"hi","timestamp":"2024-01-01T10:00:00","date":"2024-01-01"}"#;
        let post: Post = serde_json::from_str(json).unwrap();

        assert_eq!(post.id, "65a1");
        assert_eq!(post.date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn post_without_date_is_accepted() {
        let json = r#"{"_id":"1","author":"bob","content":"x","timestamp":"t"}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.date, None);
    }

    #[test]
    fn user_admin_flag_defaults_to_false() {
        let user: User = serde_json::from_str(r#"{"_id":"7","username":"carol"}"#).unwrap();
        assert!(!user.is_admin);
    }

    #[test]
    fn error_dialect_wins_over_msg() {
        let body = ErrorBody { error: Some("not yours".into()), msg: Some("other".into()) };
        assert_eq!(body.detail(), Some("not yours"));
    }

    #[test]
    fn msg_dialect_is_used_when_error_missing() {
        let body: ErrorBody = serde_json::from_str(r#"{"msg":"Admin access required"}"#).unwrap();
        assert_eq!(body.detail(), Some("Admin access required"));
    }

    #[test]
    fn empty_detail_counts_as_absent() {
        let body = ErrorBody { error: Some(String::new()), msg: None };
        assert_eq!(body.detail(), None);
    }

    #[test]
    fn unrelated_fields_leave_no_detail() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"message":"User deleted successfully"}"#).unwrap();
        assert_eq!(body.detail(), None);
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials { username: "alice".into(), password: "hunter2".into() };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("alice"));
    }

    #[test]
    fn payload_serializes_without_tag() {
        let payload = Payload::PostContent(PostContent { content: "hello".into() });
        assert_eq!(serde_json::to_string(&payload).unwrap(), r#"{"content":"hello"}"#);
    }
}
