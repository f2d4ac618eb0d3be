//! Session state.
//!
//! [`AuthSession`] owns the single bearer token. Everything else about the
//! session (authenticated, admin, username) is derived from that token on
//! every read; nothing is cached next to it.
//!
//! # Invariants
//!
//! - At most one token is held.
//! - A held token always decodes: tokens that do not are never stored, and a
//!   persisted token that does not is discarded during [`AuthSession::initialize`].
//! - `is_admin()` implies `is_authenticated()`.

use postboard_proto::{AuthorizedRequest, Request};

use crate::{
    claims::{BearerToken, Claims},
    error::ClientError,
};

/// Result of restoring a persisted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restored {
    /// Nothing was persisted.
    Anonymous,
    /// Persisted token decoded; session active.
    Authenticated(Claims),
    /// Persisted token was corrupt; session forced to logged out.
    Discarded,
}

/// The current credential and everything derived from it.
#[derive(Debug, Default)]
pub struct AuthSession {
    token: Option<BearerToken>,
}

impl AuthSession {
    /// Logged-out session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from the persisted slot.
    ///
    /// A token that fails to decode is not an error for the caller: the
    /// session is logged out and [`Restored::Discarded`] tells the caller to
    /// clear the slot.
    pub fn initialize(&mut self, persisted: Option<String>) -> Restored {
        let Some(raw) = persisted else {
            self.token = None;
            return Restored::Anonymous;
        };

        match self.establish(BearerToken::new(raw)) {
            Ok(claims) => {
                tracing::info!(user = %claims.subject, "restored persisted session");
                Restored::Authenticated(claims)
            },
            Err(e) => {
                tracing::warn!(error = %e, "discarding persisted token");
                self.token = None;
                Restored::Discarded
            },
        }
    }

    /// Replace the token after a successful login.
    ///
    /// The token is decoded before it is stored. On failure the current
    /// session, if any, is left as it was.
    pub fn establish(&mut self, token: BearerToken) -> Result<Claims, ClientError> {
        let claims = token.claims()?;
        self.token = Some(token);
        Ok(claims)
    }

    /// Drop the token. Returns whether a session was active.
    pub fn logout(&mut self) -> bool {
        self.token.take().is_some()
    }

    /// Raw token, if a session is active.
    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(BearerToken::as_str)
    }

    /// Whether a token is held.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Claims decoded from the current token.
    pub fn claims(&self) -> Option<Claims> {
        self.token.as_ref().and_then(|t| t.claims().ok())
    }

    /// Whether the current token carries the admin flag.
    pub fn is_admin(&self) -> bool {
        self.claims().is_some_and(|c| c.is_admin)
    }

    /// Username of the current session.
    pub fn username(&self) -> Option<String> {
        self.claims().map(|c| c.subject)
    }

    /// Attach the current credential to a request.
    pub fn authorize(&self, request: Request) -> AuthorizedRequest {
        AuthorizedRequest::new(request, self.token())
    }
}

#[cfg(test)]
mod tests {
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use postboard_proto::Endpoint;

    use super::*;

    fn token(sub: &str, is_admin: bool) -> String {
        let payload = format!(r#"{{"sub":"{sub}","is_admin":{is_admin}}}"#);
        format!("h.{}.s", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn initialize_without_token_is_anonymous() {
        let mut session = AuthSession::new();

        assert_eq!(session.initialize(None), Restored::Anonymous);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn initialize_with_valid_token_restores() {
        let mut session = AuthSession::new();
        let restored = session.initialize(Some(token("alice", false)));

        assert!(matches!(restored, Restored::Authenticated(ref c) if c.subject == "alice"));
        assert!(session.is_authenticated());
        assert!(!session.is_admin());
    }

    #[test]
    fn initialize_with_corrupt_token_logs_out() {
        let mut session = AuthSession::new();
        session.establish(BearerToken::new(token("bob", true))).unwrap();

        assert_eq!(session.initialize(Some("garbage".into())), Restored::Discarded);
        assert!(!session.is_authenticated());
        assert_eq!(session.claims(), None);
    }

    #[test]
    fn establish_rejects_undecodable_token() {
        let mut session = AuthSession::new();

        assert!(session.establish(BearerToken::new("x.y.z")).is_err());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn undecodable_token_keeps_current_session() {
        let mut session = AuthSession::new();
        let raw = token("alice", false);
        session.establish(BearerToken::new(raw.clone())).unwrap();

        assert!(session.establish(BearerToken::new("bad")).is_err());
        assert_eq!(session.token(), Some(raw.as_str()));
        assert_eq!(session.username().as_deref(), Some("alice"));
    }

    #[test]
    fn admin_is_derived_from_token() {
        let mut session = AuthSession::new();
        session.establish(BearerToken::new(token("root", true))).unwrap();
        assert!(session.is_admin());

        session.logout();
        assert!(!session.is_admin());
        assert_eq!(session.username(), None);
    }

    #[test]
    fn authorize_reads_current_token() {
        let mut session = AuthSession::new();
        let raw = token("alice", false);
        session.establish(BearerToken::new(raw.clone())).unwrap();

        let request = Request::bodyless(Endpoint::ListPosts).unwrap();
        let expected = format!("Bearer {raw}");
        assert_eq!(session.authorize(request.clone()).authorization, Some(expected));

        session.logout();
        assert_eq!(session.authorize(request).authorization, None);
    }
}
