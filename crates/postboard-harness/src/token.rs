//! Bearer tokens issued by the simulated backend.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Serialize;

/// Signature segment carried by every token the simulation issues.
pub const SIM_SIGNATURE: &str = "c2ltLXNpZ25hdHVyZQ";

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Serialize)]
struct SimClaims<'a> {
    sub: &'a str,
    is_admin: bool,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Mint a token for `subject` in the backend's format.
///
/// The payload carries `sub` and `is_admin` like the real server's tokens.
pub fn mint_token(subject: &str, is_admin: bool) -> String {
    let claims = SimClaims { sub: subject, is_admin, kind: "access" };
    let payload = serde_json::to_vec(&claims).unwrap_or_default();
    format!(
        "{}.{}.{SIM_SIGNATURE}",
        URL_SAFE_NO_PAD.encode(HEADER),
        URL_SAFE_NO_PAD.encode(payload)
    )
}

/// Token with a payload that is not JSON.
pub fn corrupt_token() -> String {
    format!("{}.{}.{SIM_SIGNATURE}", URL_SAFE_NO_PAD.encode(HEADER), URL_SAFE_NO_PAD.encode("{oops"))
}
