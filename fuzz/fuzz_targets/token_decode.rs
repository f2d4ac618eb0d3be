//! Fuzz target for persisted token restoration
//!
//! The token file is user-writable, so anything can end up in it.
//!
//! # Invariants
//!
//! - NEVER panic on malformed tokens
//! - Restored session is authenticated iff the claims decode
//! - A discarded token leaves the session logged out

#![no_main]

use libfuzzer_sys::fuzz_target;
use postboard_client::{decode_claims, AuthSession, Restored};

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data).into_owned();
    let decoded = decode_claims(&raw);

    let mut session = AuthSession::new();
    match session.initialize(Some(raw)) {
        Restored::Authenticated(claims) => {
            assert_eq!(decoded.ok(), Some(claims.clone()));
            assert_eq!(session.is_admin(), claims.is_admin);
            assert_eq!(session.username(), Some(claims.subject));
        },
        Restored::Discarded => {
            assert!(decoded.is_err());
            assert!(!session.is_authenticated());
            assert_eq!(session.token(), None);
        },
        Restored::Anonymous => panic!("a present token was treated as absent"),
    }
});
