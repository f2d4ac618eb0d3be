//! Wire contract for the postboard REST backend.
//!
//! Everything the client core needs to know about the server lives here: the
//! JSON payload shapes, the method and path of every call, and the raw
//! request/response envelopes that a transport moves over the network.
//!
//! The crate performs no I/O. Transports serialize a [`Request`] with
//! [`Request::encode_body`] and hand back a [`Response`] with the raw status and
//! body bytes; decoding into typed payloads happens in the client.
//!
//! # Components
//!
//! - [`Endpoint`]: One variant per REST call, mapping to a [`Method`] and path
//! - [`Payload`]: Request bodies (credentials, post content)
//! - [`Post`], [`User`], [`LoginResponse`]: Success shapes
//! - [`ErrorBody`]: The two error-body dialects (`error` / `msg`)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod endpoint;
pub mod errors;
pub mod payloads;

pub use endpoint::{AUTHORIZATION, AuthorizedRequest, Endpoint, Method, Request, Response};
pub use errors::{ProtocolError, Result};
pub use payloads::{Credentials, ErrorBody, LoginResponse, Payload, Post, PostContent, User};
