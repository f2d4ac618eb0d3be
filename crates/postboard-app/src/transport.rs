//! Transport trait for outward calls.
//!
//! The [`Transport`] trait decouples the runtime from a specific HTTP stack.
//! Production uses [`crate::HttpTransport`]; tests use the simulated transport
//! from `postboard-harness`, so the same orchestration code runs in both.

use std::future::Future;

use postboard_proto::{AuthorizedRequest, Response};

use crate::TransportError;

/// Performs one outward call per request.
///
/// # Contract
///
/// - Any HTTP status is a response, including 4xx/5xx. Only a call that
///   produced no response at all fails, with [`TransportError::NoResponse`].
/// - The returned future owns everything it needs, so the runtime can hold
///   many calls in flight and abort them independently.
/// - The `Authorization` header is sent exactly as given in the request.
pub trait Transport: Send + Sync + 'static {
    /// Send a request and wait for the response.
    fn send(
        &self,
        request: AuthorizedRequest,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send + 'static;
}
