//! Simulated transport answering from a [`SimBackend`].
//!
//! Every call is recorded. By default calls are answered immediately; with
//! [`SimTransport::hold`] enabled they are parked until the test releases
//! them, in any order, which is how response races are staged. The backend
//! handles a parked call at release time, so it sees server state as of the
//! release.

use std::{
    collections::VecDeque,
    future::Future,
    sync::{Arc, Mutex, MutexGuard},
};

use postboard_app::{Transport, TransportError};
use postboard_proto::{AuthorizedRequest, Endpoint, Response};
use tokio::sync::oneshot;

use crate::SimBackend;

type Reply = oneshot::Sender<Result<Response, TransportError>>;

struct Parked {
    request: AuthorizedRequest,
    reply: Reply,
}

struct Inner {
    backend: SimBackend,
    calls: Vec<AuthorizedRequest>,
    hold: bool,
    parked: Vec<Parked>,
    failures: VecDeque<String>,
}

/// In-memory transport for tests. Clones share state.
#[derive(Clone)]
pub struct SimTransport {
    inner: Arc<Mutex<Inner>>,
}

impl SimTransport {
    /// Transport in front of `backend`.
    pub fn new(backend: SimBackend) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                backend,
                calls: Vec::new(),
                hold: false,
                parked: Vec::new(),
                failures: VecDeque::new(),
            })),
        }
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("Mutex poisoned")
    }

    /// Inspect or modify the backend.
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut SimBackend) -> R) -> R {
        f(&mut self.lock().backend)
    }

    /// Every request sent so far, in send order.
    pub fn calls(&self) -> Vec<AuthorizedRequest> {
        self.lock().calls.clone()
    }

    /// Number of requests sent so far.
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Number of sent requests that targeted `endpoint`.
    pub fn count(&self, endpoint: &Endpoint) -> usize {
        self.lock().calls.iter().filter(|c| c.request.endpoint() == endpoint).count()
    }

    /// Park subsequent calls until released.
    pub fn hold(&self, hold: bool) {
        self.lock().hold = hold;
    }

    /// Fail the next call with no response.
    pub fn fail_next(&self, detail: impl Into<String>) {
        self.lock().failures.push_back(detail.into());
    }

    /// Endpoints of parked calls, in send order.
    pub fn parked(&self) -> Vec<Endpoint> {
        self.lock().parked.iter().map(|p| p.request.request.endpoint().clone()).collect()
    }

    /// Answer the parked call at `index` from the backend.
    ///
    /// Returns `false` if there is no such call.
    pub fn release(&self, index: usize) -> bool {
        let mut inner = self.lock();
        if index >= inner.parked.len() {
            return false;
        }
        let parked = inner.parked.remove(index);
        let response = inner.backend.handle(&parked.request);
        // The receiver is gone if the runtime aborted the call.
        let _ = parked.reply.send(Ok(response));
        true
    }

    /// Answer every parked call, oldest first.
    pub fn release_all(&self) {
        while self.release(0) {}
    }
}

impl Transport for SimTransport {
    fn send(
        &self,
        request: AuthorizedRequest,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send + 'static {
        let (reply, receiver) = oneshot::channel();

        {
            let mut inner = self.lock();
            inner.calls.push(request.clone());

            if let Some(detail) = inner.failures.pop_front() {
                let _ = reply.send(Err(TransportError::NoResponse(detail)));
            } else if inner.hold {
                inner.parked.push(Parked { request, reply });
            } else {
                let response = inner.backend.handle(&request);
                let _ = reply.send(Ok(response));
            }
        }

        async move { receiver.await.unwrap_or(Err(TransportError::Cancelled)) }
    }
}

#[cfg(test)]
mod tests {
    use postboard_proto::Request;

    use super::*;

    fn list_posts() -> AuthorizedRequest {
        AuthorizedRequest::new(Request::bodyless(Endpoint::ListPosts).unwrap(), None)
    }

    #[tokio::test]
    async fn answers_immediately_by_default() {
        let transport = SimTransport::new(SimBackend::new());
        let response = transport.send(list_posts()).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn held_calls_wait_for_release() {
        let transport = SimTransport::new(SimBackend::new());
        transport.hold(true);

        let pending = transport.send(list_posts());
        assert_eq!(transport.parked(), [Endpoint::ListPosts]);

        transport.with_backend(|b| b.add_post("alice", "late"));
        assert!(transport.release(0));

        let posts: Vec<postboard_proto::Post> = pending.await.unwrap().decode("posts").unwrap();
        assert_eq!(posts.len(), 1);
    }

    #[tokio::test]
    async fn injected_failure_has_no_response() {
        let transport = SimTransport::new(SimBackend::new());
        transport.fail_next("connection refused");

        let result = transport.send(list_posts()).await;
        assert_eq!(result, Err(TransportError::NoResponse("connection refused".into())));
        assert_eq!(transport.with_backend(|b| b.handled()), 0);
    }
}
