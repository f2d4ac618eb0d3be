//! Synchronous driver for the Sans-IO client.
//!
//! `SimDriver` plays the role of the runtime without any async machinery:
//! queued requests are taken from the [`Client`] and answered by a
//! [`SimBackend`], either one at a time in a test-chosen order or all at once
//! until the client goes idle. Persist/clear actions are applied to an
//! in-memory token slot, and every request sent is recorded.

use postboard_client::{
    CallResult, Client, ClientAction, ClientConfig, ClientError, ClientEvent, NoResponse, Outbound,
};
use postboard_proto::{AuthorizedRequest, Endpoint};

use crate::SimBackend;

/// Deterministic driver pairing a client with an in-memory backend.
pub struct SimDriver {
    client: Client,
    backend: SimBackend,
    calls: Vec<AuthorizedRequest>,
    stored_token: Option<String>,
}

impl SimDriver {
    /// Driver with a fresh client.
    pub fn new(config: ClientConfig, backend: SimBackend) -> Self {
        Self { client: Client::new(config), backend, calls: Vec::new(), stored_token: None }
    }

    /// The client under test.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The backend.
    pub fn backend(&mut self) -> &mut SimBackend {
        &mut self.backend
    }

    /// Every request handed to the backend, in order.
    pub fn calls(&self) -> &[AuthorizedRequest] {
        &self.calls
    }

    /// Number of recorded requests that targeted `endpoint`.
    pub fn count(&self, endpoint: &Endpoint) -> usize {
        self.calls.iter().filter(|c| c.request.endpoint() == endpoint).count()
    }

    /// Contents of the persisted token slot.
    pub fn stored_token(&self) -> Option<&str> {
        self.stored_token.as_deref()
    }

    /// Pre-fill the persisted token slot.
    pub fn set_stored_token(&mut self, token: Option<String>) {
        self.stored_token = token;
    }

    /// Initialize the client from the persisted slot.
    pub fn start(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        let persisted_token = self.stored_token.clone();
        self.submit(ClientEvent::Initialize { persisted_token })
    }

    /// Feed an event to the client and apply storage actions.
    pub fn submit(&mut self, event: ClientEvent) -> Result<Vec<ClientAction>, ClientError> {
        let actions = self.client.handle(event)?;
        for action in &actions {
            match action {
                ClientAction::PersistToken(token) => {
                    self.stored_token = Some(token.as_str().to_string());
                },
                ClientAction::ClearPersistedToken => self.stored_token = None,
                _ => {},
            }
        }
        Ok(actions)
    }

    /// Take queued requests without answering them.
    ///
    /// Credential headers are resolved now; the requests are recorded as sent.
    pub fn send(&mut self) -> Vec<Outbound> {
        let outbound = self.client.take_outgoing();
        self.calls.extend(outbound.iter().map(|o| o.request.clone()));
        outbound
    }

    /// Answer one sent request from the backend.
    pub fn answer(&mut self, outbound: &Outbound) -> Result<Vec<ClientAction>, ClientError> {
        let response = self.backend.handle(&outbound.request);
        self.deliver(outbound, Ok(response))
    }

    /// Fail one sent request with no response.
    pub fn fail(
        &mut self,
        outbound: &Outbound,
        detail: &str,
    ) -> Result<Vec<ClientAction>, ClientError> {
        self.deliver(outbound, Err(NoResponse { detail: detail.to_string() }))
    }

    /// Feed a result for a sent request, however it was obtained.
    ///
    /// Lets a test capture a backend answer early and deliver it late.
    pub fn deliver(
        &mut self,
        outbound: &Outbound,
        result: CallResult,
    ) -> Result<Vec<ClientAction>, ClientError> {
        self.submit(ClientEvent::Response { request_id: outbound.id, result })
    }

    /// Send and answer requests in order until none are queued.
    pub fn run_until_idle(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        let mut actions = Vec::new();
        loop {
            let outbound = self.send();
            if outbound.is_empty() {
                return Ok(actions);
            }
            for o in &outbound {
                actions.extend(self.answer(o)?);
            }
        }
    }

    /// Submit an event, then run until idle.
    pub fn step(&mut self, event: ClientEvent) -> Result<Vec<ClientAction>, ClientError> {
        let mut actions = self.submit(event)?;
        actions.extend(self.run_until_idle()?);
        Ok(actions)
    }
}
