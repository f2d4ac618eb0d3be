//! Generic runtime driving a [`Client`].
//!
//! The Runtime coordinates between:
//! - [`Client`]: Session and collection state machine
//! - [`Transport`]: Outward calls
//! - [`TokenStore`]: The persisted token slot
//!
//! Every outward call runs as its own future, so a slow call never blocks the
//! others. Results are fed back to the client in completion order.

use std::collections::HashMap;

use futures::{
    FutureExt, StreamExt,
    future::{AbortHandle, Abortable, Aborted, BoxFuture},
    stream::FuturesUnordered,
};
use postboard_client::{Client, ClientAction, ClientEvent, NoResponse, Outbound, RequestId};
use postboard_proto::Response;

use crate::{RuntimeError, StoreError, TokenStore, Transport, TransportError};

type Completion = (RequestId, Result<Result<Response, TransportError>, Aborted>);

/// Generic runtime that orchestrates Client, Transport and TokenStore.
///
/// # Type Parameters
///
/// - `T`: Transport performing outward calls
/// - `S`: Storage for the persisted token
pub struct Runtime<T: Transport, S: TokenStore> {
    client: Client,
    transport: T,
    store: S,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
    aborts: HashMap<RequestId, AbortHandle>,
}

impl<T: Transport, S: TokenStore> Runtime<T, S> {
    /// Create a runtime. Call [`Runtime::start`] before submitting events.
    pub fn new(client: Client, transport: T, store: S) -> Self {
        Self {
            client,
            transport,
            store,
            in_flight: FuturesUnordered::new(),
            aborts: HashMap::new(),
        }
    }

    /// The client state machine.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The token store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of calls in flight.
    pub fn pending(&self) -> usize {
        self.aborts.len()
    }

    /// Restore the session from the token store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn start(&mut self) -> Result<Vec<ClientAction>, RuntimeError> {
        let persisted_token = self.store.load()?;
        self.submit(ClientEvent::Initialize { persisted_token })
    }

    /// Feed an event to the client, execute its side effects and dispatch
    /// any requests it queued.
    ///
    /// # Errors
    ///
    /// Returns an error if the client rejects the event or the token store
    /// cannot be updated.
    pub fn submit(&mut self, event: ClientEvent) -> Result<Vec<ClientAction>, RuntimeError> {
        let actions = self.client.handle(event)?;
        self.apply(&actions)?;
        self.dispatch();
        Ok(actions)
    }

    /// Wait for the next call to finish and feed its result to the client.
    ///
    /// Returns `None` once nothing is in flight. Aborted calls are skipped.
    pub async fn next_completion(&mut self) -> Option<Result<Vec<ClientAction>, RuntimeError>> {
        while let Some((request_id, outcome)) = self.in_flight.next().await {
            self.aborts.remove(&request_id);

            let result = match outcome {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(TransportError::NoResponse(detail))) => Err(NoResponse { detail }),
                Ok(Err(TransportError::Cancelled)) | Err(Aborted) => {
                    tracing::debug!(%request_id, "call aborted");
                    continue;
                },
            };

            return Some(self.submit(ClientEvent::Response { request_id, result }));
        }
        None
    }

    /// Run until nothing is in flight, including refetches triggered along
    /// the way.
    ///
    /// # Errors
    ///
    /// Returns the first error; calls still in flight stay in flight.
    pub async fn settle(&mut self) -> Result<Vec<ClientAction>, RuntimeError> {
        let mut actions = Vec::new();
        while let Some(step) = self.next_completion().await {
            actions.extend(step?);
        }
        Ok(actions)
    }

    fn apply(&mut self, actions: &[ClientAction]) -> Result<(), StoreError> {
        for action in actions {
            match action {
                ClientAction::PersistToken(token) => self.store.save(token.as_str())?,
                ClientAction::ClearPersistedToken => self.store.clear()?,
                ClientAction::Cancel(request_id) => {
                    if let Some(handle) = self.aborts.remove(request_id) {
                        handle.abort();
                    }
                },

                // Presentation actions are for the caller
                ClientAction::SessionChanged { .. }
                | ClientAction::CollectionReplaced { .. }
                | ClientAction::Completed { .. }
                | ClientAction::Failed { .. }
                | ClientAction::ShowModal(_)
                | ClientAction::CloseModal(_)
                | ClientAction::FollowUp(_) => {},
            }
        }
        Ok(())
    }

    fn dispatch(&mut self) {
        for Outbound { id, request } in self.client.take_outgoing() {
            let (handle, registration) = AbortHandle::new_pair();
            let call = Abortable::new(self.transport.send(request), registration);
            self.aborts.insert(id, handle);
            self.in_flight.push(async move { (id, call.await) }.boxed());
        }
    }
}
