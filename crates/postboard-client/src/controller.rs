//! Collection synchronization for one resource kind.
//!
//! A [`ResourceController`] holds the local copy of a server collection and the
//! bookkeeping for requests issued against it. It never edits the collection
//! locally: after any successful mutation the owner issues a fresh
//! [`ResourceController::fetch_all`] and the server's answer replaces the
//! collection wholesale, in server order.
//!
//! # Mutation lifecycle
//!
//! ```text
//! Idle --create/update--> Pending --ok--> Idle (+ refetch)
//!                                 --err-> Idle (+ error)
//! Idle --request_delete--> ConfirmPending --cancel--> Idle
//!                                         --confirm-> Pending --> ...
//! ```
//!
//! Each mutation is tracked under its own request id; mutations do not block
//! or wait on each other.

use std::collections::HashMap;

use postboard_proto::Request;

use crate::{
    classify::{ClassifiedError, classify},
    config::SyncPolicy,
    error::{ClientError, ModalError},
    event::{CallResult, Operation, RequestId, RequestIds},
    resource::{Resource, bodyless},
};

/// Phase of a single mutating action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPhase {
    /// Nothing in progress.
    Idle,
    /// Waiting for the user to confirm.
    ConfirmPending,
    /// Request in flight.
    Pending,
}

/// A mutation in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// New item.
    Create,
    /// Changed item.
    Update {
        /// Target identifier
        id: String,
    },
    /// Removed item.
    Delete {
        /// Target identifier
        id: String,
    },
}

/// Result of feeding a response to a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Collection replaced.
    Replaced {
        /// Items now held
        len: usize,
    },
    /// List response older than what is already applied; dropped.
    Stale,
    /// List load failed.
    FetchFailed(ClassifiedError),
    /// Mutation accepted by the server.
    Mutated {
        /// Reported operation
        operation: Operation,
        /// What changed
        mutation: Mutation,
    },
    /// Mutation refused or lost.
    MutationFailed {
        /// Reported operation
        operation: Operation,
        /// What was attempted
        mutation: Mutation,
        /// Classified failure
        error: ClassifiedError,
    },
}

/// Local copy of one server collection plus its in-flight requests.
#[derive(Debug)]
pub struct ResourceController<R: Resource> {
    items: Vec<R>,
    error: Option<ClassifiedError>,
    policy: SyncPolicy,
    /// Generation of the newest list request issued.
    issued: u64,
    /// Generation of the list currently held (0 before the first load).
    applied: u64,
    fetches: HashMap<RequestId, u64>,
    mutations: HashMap<RequestId, (Operation, Mutation)>,
    confirming: Option<String>,
}

impl<R: Resource> ResourceController<R> {
    /// Empty controller.
    pub fn new(policy: SyncPolicy) -> Self {
        Self {
            items: Vec::new(),
            error: None,
            policy,
            issued: 0,
            applied: 0,
            fetches: HashMap::new(),
            mutations: HashMap::new(),
            confirming: None,
        }
    }

    /// Items in server order.
    pub fn items(&self) -> &[R] {
        &self.items
    }

    /// Item by identifier.
    pub fn get(&self, id: &str) -> Option<&R> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Last list-load error, cleared by the next successful load.
    pub fn error(&self) -> Option<&ClassifiedError> {
        self.error.as_ref()
    }

    /// Whether a list load is in flight.
    pub fn is_loading(&self) -> bool {
        !self.fetches.is_empty()
    }

    /// Number of requests in flight (loads and mutations).
    pub fn in_flight(&self) -> usize {
        self.fetches.len() + self.mutations.len()
    }

    /// Whether a request id belongs to this controller.
    pub fn owns(&self, request_id: RequestId) -> bool {
        self.fetches.contains_key(&request_id) || self.mutations.contains_key(&request_id)
    }

    /// Phase of the delete action for an item.
    pub fn delete_phase(&self, id: &str) -> ActionPhase {
        if self.confirming.as_deref() == Some(id) {
            return ActionPhase::ConfirmPending;
        }
        let pending = self
            .mutations
            .values()
            .any(|(_, m)| matches!(m, Mutation::Delete { id: target } if target == id));
        if pending { ActionPhase::Pending } else { ActionPhase::Idle }
    }

    /// Issue a list load.
    pub fn fetch_all(&mut self, ids: &mut RequestIds) -> Result<(RequestId, Request), ClientError> {
        let request = bodyless(R::list_endpoint())?;
        let request_id = ids.allocate();
        self.issued += 1;
        self.fetches.insert(request_id, self.issued);
        tracing::debug!(kind = R::KIND, %request_id, generation = self.issued, "list load issued");
        Ok((request_id, request))
    }

    /// Validate and issue a create.
    pub fn create(
        &mut self,
        ids: &mut RequestIds,
        draft: &R::Draft,
    ) -> Result<(RequestId, Request), ClientError> {
        let operation =
            R::CREATE.ok_or(ClientError::Unsupported { kind: R::KIND, operation: "create" })?;
        let request = R::create_request(draft)?;
        Ok(self.track(ids, operation, Mutation::Create, request))
    }

    /// Validate and issue an update.
    pub fn update(
        &mut self,
        ids: &mut RequestIds,
        id: &str,
        draft: &R::Draft,
    ) -> Result<(RequestId, Request), ClientError> {
        let operation =
            R::UPDATE.ok_or(ClientError::Unsupported { kind: R::KIND, operation: "update" })?;
        let request = R::update_request(id, draft)?;
        Ok(self.track(ids, operation, Mutation::Update { id: id.to_string() }, request))
    }

    /// First phase of a delete: check the target and enter `ConfirmPending`.
    ///
    /// Protected items are refused here, before any dialog or request. While
    /// another delete waits for confirmation nothing changes and
    /// [`ModalError::Busy`] is returned.
    pub fn request_delete(&mut self, id: &str, sentinel: &str) -> Result<R, ClientError> {
        if self.confirming.is_some() {
            return Err(ModalError::Busy.into());
        }

        let item = self
            .get(id)
            .cloned()
            .ok_or_else(|| ClientError::UnknownResource { kind: R::KIND, id: id.to_string() })?;

        if item.is_protected(sentinel) {
            return Err(ClientError::ProtectedAccount { username: item.label().to_string() });
        }

        self.confirming = Some(id.to_string());
        Ok(item)
    }

    /// Second phase of a delete after the user confirmed.
    pub fn confirm_delete(
        &mut self,
        ids: &mut RequestIds,
        id: &str,
    ) -> Result<(RequestId, Request), ClientError> {
        if self.confirming.as_deref() != Some(id) {
            return Err(ClientError::UnknownResource { kind: R::KIND, id: id.to_string() });
        }
        self.confirming = None;

        let request = bodyless(R::delete_endpoint(id.to_string()))?;
        Ok(self.track(ids, R::DELETE, Mutation::Delete { id: id.to_string() }, request))
    }

    /// Abort a delete that was not confirmed. Returns whether one was pending.
    pub fn cancel_delete(&mut self, id: &str) -> bool {
        if self.confirming.as_deref() == Some(id) {
            self.confirming = None;
            true
        } else {
            false
        }
    }

    fn track(
        &mut self,
        ids: &mut RequestIds,
        operation: Operation,
        mutation: Mutation,
        request: Request,
    ) -> (RequestId, Request) {
        let request_id = ids.allocate();
        tracing::debug!(kind = R::KIND, %request_id, ?mutation, "mutation issued");
        self.mutations.insert(request_id, (operation, mutation));
        (request_id, request)
    }

    /// Apply the result of a request issued by this controller.
    ///
    /// Returns `None` for request ids this controller does not track.
    pub fn handle_response(&mut self, request_id: RequestId, result: &CallResult) -> Option<Outcome> {
        if let Some(generation) = self.fetches.remove(&request_id) {
            return Some(self.apply_list(request_id, generation, result));
        }

        let (operation, mutation) = self.mutations.remove(&request_id)?;
        let outcome = match result {
            Ok(response) if response.is_success() => Outcome::Mutated { operation, mutation },
            _ => Outcome::MutationFailed { operation, mutation, error: classify(operation, result) },
        };
        Some(outcome)
    }

    fn apply_list(&mut self, request_id: RequestId, generation: u64, result: &CallResult) -> Outcome {
        if self.policy == SyncPolicy::LatestIssued && generation < self.applied {
            tracing::debug!(
                kind = R::KIND,
                %request_id,
                generation,
                applied = self.applied,
                "discarding stale list response"
            );
            return Outcome::Stale;
        }

        let decoded = match result {
            Ok(response) if response.is_success() => response.decode::<Vec<R>>("list").ok(),
            _ => None,
        };

        match decoded {
            Some(items) => {
                self.items = items;
                self.error = None;
                self.applied = generation;
                Outcome::Replaced { len: self.items.len() }
            },
            None => {
                let error = classify(R::FETCH, result);
                self.error = Some(error.clone());
                Outcome::FetchFailed(error)
            },
        }
    }

    /// Forget a request; a later response for it will be ignored.
    pub fn abandon(&mut self, request_id: RequestId) -> bool {
        self.fetches.remove(&request_id).is_some() || self.mutations.remove(&request_id).is_some()
    }

    /// Drop any unconfirmed delete.
    pub fn clear_confirmation(&mut self) {
        self.confirming = None;
    }

    /// Drop the collection and all bookkeeping.
    pub fn reset(&mut self) {
        self.items.clear();
        self.error = None;
        self.fetches.clear();
        self.mutations.clear();
        self.confirming = None;
        self.applied = self.issued;
    }
}
