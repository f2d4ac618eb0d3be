//! Client
//!
//! Action-based client state machine for the postboard microblog backend.
//! Manages the bearer-token session, role-gated synchronization of the post
//! and user collections, and the confirmation/message dialog slot.
//!
//! # Architecture
//!
//! The client is Sans-IO. It receives events ([`ClientEvent`]), processes them
//! through pure state machine logic, and returns actions ([`ClientAction`]) for
//! the caller to execute. Outward calls are queued and collected with
//! [`Client::take_outgoing`]; their results are fed back as
//! [`ClientEvent::Response`].
//!
//! # Components
//!
//! - [`Client`]: Top-level state machine
//! - [`AuthSession`]: The single bearer token and claims derived from it
//! - [`ResourceController`]: One synchronized collection (posts or users)
//! - [`ModalCoordinator`]: Single-slot dialog sequencing
//! - [`classify`]: Failure classification and message composition

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod claims;
mod classify;
mod client;
mod config;
mod controller;
mod error;
mod event;
mod modal;
mod resource;
mod session;

pub use claims::{BearerToken, Claims, decode_claims};
pub use classify::{ActionMessages, ClassifiedError, ErrorKind, classify, messages};
pub use client::{Client, Continuation};
pub use config::{ClientConfig, DEFAULT_SENTINEL_ADMIN, SyncPolicy};
pub use controller::{ActionPhase, Mutation, Outcome, ResourceController};
pub use error::{ClientError, ModalError};
pub use event::{
    CallResult, ClientAction, ClientEvent, FollowUp, NoResponse, Operation, Outbound,
    Presentation, RequestId, RequestIds, Scope,
};
pub use modal::{
    MessageKind, ModalCoordinator, ModalId, ModalKind, ModalRequest, ModalResolution, Resolved,
};
pub use resource::{Resource, can_modify};
pub use session::{AuthSession, Restored};
