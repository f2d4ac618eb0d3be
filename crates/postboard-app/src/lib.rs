//! Application layer for postboard
//!
//! Async runtime and I/O adapters for the Sans-IO [`postboard_client::Client`].
//! The same [`Runtime`] runs in production over HTTP and in tests over the
//! simulated transport.
//!
//! # Components
//!
//! - [`Runtime`]: Drives the client, executes its actions
//! - [`Transport`]: Trait for outward calls
//! - [`TokenStore`]: Trait for the persisted token slot
//! - [`HttpTransport`]: reqwest-based transport (feature `http`)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
#[cfg(feature = "http")]
mod http;
mod runtime;
mod store;
mod transport;

pub use config::{AppConfig, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
pub use error::{RuntimeError, StoreError, TransportError};
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use runtime::Runtime;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, default_token_path};
pub use transport::Transport;
