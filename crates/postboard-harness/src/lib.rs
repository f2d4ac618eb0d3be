//! Deterministic simulation harness for postboard testing.
//!
//! - [`SimBackend`]: In-memory server with the production authorization rules
//! - [`SimTransport`]: Recording transport with manual release and injected
//!   network failures
//! - [`SimDriver`]: Synchronous driver for the Sans-IO client
//! - [`mint_token`]: Tokens in the backend's format

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod driver;
mod token;
mod transport;

pub use backend::SimBackend;
pub use driver::SimDriver;
pub use token::{SIM_SIGNATURE, corrupt_token, mint_token};
pub use transport::SimTransport;
