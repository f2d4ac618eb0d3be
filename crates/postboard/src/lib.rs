//! Command-line client for postboard.
//!
//! Each invocation restores the session from the token file, runs one
//! command through the [`postboard_app::Runtime`] and exits. Dialogs the
//! client opens are answered on the terminal.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cli;
pub mod console;
pub mod error;
pub mod shell;

pub use cli::{Cli, Command, PostsCommand, UsersCommand};
pub use console::Console;
pub use error::CliError;
pub use shell::Shell;
