//! Command-line arguments.

use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use postboard_app::{AppConfig, DEFAULT_BASE_URL};
use postboard_client::{ClientConfig, DEFAULT_SENTINEL_ADMIN, SyncPolicy};

/// Postboard microblog client
#[derive(Parser, Debug)]
#[command(name = "postboard")]
#[command(about = "Command-line client for the postboard microblog")]
#[command(version)]
pub struct Cli {
    /// Server root; endpoint paths are appended to it
    #[arg(long, env = "POSTBOARD_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Token file (defaults to ~/.postboard/access_token)
    #[arg(long, env = "POSTBOARD_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,

    /// Username of the account that can never be deleted
    #[arg(long, default_value = DEFAULT_SENTINEL_ADMIN)]
    pub sentinel_admin: String,

    /// How overlapping reloads are reconciled (latest-issued, last-arrival)
    #[arg(long, default_value_t = SyncPolicy::LatestIssued)]
    pub sync_policy: SyncPolicy,

    /// Timeout for one call, in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Application configuration selected by the flags.
    pub fn config(&self) -> AppConfig {
        AppConfig {
            base_url: self.api_url.clone(),
            token_path: self.token_file.clone(),
            request_timeout: Duration::from_secs(self.timeout),
            client: ClientConfig {
                sentinel_admin: self.sentinel_admin.clone(),
                sync_policy: self.sync_policy,
            },
        }
    }
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a session and store its token
    Login {
        /// Login name
        username: String,
        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account
    Register {
        /// Login name
        username: String,
        /// Password (prompted for twice when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// End the session and forget the stored token
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Read and write posts
    #[command(subcommand)]
    Posts(PostsCommand),

    /// Manage accounts (admin only)
    #[command(subcommand)]
    Users(UsersCommand),
}

/// Post commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum PostsCommand {
    /// List posts, newest first
    List,

    /// Publish a post
    Add {
        /// Post body
        content: String,
    },

    /// Replace a post's body
    Edit {
        /// Post identifier
        id: String,
        /// New body
        content: String,
    },

    /// Delete a post
    Delete {
        /// Post identifier
        id: String,
    },
}

/// User commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum UsersCommand {
    /// List accounts
    List,

    /// Delete an account
    Delete {
        /// User identifier
        id: String,
    },
}
