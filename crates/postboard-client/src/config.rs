//! Client configuration.

use std::{fmt, str::FromStr};

/// Default username of the undeletable super-admin account.
pub const DEFAULT_SENTINEL_ADMIN: &str = "admin";

/// How overlapping list reloads are reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncPolicy {
    /// Each reload is tagged with a generation; a response older than the
    /// newest applied one is discarded.
    #[default]
    LatestIssued,
    /// Every response is applied in arrival order, so the slowest reload
    /// wins regardless of when it was issued.
    LastArrival,
}

impl fmt::Display for SyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LatestIssued => "latest-issued",
            Self::LastArrival => "last-arrival",
        })
    }
}

impl FromStr for SyncPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest-issued" => Ok(Self::LatestIssued),
            "last-arrival" => Ok(Self::LastArrival),
            other => Err(format!("unknown sync policy '{other}'")),
        }
    }
}

/// Client state machine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Username of the account that can never be deleted.
    pub sentinel_admin: String,
    /// Reconciliation of overlapping reloads.
    pub sync_policy: SyncPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { sentinel_admin: DEFAULT_SENTINEL_ADMIN.to_string(), sync_policy: SyncPolicy::default() }
    }
}
