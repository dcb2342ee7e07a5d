//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to deserialize environment variables into a type-safe struct.

use serde::Deserialize;

use crate::lifecycle::{
    AuthorizationMode, DEFAULT_HISTORY_LIMIT, DuplicateRequestMode, LifecyclePolicy,
};

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (optional): PostgreSQL connection string. Without it the
///   server keeps sites in memory.
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 20
/// - `DATABASE_ACQUIRE_TIMEOUT_SECS` (optional): defaults to 10
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 10000
/// - `HISTORY_LIMIT` (optional): entries kept per ledger, defaults to 50
/// - `AUTHORIZATION_MODE` (optional): `advisory` or `enforced`
/// - `DUPLICATE_REQUEST_MODE` (optional): `overwrite` or `reject`
/// - `MAX_BODY_BYTES` (optional): request body limit, defaults to 50 MiB
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_acquire_timeout_secs")]
    pub database_acquire_timeout_secs: u64,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default)]
    pub authorization_mode: AuthorizationMode,

    #[serde(default)]
    pub duplicate_request_mode: DuplicateRequestMode,

    /// Visitor and key photos travel inline as data URLs
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_max_connections() -> u32 {
    20
}

fn default_acquire_timeout_secs() -> u64 {
    10
}

fn default_port() -> u16 {
    10000
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

/// Request body limit when `MAX_BODY_BYTES` is unset (50 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Loads an optional `.env` file first, then reads the process
    /// environment. Field names map to upper-case variables:
    /// `history_limit` -> `HISTORY_LIMIT`.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>()
    }

    /// Reject values that parse but cannot work.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.history_limit >= 1, "HISTORY_LIMIT must be at least 1");
        anyhow::ensure!(
            self.database_max_connections >= 1,
            "DATABASE_MAX_CONNECTIONS must be at least 1"
        );
        anyhow::ensure!(self.server_port != 0, "SERVER_PORT must not be 0");
        Ok(())
    }

    pub fn lifecycle_policy(&self) -> LifecyclePolicy {
        LifecyclePolicy {
            history_limit: self.history_limit,
            authorization: self.authorization_mode,
            duplicate_requests: self.duplicate_request_mode,
        }
    }
}
