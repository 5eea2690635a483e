//! Environment configuration (ambient stack), read via `dotenvy` + `env::var`
//! the way `src/main.rs` reads `RPC_URL`/`RPC_USER`/etc.

use std::net::SocketAddr;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// The hub's own externally-visible base URL, used for the
    /// `User-Agent` header on content fetches and as a stable identifier
    /// passed to subscribers.
    pub self_url: String,
    pub notify_queue_db: String,
    pub log_level: String,
}

impl Config {
    /// Reads configuration from the process environment, applying the same
    /// defaults the hub ships with in development.
    pub fn from_env() -> Result<Self> {
        let bind_addr: SocketAddr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
            .parse()
            .context("BIND_ADDR must be host:port")?;
        let self_url = std::env::var("HUB_URL").unwrap_or_else(|_| format!("http://{bind_addr}/"));
        let notify_queue_db = std::env::var("NOTIFY_QUEUE_DB").unwrap_or_else(|_| "./db/notify_queue.db".to_string());
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self { bind_addr, self_url, notify_queue_db, log_level })
    }
}
