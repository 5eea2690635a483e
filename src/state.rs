//! Shared application state (ambient stack), following `src/state.rs`'s
//! `AppState` struct-with-`Clone` idiom — here wrapping the `Hub` in an `Arc`
//! since the hub's internals already guard themselves with locks.

use std::sync::Arc;

use crate::config::Config;
use crate::hub::Hub;

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<Hub>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(hub: Hub, config: Config) -> Self {
        Self {
            hub: Arc::new(hub),
            config: Arc::new(config),
        }
    }
}
