//! Listener (C6): an operational callback URL notified whenever *any* topic
//! changes, independent of the PuSH subscription graph.
//!
//! Ported from `pushhub/models/listener.py::Listener`.

use std::collections::BTreeSet;

use crate::error::HubError;

#[derive(Debug, Clone)]
pub struct Listener {
    pub callback_url: String,
    pub topics: BTreeSet<String>,
}

impl Listener {
    /// Constructs a new listener, validating `callback_url` (per §4.6 —
    /// "Listener constructor likewise" [validates]).
    pub fn new(callback_url: &str) -> Result<Self, HubError> {
        if !crate::url_util::is_valid_url(callback_url) {
            return Err(HubError::InvalidUrl(callback_url.to_string()));
        }
        Ok(Self {
            callback_url: callback_url.to_string(),
            topics: BTreeSet::new(),
        })
    }

    pub fn add_topic(&mut self, topic_url: &str) {
        self.topics.insert(topic_url.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_topic_is_idempotent() {
        let mut l = Listener::new("http://listener.example.com/hook").unwrap();
        l.add_topic("http://example.com/feed");
        l.add_topic("http://example.com/feed");
        assert_eq!(l.topics.len(), 1);
    }

    #[test]
    fn construction_rejects_invalid_url() {
        assert!(Listener::new("not-a-url").is_err());
    }
}
