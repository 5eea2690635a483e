//! Subscriber (C6): a callback URL subscribed to one or more topics.
//!
//! Ported from `pushhub/models/subscriber.py::Subscriber`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::error::HubError;

#[derive(Debug, Clone)]
pub struct Subscriber {
    pub callback_url: String,
    pub topics: BTreeSet<String>,
    pub created_date: DateTime<Utc>,
}

impl Subscriber {
    /// Constructs a new subscriber, validating `callback_url` (per §4.6 —
    /// "Subscriber constructor validates callback_url").
    pub fn new(callback_url: &str) -> Result<Self, HubError> {
        if !crate::url_util::is_valid_url(callback_url) {
            return Err(HubError::InvalidUrl(callback_url.to_string()));
        }
        Ok(Self {
            callback_url: callback_url.to_string(),
            topics: BTreeSet::new(),
            created_date: Utc::now(),
        })
    }

    /// Adds `topic_url` to the subscribed set. Idempotent.
    pub fn add_topic(&mut self, topic_url: &str) {
        self.topics.insert(topic_url.to_string());
    }

    /// Removes `topic_url`, returning whether it was actually present.
    pub fn remove_topic(&mut self, topic_url: &str) -> bool {
        self.topics.remove(topic_url)
    }

    pub fn is_subscribed_to_anything(&self) -> bool {
        !self.topics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_subscriber_has_no_topics() {
        let s = Subscriber::new("http://sub.example.com/callback").unwrap();
        assert!(!s.is_subscribed_to_anything());
    }

    #[test]
    fn construction_rejects_invalid_url() {
        assert!(Subscriber::new("not-a-url").is_err());
    }

    #[test]
    fn add_topic_is_idempotent() {
        let mut s = Subscriber::new("http://sub.example.com/callback").unwrap();
        s.add_topic("http://example.com/feed");
        s.add_topic("http://example.com/feed");
        assert_eq!(s.topics.len(), 1);
    }

    #[test]
    fn remove_topic_reports_presence() {
        let mut s = Subscriber::new("http://sub.example.com/callback").unwrap();
        assert!(!s.remove_topic("http://example.com/feed"));
        s.add_topic("http://example.com/feed");
        assert!(s.remove_topic("http://example.com/feed"));
        assert!(!s.is_subscribed_to_anything());
    }
}
