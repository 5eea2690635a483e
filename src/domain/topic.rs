//! Topic (C5): the per-URL aggregate tracking fetched content and subscribers.
//!
//! Ported from `pushhub/models/topic.py::Topic`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::error::HubError;
use crate::feed::{self, FeedComparator, ParsedFeed};

#[derive(Debug, Clone)]
pub struct Topic {
    pub url: String,
    pub content: Vec<u8>,
    pub content_type: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub last_pinged: Option<DateTime<Utc>>,
    pub changed: bool,
    pub failed: bool,
    pub subscribers: BTreeSet<String>,
    pub subscriber_count: usize,
}

/// What a successful fetch GET returned, handed to `Topic::apply_fetch`.
pub struct FetchResult {
    pub body: Vec<u8>,
}

impl Topic {
    /// Constructs a new topic, validating `url` and pinging it immediately
    /// (the source does both in `Topic.__init__`).
    pub fn new(url: &str) -> Result<Self, HubError> {
        if !crate::url_util::is_valid_url(url) {
            return Err(HubError::InvalidUrl(url.to_string()));
        }
        let mut topic = Self {
            url: url.to_string(),
            content: Vec::new(),
            content_type: String::new(),
            timestamp: None,
            last_pinged: None,
            changed: false,
            failed: false,
            subscribers: BTreeSet::new(),
            subscriber_count: 0,
        };
        topic.ping();
        Ok(topic)
    }

    /// Registers the last time a publisher pinged the hub for this topic.
    pub fn ping(&mut self) {
        self.last_pinged = Some(Utc::now());
    }

    /// Applies the body of a successful content GET: parses it, diffs
    /// against the previously stored content (if any), regenerates the
    /// canonical feed when something changed, and updates bookkeeping
    /// fields. Leaves `content`/`timestamp` untouched on parse failure.
    pub fn apply_fetch(&mut self, fetched: FetchResult) -> Result<(), HubError> {
        // Cleared as soon as we have *any* response, mirroring the source's
        // `self.failed = False` right after `requests.get` returns but
        // before the body is parsed — a subsequent parse failure still
        // leaves `failed` cleared.
        self.failed = false;

        let parsed = feed::parse(&fetched.body);
        let parsed = match parsed {
            Some(p) if !p.bozo => p,
            _ => return Err(HubError::InvalidContent(self.url.clone())),
        };

        let new_content = if self.content.is_empty() {
            self.changed = true;
            fetched.body.clone()
        } else {
            let past = feed::parse(&self.content).filter(|p| !p.bozo);
            match past {
                Some(past) => self.assemble_newest_entries(&parsed, &past, &fetched.body),
                None => fetched.body.clone(),
            }
        };

        if self.content_type.is_empty() {
            self.content_type = parsed.version.clone();
        }
        self.content = new_content;
        self.timestamp = Some(Utc::now());
        Ok(())
    }

    /// Marks the topic as unreachable. Called instead of `apply_fetch` when
    /// the content GET could not connect at all.
    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    fn assemble_newest_entries(&mut self, new: &ParsedFeed, past: &ParsedFeed, raw_body: &[u8]) -> Vec<u8> {
        let cmp = FeedComparator::new(new, past);
        let mut all_entries = cmp.new_entries();
        all_entries.extend(cmp.updated_entries());
        let metadata_changed = cmp.is_metadata_changed();

        if all_entries.is_empty() && !metadata_changed {
            return raw_body.to_vec();
        }
        self.changed = true;

        all_entries.sort_by(|a, b| b.updated_parsed.cmp(&a.updated_parsed));
        let metadata = cmp.changed_metadata();
        feed::generator::generate(&metadata.feed, &all_entries)
    }

    /// Adds `callback_url` to the subscriber set. A no-op if already present
    /// (idempotent re-subscribe, per I5).
    pub fn add_subscriber(&mut self, callback_url: &str) {
        if self.subscribers.insert(callback_url.to_string()) {
            self.subscriber_count += 1;
        }
    }

    /// Removes `callback_url` from the subscriber set.
    pub fn remove_subscriber(&mut self, callback_url: &str) -> Result<(), HubError> {
        if !self.subscribers.remove(callback_url) {
            return Err(HubError::NotFound("subscriber", callback_url.to_string()));
        }
        self.subscriber_count = self.subscriber_count.saturating_sub(1);
        Ok(())
    }

    /// Maps `content_type` onto the MIME type used for delivery headers.
    pub fn mime_type(&self) -> Result<&'static str, HubError> {
        if self.content_type.contains("atom") {
            Ok("application/atom+xml")
        } else if self.content_type.contains("rss") {
            Ok("application/rss+xml")
        } else {
            Err(HubError::UnsupportedContentType(self.content_type.clone()))
        }
    }
}
