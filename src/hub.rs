//! Hub orchestration (C7): the stateless coordination layer tying the
//! store, HTTP gateway, and notify queue together.
//!
//! Ported from `pushhub/models/hub.py::Hub`. Per `SPEC_FULL.md` §5, every
//! method here that talks to the network does so *outside* any store lock:
//! each method reads what it needs from the store, awaits the network call,
//! then writes the outcome back in a second, independent store access.

use rand::Rng;

use crate::domain::FetchResult;
use crate::error::HubError;
use crate::http_client::{FetchOutcome, HttpGateway};
use crate::queue::{NotifyQueue, DEFAULT_MAX_TRIES};
use crate::store::Store;

const CHALLENGE_LEN: usize = 128;
const CHALLENGE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub struct Hub {
    pub store: Store,
    pub http: HttpGateway,
    pub queue: NotifyQueue,
    /// The hub's own externally-visible URL, used in the `User-Agent` of
    /// content fetches (mirroring `Topic.fetch`'s `"PuSH Hub (+%s; %s)"`).
    pub self_url: String,
}

impl Hub {
    pub fn new(store: Store, http: HttpGateway, queue: NotifyQueue, self_url: String) -> Self {
        Self { store, http, queue, self_url }
    }

    /// Registers (or re-pings) a topic as published. Does not itself fetch
    /// content; callers follow up with `fetch_content`/`fetch_all_content`.
    pub fn publish(&self, topic_url: &str) -> Result<(), HubError> {
        self.store.update_topic(topic_url, |topic| topic.ping())?;
        Ok(())
    }

    /// Generates a random 128-character alphanumeric challenge string, per
    /// `Hub.get_challenge_string`.
    pub fn challenge_string(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..CHALLENGE_LEN)
            .map(|_| CHALLENGE_ALPHABET[rng.gen_range(0..CHALLENGE_ALPHABET.len())] as char)
            .collect()
    }

    /// Issues the subscriber-facing verification `GET` for `mode`
    /// ("subscribe" or "unsubscribe") and reports whether it echoed the
    /// challenge back.
    pub async fn verify_subscription(&self, callback_url: &str, topic_url: &str, mode: &str) -> Result<bool, HubError> {
        let challenge = self.challenge_string();
        self.http.verify_subscription(callback_url, mode, topic_url, &challenge, None).await
    }

    /// Subscribes `callback_url` to `topic_url`, verifying first unless
    /// `verify_callbacks` is false (tests only; the HTTP façade always
    /// verifies).
    pub async fn subscribe(&self, callback_url: &str, topic_url: &str, verify_callbacks: bool) -> Result<bool, HubError> {
        self.store.get_or_create_topic(topic_url)?;
        self.store.get_or_create_subscriber(callback_url)?;

        let verified = if verify_callbacks {
            self.verify_subscription(callback_url, topic_url, "subscribe").await?
        } else {
            true
        };

        if verified {
            self.store.update_subscriber(callback_url, |s| s.add_topic(topic_url))?;
            self.store.update_topic(topic_url, |t| t.add_subscriber(callback_url))?;
        }
        Ok(verified)
    }

    /// Unsubscribes `callback_url` from `topic_url`, verifying the intent
    /// with the subscriber first.
    pub async fn unsubscribe(&self, callback_url: &str, topic_url: &str) -> Result<bool, HubError> {
        self.store.get_or_create_topic(topic_url)?;
        self.store.get_or_create_subscriber(callback_url)?;

        let verified = self.verify_subscription(callback_url, topic_url, "unsubscribe").await?;
        if verified {
            self.store.update_subscriber(callback_url, |s| {
                s.remove_topic(topic_url);
            })?;
            // Already-removed subscriptions are tolerated, matching the
            // source's `except KeyError: pass`. The Subscriber record itself
            // persists with an empty topic set, matching
            // `pushhub/models/subscriber.py`, which never removes a
            // Subscriber from its Folder.
            let _ = self.store.update_topic(topic_url, |t| t.remove_subscriber(callback_url));
        }
        Ok(verified)
    }

    /// Fetches and applies fresh content for every known topic, or only
    /// those currently marked `failed` when `only_failed` is true.
    pub async fn fetch_all_content(&self, only_failed: bool) {
        let topics = self.store.all_topics();
        let urls: Vec<String> = topics
            .into_iter()
            .filter(|t| !only_failed || t.failed)
            .map(|t| t.url)
            .collect();
        self.fetch_content(&urls).await;
    }

    /// Fetches and applies fresh content for each of `topic_urls`. Unknown
    /// URLs are skipped, matching the source's `self.topics.get(url, None)`
    /// followed by a `continue`.
    pub async fn fetch_content(&self, topic_urls: &[String]) {
        for topic_url in topic_urls {
            if self.store.get_topic(topic_url).is_none() {
                continue;
            }
            self.fetch_one(topic_url).await;
        }
    }

    async fn fetch_one(&self, topic_url: &str) {
        let subscriber_count = self.store.get_topic(topic_url).map(|t| t.subscriber_count).unwrap_or(0);
        match self.http.fetch_topic(topic_url, &self.self_url, subscriber_count).await {
            FetchOutcome::Ok { body } => {
                // A response (any status) still goes to the parser; a parse
                // failure surfaces as `InvalidContentError` and is swallowed
                // here, per `fetch_content`'s per-topic error absorption.
                let _ = self.store.update_topic(topic_url, |topic| topic.apply_fetch(FetchResult { body }));
            }
            FetchOutcome::Unreachable => {
                let _ = self.store.update_topic(topic_url, |topic| topic.mark_failed());
            }
        }
    }

    /// Enqueues a notification job for every subscriber of `topic_url`,
    /// provided the topic has pending changes, then clears the changed
    /// flag. Mirrors `Topic.notify_subscribers`; the actual delivery is
    /// performed later by draining the queue (`queue::drain`).
    pub fn notify_subscribers(&self, topic_url: &str) -> Result<(), HubError> {
        let topic = match self.store.get_topic(topic_url) {
            Some(t) => t,
            None => return Ok(()),
        };
        if topic.subscribers.is_empty() || !topic.changed {
            return Ok(());
        }
        let content_type = topic.mime_type()?;
        for subscriber_url in &topic.subscribers {
            self.queue
                .enqueue(topic_url, subscriber_url, &topic.content, content_type, DEFAULT_MAX_TRIES)
                .map_err(|e| HubError::BadRequest(e.to_string()))?;
        }
        self.store.update_topic(topic_url, |t| t.changed = false)?;
        Ok(())
    }

    /// Runs `notify_subscribers` for every known topic, per
    /// `Hub.notify_subscribers`.
    pub fn notify_all_subscribers(&self) -> Result<(), HubError> {
        for topic in self.store.all_topics() {
            self.notify_subscribers(&topic.url)?;
        }
        Ok(())
    }

    /// Registers `callback_url` as a listener of every currently-known
    /// topic, notifying it of each one's current state immediately.
    /// Mirrors `Hub.register_listener`.
    pub async fn register_listener(&self, callback_url: &str) -> Result<(), HubError> {
        self.store.get_or_create_listener(callback_url)?;
        let topics = self.store.all_topics();
        for topic in &topics {
            let is_new = self
                .store
                .update_listener(callback_url, |l| !l.topics.contains(&topic.url) && { l.add_topic(&topic.url); true })?;
            if is_new {
                self.http.notify_listener(callback_url, &topic.url).await;
            }
        }
        Ok(())
    }

    /// Notifies every listener registered against `topic_url` (or
    /// registered against all topics) that it changed. Mirrors
    /// `Hub.notify_listeners`.
    pub async fn notify_listeners(&self, topic_url: &str) -> Result<(), HubError> {
        for listener in self.store.listeners_unaware_of(topic_url) {
            self.store.update_listener(&listener.callback_url, |l| l.add_topic(topic_url))?;
            self.http.notify_listener(&listener.callback_url, topic_url).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_hub() -> Hub {
        Hub::new(
            Store::new(),
            HttpGateway::new(reqwest::Client::new()),
            NotifyQueue::in_memory().unwrap(),
            "http://hub.example.com/".to_string(),
        )
    }

    #[test]
    fn challenge_string_is_128_alnum_chars() {
        let hub = test_hub();
        let challenge = hub.challenge_string();
        assert_eq!(challenge.len(), CHALLENGE_LEN);
        assert!(challenge.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn subscribe_without_verification_adds_subscriber() {
        let hub = test_hub();
        let ok = hub.subscribe("http://sub/cb", "http://example.com/feed", false).await.unwrap();
        assert!(ok);
        let topic = hub.store.get_topic("http://example.com/feed").unwrap();
        assert_eq!(topic.subscriber_count, 1);
    }

    #[tokio::test]
    async fn subscribe_rejects_invalid_callback_url() {
        let hub = test_hub();
        let err = hub.subscribe("not-a-url", "http://example.com/feed", false).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn register_listener_rejects_invalid_callback_url() {
        let hub = test_hub();
        assert!(hub.register_listener("not-a-url").await.is_err());
    }

    #[test]
    fn publish_pings_topic() {
        let hub = test_hub();
        hub.publish("http://example.com/feed").unwrap();
        let topic = hub.store.get_topic("http://example.com/feed").unwrap();
        assert!(topic.last_pinged.is_some());
    }

    #[test]
    fn notify_subscribers_skips_unchanged_topic() {
        let hub = test_hub();
        hub.store.update_topic("http://example.com/feed", |t| t.add_subscriber("http://sub/cb")).unwrap();
        hub.notify_subscribers("http://example.com/feed").unwrap();
        assert!(hub.queue.is_empty().unwrap());
    }

    #[test]
    fn listener_already_tracking_other_topics_still_sees_a_new_one() {
        // Regression test: a listener that has already learned about one
        // topic must still be selected for notification about a second,
        // distinct topic it hasn't seen yet.
        let hub = test_hub();
        hub.store.update_listener("http://listener/a", |l| l.add_topic("http://example.com/already-known")).unwrap();
        let unaware = hub.store.listeners_unaware_of("http://example.com/new-topic");
        assert_eq!(unaware.len(), 1);
        assert_eq!(unaware[0].callback_url, "http://listener/a");
    }
}
