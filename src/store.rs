//! In-memory document store (C10).
//!
//! `pushhub` backs its models with a ZODB-style object database where
//! `Topic`, `Subscriber`, and `Listener` hold live references to each other
//! (`topic.subscribers` is a set of `Subscriber` objects, not URLs).
//! `SPEC_FULL.md` §6.3/§9 flags that cyclic ownership as unnecessary for a
//! from-scratch design: here each side of a relationship stores only the
//! other side's URL string, and the three "folders" are flat maps guarded by
//! one mutex apiece. Callers read/mutate through short-lived closures so no
//! lock is ever held across an `.await`.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::domain::{Listener, Subscriber, Topic};
use crate::error::HubError;

/// One folder of the document store: a map from the entity's own URL to the
/// entity itself.
#[derive(Default)]
struct Folder<T> {
    items: Mutex<BTreeMap<String, T>>,
}

impl<T> Folder<T> {
    fn with<R>(&self, f: impl FnOnce(&mut BTreeMap<String, T>) -> R) -> R {
        let mut guard = self.items.lock().expect("store mutex poisoned");
        f(&mut guard)
    }
}

/// The hub's in-process document store: three folders of topics,
/// subscribers, and listeners. Cheap to construct; cloning a `Store` handle
/// shares the same underlying folders via `Arc` at the `AppState` layer.
#[derive(Default)]
pub struct Store {
    topics: Folder<Topic>,
    subscribers: Folder<Subscriber>,
    listeners: Folder<Listener>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the topic for `url`, creating and inserting one (via
    /// `Topic::new`, which pings it) if absent.
    pub fn get_or_create_topic(&self, url: &str) -> Result<Topic, HubError> {
        self.topics.with(|topics| {
            if let Some(t) = topics.get(url) {
                return Ok(t.clone());
            }
            let topic = Topic::new(url)?;
            topics.insert(url.to_string(), topic.clone());
            Ok(topic)
        })
    }

    pub fn get_topic(&self, url: &str) -> Option<Topic> {
        self.topics.with(|topics| topics.get(url).cloned())
    }

    pub fn all_topics(&self) -> Vec<Topic> {
        self.topics.with(|topics| topics.values().cloned().collect())
    }

    /// Runs `mutate` against the stored topic for `url` (creating it first
    /// if absent) and persists the result. The closure never touches the
    /// network; it is the "transaction" in the scoped-acquisition sense.
    pub fn update_topic<R>(&self, url: &str, mutate: impl FnOnce(&mut Topic) -> R) -> Result<R, HubError> {
        self.topics.with(|topics| {
            let topic = match topics.get_mut(url) {
                Some(t) => t,
                None => {
                    let created = Topic::new(url)?;
                    topics.entry(url.to_string()).or_insert(created)
                }
            };
            Ok(mutate(topic))
        })
    }

    pub fn get_or_create_subscriber(&self, callback_url: &str) -> Result<Subscriber, HubError> {
        self.subscribers.with(|subs| {
            if let Some(s) = subs.get(callback_url) {
                return Ok(s.clone());
            }
            let sub = Subscriber::new(callback_url)?;
            subs.insert(callback_url.to_string(), sub.clone());
            Ok(sub)
        })
    }

    pub fn get_subscriber(&self, callback_url: &str) -> Option<Subscriber> {
        self.subscribers.with(|subs| subs.get(callback_url).cloned())
    }

    pub fn update_subscriber<R>(&self, callback_url: &str, mutate: impl FnOnce(&mut Subscriber) -> R) -> Result<R, HubError> {
        self.subscribers.with(|subs| {
            let sub = match subs.get_mut(callback_url) {
                Some(s) => s,
                None => {
                    let created = Subscriber::new(callback_url)?;
                    subs.entry(callback_url.to_string()).or_insert(created)
                }
            };
            Ok(mutate(sub))
        })
    }

    pub fn get_or_create_listener(&self, callback_url: &str) -> Result<Listener, HubError> {
        self.listeners.with(|listeners| {
            if let Some(l) = listeners.get(callback_url) {
                return Ok(l.clone());
            }
            let listener = Listener::new(callback_url)?;
            listeners.insert(callback_url.to_string(), listener.clone());
            Ok(listener)
        })
    }

    pub fn update_listener<R>(&self, callback_url: &str, mutate: impl FnOnce(&mut Listener) -> R) -> Result<R, HubError> {
        self.listeners.with(|listeners| {
            let l = match listeners.get_mut(callback_url) {
                Some(l) => l,
                None => {
                    let created = Listener::new(callback_url)?;
                    listeners.entry(callback_url.to_string()).or_insert(created)
                }
            };
            Ok(mutate(l))
        })
    }

    pub fn all_listeners(&self) -> Vec<Listener> {
        self.listeners.with(|listeners| listeners.values().cloned().collect())
    }

    /// Listeners that do not yet know about `topic_url`, per `Hub.notify_listeners`'s
    /// "for each (topic, listener) pair where listener doesn't yet know the
    /// topic, link and notify" rule. A listener whose `topics` set is empty
    /// (brand new, nothing registered yet) is included, same as one that
    /// already tracks other topics but not this one.
    pub fn listeners_unaware_of(&self, topic_url: &str) -> Vec<Listener> {
        self.listeners.with(|listeners| {
            listeners
                .values()
                .filter(|l| !l.topics.contains(topic_url))
                .cloned()
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_topic_is_stable() {
        let store = Store::new();
        let a = store.get_or_create_topic("http://example.com/feed").unwrap();
        let b = store.get_or_create_topic("http://example.com/feed").unwrap();
        assert_eq!(a.last_pinged, b.last_pinged);
    }

    #[test]
    fn update_topic_persists_mutation() {
        let store = Store::new();
        store
            .update_topic("http://example.com/feed", |t| t.add_subscriber("http://sub/cb"))
            .unwrap();
        let topic = store.get_topic("http://example.com/feed").unwrap();
        assert_eq!(topic.subscriber_count, 1);
    }

    #[test]
    fn subscriber_persists_after_last_topic_removed() {
        let store = Store::new();
        store.update_subscriber("http://sub/cb", |s| s.add_topic("http://example.com/feed")).unwrap();
        let before = store.get_subscriber("http://sub/cb").unwrap();
        store
            .update_subscriber("http://sub/cb", |s| {
                s.remove_topic("http://example.com/feed");
            })
            .unwrap();
        let after = store.get_subscriber("http://sub/cb").unwrap();
        assert!(!after.is_subscribed_to_anything());
        assert_eq!(before.created_date, after.created_date);
    }

    #[test]
    fn listeners_unaware_of_excludes_already_notified() {
        let store = Store::new();
        store.update_listener("http://listener/a", |l| l.add_topic("http://example.com/feed")).unwrap();
        store.get_or_create_listener("http://listener/b").unwrap();
        let unaware = store.listeners_unaware_of("http://example.com/feed");
        assert_eq!(unaware.len(), 1);
        assert_eq!(unaware[0].callback_url, "http://listener/b");
    }

    #[test]
    fn listeners_unaware_of_includes_listeners_tracking_other_topics() {
        let store = Store::new();
        store.update_listener("http://listener/a", |l| l.add_topic("http://example.com/other-feed")).unwrap();
        let unaware = store.listeners_unaware_of("http://example.com/feed");
        assert_eq!(unaware.len(), 1);
    }
}
