//! Feed comparator (C3): diffs two `ParsedFeed`s.
//!
//! Ported from `pushhub/models/topic.py::assemble_newest_entries` and the
//! `FeedComparator` exercised by `pushhub/tests/test_utils.py`.

use super::parser::{ParsedEntry, ParsedFeed};

pub struct FeedComparator<'a> {
    new: &'a ParsedFeed,
    past: &'a ParsedFeed,
}

impl<'a> FeedComparator<'a> {
    pub fn new(new: &'a ParsedFeed, past: &'a ParsedFeed) -> Self {
        Self { new, past }
    }

    /// Entries in `new` whose `id` does not appear in `past`, in `new`'s order.
    pub fn new_entries(&self) -> Vec<ParsedEntry> {
        self.new
            .entries
            .iter()
            .filter(|e| !self.past.entries.iter().any(|p| p.id == e.id))
            .cloned()
            .collect()
    }

    /// Entries present in both feeds whose `updated_parsed` advanced or
    /// whose `link` changed.
    ///
    /// If *both* conditions hold for the same entry it is pushed twice. This
    /// mirrors the source's two independent `if` checks, each of which
    /// appends the entry — a quirk `SPEC_FULL.md` §9 preserves rather than
    /// dedupes.
    pub fn updated_entries(&self) -> Vec<ParsedEntry> {
        let mut out = Vec::new();
        for e in &self.new.entries {
            let Some(p) = self.past.entries.iter().find(|p| p.id == e.id) else {
                continue;
            };
            let updated = matches!((e.updated_parsed, p.updated_parsed), (Some(n), Some(o)) if n > o);
            let link_changed = e.link != p.link;
            if updated {
                out.push(e.clone());
            }
            if link_changed {
                out.push(e.clone());
            }
        }
        out
    }

    /// Entries in `past` whose `id` is absent from `new`.
    pub fn removed_entries(&self) -> Vec<ParsedEntry> {
        self.past
            .entries
            .iter()
            .filter(|p| !self.new.entries.iter().any(|e| e.id == p.id))
            .cloned()
            .collect()
    }

    /// True if title, author, or metadata-key count changed between the
    /// two feeds.
    pub fn is_metadata_changed(&self) -> bool {
        self.new.feed.title != self.past.feed.title
            || self.new.feed.author != self.past.feed.author
            || self.new.feed.key_count() > self.past.feed.key_count()
    }

    /// A copy of whichever feed is authoritative for metadata (`new` if
    /// metadata changed, `past` otherwise) with its `entries` cleared.
    pub fn changed_metadata(&self) -> ParsedFeed {
        let source = if self.is_metadata_changed() { self.new } else { self.past };
        ParsedFeed {
            entries: Vec::new(),
            ..source.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::parser::FeedMeta;

    fn entry(id: &str, link: &str, updated_secs: i64) -> ParsedEntry {
        ParsedEntry {
            id: id.to_string(),
            title: Some(format!("title-{id}")),
            link: link.to_string(),
            updated_parsed: Some(chrono::DateTime::from_timestamp(updated_secs, 0).unwrap()),
            summary: None,
            tags: Vec::new(),
            content: Vec::new(),
            extra: Default::default(),
        }
    }

    fn feed(title: &str, entries: Vec<ParsedEntry>) -> ParsedFeed {
        ParsedFeed {
            bozo: false,
            version: "atom10".to_string(),
            feed: FeedMeta {
                title: title.to_string(),
                link: "http://example.com/".to_string(),
                ..Default::default()
            },
            entries,
        }
    }

    #[test]
    fn identical_feeds_produce_no_delta() {
        let past = feed("Feed", vec![entry("a", "http://x/a", 1)]);
        let new = past.clone();
        let cmp = FeedComparator::new(&new, &past);
        assert!(cmp.new_entries().is_empty());
        assert!(cmp.updated_entries().is_empty());
        assert!(cmp.removed_entries().is_empty());
        assert_eq!(cmp.changed_metadata().feed.title, past.feed.title);
    }

    #[test]
    fn detects_new_entry() {
        let past = feed("Feed", vec![entry("a", "http://x/a", 1)]);
        let new = feed("Feed", vec![entry("a", "http://x/a", 1), entry("b", "http://x/b", 2)]);
        let cmp = FeedComparator::new(&new, &past);
        let added = cmp.new_entries();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].id, "b");
    }

    #[test]
    fn detects_removed_entry() {
        let past = feed("Feed", vec![entry("a", "http://x/a", 1), entry("b", "http://x/b", 2)]);
        let new = feed("Feed", vec![entry("a", "http://x/a", 1)]);
        let cmp = FeedComparator::new(&new, &past);
        let removed = cmp.removed_entries();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, "b");
    }

    #[test]
    fn updated_timestamp_alone_counts_once() {
        let past = feed("Feed", vec![entry("a", "http://x/a", 1)]);
        let new = feed("Feed", vec![entry("a", "http://x/a", 99)]);
        let cmp = FeedComparator::new(&new, &past);
        assert_eq!(cmp.updated_entries().len(), 1);
    }

    #[test]
    fn link_change_alone_counts_once() {
        let past = feed("Feed", vec![entry("a", "http://x/a", 1)]);
        let new = feed("Feed", vec![entry("a", "http://x/new-a", 1)]);
        let cmp = FeedComparator::new(&new, &past);
        assert_eq!(cmp.updated_entries().len(), 1);
    }

    #[test]
    fn both_conditions_double_emit() {
        let past = feed("Feed", vec![entry("a", "http://x/a", 1)]);
        let new = feed("Feed", vec![entry("a", "http://x/new-a", 99)]);
        let cmp = FeedComparator::new(&new, &past);
        assert_eq!(cmp.updated_entries().len(), 2);
    }

    #[test]
    fn title_change_marks_metadata_changed() {
        let past = feed("Old Feed", vec![]);
        let new = feed("New Feed", vec![]);
        let cmp = FeedComparator::new(&new, &past);
        assert!(cmp.is_metadata_changed());
        assert_eq!(cmp.changed_metadata().feed.title, "New Feed");
        assert!(cmp.changed_metadata().entries.is_empty());
    }
}
