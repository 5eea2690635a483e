//! Feed generator (C4): renders a `ParsedFeed` metadata shell plus an
//! ordered entry list as canonical Atom 1.0 bytes.
//!
//! Ported from `pushhub/models/topic.py::generate_feed`. The builder API
//! shape (`FeedBuilder`/`EntryBuilder`/`TextBuilder`/...) follows
//! `examples/other_examples/.../web/feed.rs` (ClaudetteTheGreat-dumpster).

use atom_syndication::{ContentBuilder, EntryBuilder, FeedBuilder, LinkBuilder, PersonBuilder, TextBuilder};
use chrono::{DateTime, Utc};

use super::parser::{FeedMeta, ParsedEntry};

const DEFAULT_AUTHOR: &str = "Hub Aggregator";

/// Renders `meta` (feed-level metadata, entries ignored) plus `entries` as a
/// canonical Atom 1.0 document.
pub fn generate(meta: &FeedMeta, entries: &[ParsedEntry]) -> Vec<u8> {
    let self_link = meta
        .links
        .iter()
        .find(|l| l.rel.as_deref() == Some("self"))
        .map(|l| l.href.clone())
        .unwrap_or_else(|| meta.link.clone());

    let author_name = meta.author.clone().unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

    let mut latest_updated: Option<DateTime<Utc>> = None;
    let mut built_entries = Vec::with_capacity(entries.len());

    for entry in entries {
        // Entries missing a title are dropped, matching the source's
        // `try: entry['title'] except KeyError: continue`.
        let Some(title) = entry.title.as_ref() else {
            continue;
        };
        let updated = entry.updated_parsed.unwrap_or_else(Utc::now);
        if latest_updated.is_none_or(|cur| updated > cur) {
            latest_updated = Some(updated);
        }

        let mut builder = EntryBuilder::default();
        builder
            .id(entry.id.clone())
            .title(TextBuilder::default().value(title.clone()).build())
            .link(LinkBuilder::default().href(entry.link.clone()).rel("alternate".to_string()).build())
            .updated(updated.fixed_offset())
            .published(Some(updated.fixed_offset()));

        if let Some(summary) = entry.summary.as_ref() {
            builder.summary(Some(TextBuilder::default().value(summary.clone()).build()));
        }
        if let Some(content) = entry.content.first() {
            builder.content(Some(
                ContentBuilder::default()
                    .value(Some(content.value.clone()))
                    .content_type(content.content_type.clone())
                    .build(),
            ));
        }
        if let Some(author) = entry.extra.get("author_name") {
            builder.authors(vec![PersonBuilder::default().name(author.clone()).build()]);
        }
        if !entry.tags.is_empty() {
            builder.categories(
                entry
                    .tags
                    .iter()
                    .map(|t| atom_syndication::CategoryBuilder::default().term(t.clone()).build())
                    .collect::<Vec<_>>(),
            );
        }

        built_entries.push(builder.build());
    }

    let feed = FeedBuilder::default()
        .id(self_link.clone())
        .title(TextBuilder::default().value(meta.title.clone()).build())
        .link(LinkBuilder::default().href(self_link.clone()).rel("self".to_string()).build())
        .link(LinkBuilder::default().href(meta.link.clone()).rel("alternate".to_string()).build())
        .authors(vec![PersonBuilder::default().name(author_name).build()])
        .updated(latest_updated.unwrap_or_else(Utc::now).fixed_offset())
        .entries(built_entries)
        .build();

    feed.to_string().into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::parser::EntryContent;

    fn meta() -> FeedMeta {
        FeedMeta {
            title: "Example Feed".to_string(),
            link: "http://example.com/".to_string(),
            links: vec![super::super::parser::FeedLink {
                rel: Some("self".to_string()),
                href: "http://example.com/feed.atom".to_string(),
            }],
            author: None,
            extra: Default::default(),
        }
    }

    fn entry_with_title(id: &str, title: Option<&str>) -> ParsedEntry {
        ParsedEntry {
            id: id.to_string(),
            title: title.map(str::to_string),
            link: format!("http://example.com/{id}"),
            updated_parsed: Some(Utc::now()),
            summary: Some("summary text".to_string()),
            tags: vec!["news".to_string()],
            content: vec![EntryContent { value: "body".to_string(), content_type: None }],
            extra: Default::default(),
        }
    }

    #[test]
    fn prefers_self_link() {
        let bytes = generate(&meta(), &[]);
        let xml = String::from_utf8(bytes).unwrap();
        assert!(xml.contains("http://example.com/feed.atom"));
    }

    #[test]
    fn missing_author_defaults() {
        let bytes = generate(&meta(), &[]);
        let xml = String::from_utf8(bytes).unwrap();
        assert!(xml.contains(DEFAULT_AUTHOR));
    }

    #[test]
    fn entries_without_title_are_skipped() {
        let entries = vec![entry_with_title("a", None), entry_with_title("b", Some("Keep me"))];
        let bytes = generate(&meta(), &entries);
        let xml = String::from_utf8(bytes).unwrap();
        assert!(xml.contains("Keep me"));
        assert_eq!(xml.matches("<entry>").count(), 1);
    }
}
