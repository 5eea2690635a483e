//! Feed parser adapter (C2): wraps `feed_rs` so malformed input sets a
//! `bozo` flag instead of propagating a parse error.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use feed_rs::model::{Feed as RawFeed, FeedType};

/// A feed link, e.g. `<link rel="self" href="...">`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedLink {
    pub rel: Option<String>,
    pub href: String,
}

/// Feed-level metadata, a subset of `feed_rs::model::Feed` plus a passthrough
/// bag for the fields neither `title`/`link`/`links`/`author` names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedMeta {
    pub title: String,
    pub link: String,
    pub links: Vec<FeedLink>,
    pub author: Option<String>,
    /// Passthrough metadata (description, ttl, subtitle, ...). Stands in for
    /// the source's arbitrary `dict` keys — see `feed::comparator` for how
    /// this is used to approximate Python's `len(feed.keys())`.
    pub extra: BTreeMap<String, String>,
}

impl FeedMeta {
    /// Number of metadata "keys" present, standing in for the source's
    /// `len(parsed.feed.keys())`. `title`/`link` are always present in our
    /// model (possibly empty), so only `author` and `extra` entries vary.
    pub fn key_count(&self) -> usize {
        2 + usize::from(self.author.is_some()) + self.extra.len()
    }
}

/// A single feed entry, a subset of `feed_rs::model::Entry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    pub id: String,
    pub title: Option<String>,
    pub link: String,
    pub updated_parsed: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub content: Vec<EntryContent>,
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryContent {
    pub value: String,
    pub content_type: Option<String>,
}

/// The hub's view of a parsed feed document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedFeed {
    /// Set when the input could not be parsed as a feed at all.
    pub bozo: bool,
    /// A token containing "atom" or "rss", e.g. `"atom"`, `"rss2.0"`.
    pub version: String,
    pub feed: FeedMeta,
    pub entries: Vec<ParsedEntry>,
}

/// Parses `bytes` into a `ParsedFeed`. Returns `None` only for empty input;
/// malformed-but-nonempty input comes back with `bozo: true` rather than an
/// error, matching `pushhub/models/topic.py::Topic.parse`.
pub fn parse(bytes: &[u8]) -> Option<ParsedFeed> {
    if bytes.is_empty() {
        return None;
    }
    match feed_rs::parser::parse(bytes) {
        Ok(raw) => Some(from_raw(raw)),
        Err(_) => Some(ParsedFeed {
            bozo: true,
            ..Default::default()
        }),
    }
}

fn version_token(feed_type: FeedType) -> &'static str {
    match feed_type {
        FeedType::Atom => "atom10",
        FeedType::RSS0 => "rss090",
        FeedType::RSS1 => "rss10",
        FeedType::RSS2 => "rss20",
        FeedType::JSON => "json1",
    }
}

fn from_raw(raw: RawFeed) -> ParsedFeed {
    let mut extra = BTreeMap::new();
    if let Some(desc) = raw.description.as_ref() {
        extra.insert("description".to_string(), desc.content.clone());
    }
    if let Some(ttl) = raw.ttl {
        extra.insert("ttl".to_string(), ttl.to_string());
    }
    if let Some(rights) = raw.rights.as_ref() {
        extra.insert("rights".to_string(), rights.content.clone());
    }

    let link = raw
        .links
        .iter()
        .find(|l| l.rel.as_deref().unwrap_or("alternate") == "alternate")
        .or_else(|| raw.links.first())
        .map(|l| l.href.clone())
        .unwrap_or_default();

    let feed = FeedMeta {
        title: raw.title.as_ref().map(|t| t.content.clone()).unwrap_or_default(),
        link,
        links: raw
            .links
            .iter()
            .map(|l| FeedLink {
                rel: l.rel.clone(),
                href: l.href.clone(),
            })
            .collect(),
        author: raw.authors.first().map(|p| p.name.clone()),
        extra,
    };

    let entries = raw
        .entries
        .into_iter()
        .map(|e| {
            let mut extra = BTreeMap::new();
            if let Some(author) = e.authors.first() {
                extra.insert("author_name".to_string(), author.name.clone());
            }

            ParsedEntry {
                id: e.id,
                title: e.title.map(|t| t.content),
                link: e
                    .links
                    .iter()
                    .find(|l| l.rel.as_deref().unwrap_or("") != "self")
                    .or_else(|| e.links.first())
                    .map(|l| l.href.clone())
                    .unwrap_or_default(),
                updated_parsed: e.updated.or(e.published),
                summary: e.summary.map(|t| t.content),
                tags: e.categories.into_iter().map(|c| c.term).collect(),
                content: e
                    .content
                    .and_then(|c| c.body.map(|body| vec![EntryContent { value: body, content_type: None }]))
                    .unwrap_or_default(),
                extra,
            }
        })
        .collect();

    ParsedFeed {
        bozo: false,
        version: version_token(raw.feed_type).to_string(),
        feed,
        entries,
    }
}
