//! Durable notify queue (C8).
//!
//! Ported from `pushhub/worker.py::notify_subscribers`: a FIFO of pending
//! deliveries, each decremented on failure and requeued at the tail until
//! `max_tries` is exhausted. Backed by `rusqlite` rather than kept in
//! memory so a hub restart does not drop in-flight notifications — the
//! schema/open idiom follows `src/bin/bitvia-news.rs::open_db`.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::info;

use crate::http_client::HttpGateway;

const SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/db/schema.sql"));

/// Default number of delivery attempts before a queued job is dropped, per
/// `Topic.notify_subscribers`' `max_tries: 10` job default.
pub const DEFAULT_MAX_TRIES: i64 = 10;

#[derive(Debug, Clone)]
pub struct QueuedNotification {
    pub id: i64,
    pub topic_url: String,
    pub subscriber_url: String,
    pub content: Vec<u8>,
    pub content_type: String,
    pub tries_remaining: i64,
}

/// A handle to the durable notify queue. Holds a synchronous `rusqlite`
/// connection; callers invoke it from async code via `spawn_blocking`,
/// mirroring `handlers/address.rs`'s use of the Electrum client.
pub struct NotifyQueue {
    conn: Connection,
}

impl NotifyQueue {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("create notify queue db parent dir")?;
            }
        }
        let conn = Connection::open(path).with_context(|| format!("open notify queue db at {}", path.display()))?;
        conn.execute_batch(SCHEMA).context("apply notify queue schema")?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory notify queue db")?;
        conn.execute_batch(SCHEMA).context("apply notify queue schema")?;
        Ok(Self { conn })
    }

    /// Appends a notification job to the tail of the queue.
    pub fn enqueue(
        &self,
        topic_url: &str,
        subscriber_url: &str,
        content: &[u8],
        content_type: &str,
        max_tries: i64,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO notify_queue (topic_url, subscriber_url, content, content_type, tries_remaining, enqueued_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![topic_url, subscriber_url, content, content_type, max_tries, Utc::now().to_rfc3339()],
            )
            .context("enqueue notification")?;
        Ok(())
    }

    /// Pops the oldest job off the queue, if any.
    pub fn dequeue(&self) -> Result<Option<QueuedNotification>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, topic_url, subscriber_url, content, content_type, tries_remaining
                 FROM notify_queue ORDER BY id ASC LIMIT 1",
                [],
                |row| {
                    Ok(QueuedNotification {
                        id: row.get(0)?,
                        topic_url: row.get(1)?,
                        subscriber_url: row.get(2)?,
                        content: row.get(3)?,
                        content_type: row.get(4)?,
                        tries_remaining: row.get(5)?,
                    })
                },
            )
            .map(Some)
            .or_else(|e| if e == rusqlite::Error::QueryReturnedNoRows { Ok(None) } else { Err(e) })
            .context("dequeue notification")?;

        if let Some(job) = &row {
            self.conn
                .execute("DELETE FROM notify_queue WHERE id = ?1", params![job.id])
                .context("remove dequeued notification")?;
        }
        Ok(row)
    }

    /// Requeues `job` at the tail with one fewer try remaining. The job is
    /// always reinserted, even once `tries_remaining` reaches zero — the
    /// actual drop happens the *next* time it's pulled (see `drain`'s
    /// step-1 check), matching §4.8/§8's "re-enqueued with max_tries: 0;
    /// next run drops it" scenario.
    pub fn requeue_with_decrement(&self, job: &QueuedNotification) -> Result<()> {
        let remaining = job.tries_remaining - 1;
        self.enqueue(&job.topic_url, &job.subscriber_url, &job.content, &job.content_type, remaining)
    }

    /// Drains exactly the jobs present in the queue at the start of this
    /// call — one worker "run" — delivering each and requeuing non-2xx or
    /// unreachable deliveries with a decremented try count. Jobs requeued
    /// during this run are left for the *next* run/call, matching the
    /// cron-style invocation model of `SPEC_FULL.md` §5's separate worker
    /// process. Returns the last observed status per callback.
    pub async fn drain(&self, http: &HttpGateway) -> Result<HashMap<String, u16>> {
        let mut results = HashMap::new();
        let batch_size = self.len()?;
        for _ in 0..batch_size {
            let Some(job) = self.dequeue()? else { break };
            if job.tries_remaining <= 0 {
                info!(subscriber_url = %job.subscriber_url, "max tries exhausted, dropping notification");
                continue;
            }
            match http.deliver(&job.subscriber_url, &job.content, &job.content_type).await {
                Some(status) => {
                    results.insert(job.subscriber_url.clone(), status);
                    if !(200..300).contains(&status) {
                        self.requeue_with_decrement(&job)?;
                    }
                }
                None => {
                    self.requeue_with_decrement(&job)?;
                }
            }
        }
        Ok(results)
    }

    pub fn len(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM notify_queue", [], |row| row.get(0))
            .context("count notify queue")
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
