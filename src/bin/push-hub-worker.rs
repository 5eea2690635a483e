//! Cron-invoked worker that drains the durable notify queue once per run.
//!
//! Mirrors `pushhub/scripts.py::process_subscriber_notices` /
//! `pushhub/worker.py::notify_subscribers`: pull a job, attempt delivery,
//! requeue with a decremented try count on failure, stop once the queue is
//! empty.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use push_hub::http_client::HttpGateway;
use push_hub::queue::NotifyQueue;

/// Drains the hub's durable notify queue, delivering each pending
/// notification and requeuing failures with a decremented try count.
#[derive(Parser)]
struct Args {
    /// Path to the notify-queue sqlite database. Defaults to NOTIFY_QUEUE_DB
    /// or "./db/notify_queue.db", matching the server's own default.
    #[arg(long)]
    queue_db: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(log_level)).init();

    let args = Args::parse();
    let queue_db = args
        .queue_db
        .or_else(|| std::env::var("NOTIFY_QUEUE_DB").ok())
        .unwrap_or_else(|| "./db/notify_queue.db".to_string());

    let queue = NotifyQueue::open(&queue_db).with_context(|| format!("open notify queue at {queue_db}"))?;
    let http = HttpGateway::new(reqwest::Client::new());

    let results = queue.drain(&http).await.context("drain notify queue")?;
    for (callback, status) in &results {
        if !(200..300).contains(status) {
            warn!(callback = %callback, status = %status, "delivery rejected, requeued for next run");
        }
    }

    info!(attempted = results.len(), "notify queue drained");
    Ok(())
}
