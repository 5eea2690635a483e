//! Registers a listener callback URL with a running hub.
//!
//! Mirrors `pushhub/scripts.py::register_listener`, adapted for a process
//! boundary: the source script ran in-process against a bootstrapped
//! Pyramid app sharing the Hub's ZODB, but here the hub's topic/subscriber/
//! listener graph lives only in the server process's memory (§6.3), so this
//! binary is a thin client that POSTs to the server's own `/listen`
//! endpoint rather than touching a database directly.

use anyhow::{bail, Context, Result};
use clap::Parser;

/// Registers `listener_url` as a listener on a running hub, useful for
/// bootstrapping a hub with a default listener.
#[derive(Parser)]
struct Args {
    /// Base URL of the running hub, e.g. http://localhost:8000
    #[arg(long, env = "HUB_URL")]
    hub_url: String,

    /// The callback URL to register as a listener.
    listener_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let endpoint = format!("{}/listen", args.hub_url.trim_end_matches('/'));
    let client = reqwest::Client::new();
    let resp = client
        .post(&endpoint)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .form(&[("listener.callback", args.listener_url.as_str())])
        .send()
        .await
        .with_context(|| format!("POST {endpoint}"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("hub rejected listener registration: {status} {body}");
    }

    println!("registered listener {}", args.listener_url);
    Ok(())
}
