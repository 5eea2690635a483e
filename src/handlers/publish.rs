//! `POST /publish` (§6.1).

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

use crate::state::AppState;
use crate::url_util::normalize_iri;

use super::{bad_request, field_values, parse_form, require_form_urlencoded};

pub async fn publish(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Err(resp) = require_form_urlencoded(&headers) {
        return resp;
    }
    let fields = parse_form(&body);

    match field_values(&fields, "hub.mode").first() {
        Some(&"publish") => {}
        Some(other) => return bad_request(format!("unsupported hub.mode: {other}")),
        None => return bad_request("missing hub.mode"),
    }

    let raw_urls = field_values(&fields, "hub.url");
    if raw_urls.is_empty() {
        return bad_request("missing hub.url");
    }

    let mut topic_urls = Vec::with_capacity(raw_urls.len());
    for raw in raw_urls {
        let normalized = normalize_iri(raw);
        if !crate::url_util::is_valid_url(&normalized) {
            return bad_request(format!("invalid hub.url: {raw}"));
        }
        topic_urls.push(normalized);
    }

    for topic_url in &topic_urls {
        if let Err(e) = state.hub.publish(topic_url) {
            warn!(topic_url = %topic_url, error = %e, "publish failed");
            return bad_request(e.to_string());
        }
    }

    // Fetch before notifying listeners, per §5's ping -> fetch -> listener
    // notify -> subscriber notify ordering. Scoped to just-published topics
    // rather than a full re-fetch pass (SPEC_FULL.md §9 open-question
    // decision).
    state.hub.fetch_content(&topic_urls).await;

    for topic_url in &topic_urls {
        if let Err(e) = state.hub.notify_listeners(topic_url).await {
            warn!(topic_url = %topic_url, error = %e, "notify_listeners failed");
        }
    }

    // notify_subscribers writes to the rusqlite-backed queue; run it on a
    // blocking thread so the sqlite I/O never stalls the async executor,
    // the same pattern handlers/address.rs uses for the Electrum client.
    let hub = state.hub.clone();
    let urls = topic_urls.clone();
    let notify_result = tokio::task::spawn_blocking(move || {
        for topic_url in &urls {
            if let Err(e) = hub.notify_subscribers(topic_url) {
                return Err((topic_url.clone(), e));
            }
        }
        Ok(())
    })
    .await;

    match notify_result {
        Ok(Ok(())) => {}
        Ok(Err((topic_url, e))) => warn!(topic_url = %topic_url, error = %e, "notify_subscribers failed"),
        Err(join_err) => warn!(error = %join_err, "notify_subscribers task panicked"),
    }

    info!(count = topic_urls.len(), "published topics");
    StatusCode::NO_CONTENT.into_response()
}
