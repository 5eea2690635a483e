//! `POST /subscribe` (§6.1).

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::info;

use crate::state::AppState;
use crate::url_util::normalize_iri;

use super::{bad_request, field, field_values, parse_form, require_form_urlencoded};

pub async fn subscribe(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Err(resp) = require_form_urlencoded(&headers) {
        return resp;
    }
    let fields = parse_form(&body);

    let Some(raw_callback) = field(&fields, "hub.callback") else {
        return bad_request("missing hub.callback");
    };
    let callback_url = normalize_iri(raw_callback);
    if !crate::url_util::is_valid_url(&callback_url) {
        return bad_request(format!("invalid hub.callback: {raw_callback}"));
    }

    let Some(raw_topic) = field(&fields, "hub.topic") else {
        return bad_request("missing hub.topic");
    };
    let topic_url = normalize_iri(raw_topic);
    if !crate::url_util::is_valid_url(&topic_url) {
        return bad_request(format!("invalid hub.topic: {raw_topic}"));
    }

    let mode = match field(&fields, "hub.mode") {
        Some("subscribe") => "subscribe",
        Some("unsubscribe") => "unsubscribe",
        Some(other) => return bad_request(format!("unsupported hub.mode: {other}")),
        None => return bad_request("missing hub.mode"),
    };

    let verify_modes = field_values(&fields, "hub.verify");
    if verify_modes.is_empty() {
        return bad_request("missing hub.verify");
    }
    if !verify_modes.iter().any(|v| *v == "sync" || *v == "async") {
        return bad_request("hub.verify must be sync or async");
    }
    // `sync` is preferred when both appear; `async` alone is rejected since
    // asynchronous verification is not implemented (explicit Non-goal).
    if !verify_modes.contains(&"sync") {
        return bad_request("hub.verify=async is not supported");
    }

    let verify_callbacks = match field(&fields, "hub.verify_callbacks") {
        Some(v) => !v.eq_ignore_ascii_case("false") && v != "0",
        None => true,
    };

    // `hub.lease_seconds` is accepted and validated but not enforced — no
    // lease-expiry sweep exists (Non-goal, §9).
    if let Some(raw_lease) = field(&fields, "hub.lease_seconds") {
        if raw_lease.parse::<u64>().is_err() {
            return bad_request(format!("invalid hub.lease_seconds: {raw_lease}"));
        }
    }

    let result = if mode == "subscribe" {
        state.hub.subscribe(&callback_url, &topic_url, verify_callbacks).await
    } else {
        state.hub.unsubscribe(&callback_url, &topic_url).await
    };

    match result {
        Ok(true) => {
            info!(callback_url = %callback_url, topic_url = %topic_url, mode, "subscription verified");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => StatusCode::CONFLICT.into_response(),
        Err(e) => bad_request(e.to_string()),
    }
}
