//! `POST /listen` (§6.1) — registers an operational listener, independent
//! of the subscriber graph. Mirrors `pushhub/scripts.py::register_listener`.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::info;

use crate::state::AppState;
use crate::url_util::normalize_iri;

use super::{bad_request, field, parse_form, require_form_urlencoded};

pub async fn listen(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Err(resp) = require_form_urlencoded(&headers) {
        return resp;
    }
    let fields = parse_form(&body);

    let Some(raw_callback) = field(&fields, "listener.callback") else {
        return bad_request("missing listener.callback");
    };
    let callback_url = normalize_iri(raw_callback);
    if !crate::url_util::is_valid_url(&callback_url) {
        return bad_request(format!("invalid listener.callback: {raw_callback}"));
    }

    if let Err(e) = state.hub.register_listener(&callback_url).await {
        return bad_request(e.to_string());
    }
    info!(callback_url = %callback_url, "registered listener");
    StatusCode::OK.into_response()
}
