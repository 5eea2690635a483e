//! Hub-wide error type and its mapping onto the HTTP façade's status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors raised by the core hub engine.
///
/// Outbound-HTTP failures (a fetch that can't connect, a verification GET
/// that comes back non-200) are *not* represented here — those are absorbed
/// into state flags (`Topic.failed`) or boolean returns, per the propagation
/// policy. This enum only carries the errors that cross back out to a caller.
#[derive(Debug, Error)]
pub enum HubError {
    /// A URL failed `is_valid_url` at construction or parameter parsing time.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// A fetched topic's body could not be parsed as Atom/RSS, or the
    /// parser reported `bozo`.
    #[error("invalid feed content for topic {0}")]
    InvalidContent(String),
    /// `remove_subscriber`/`remove_listener` called for a callback that
    /// isn't present.
    #[error("{0} not found for {1}")]
    NotFound(&'static str, String),
    /// A topic's `content_type` is neither `atom` nor `rss`.
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
    /// A required form field was missing or malformed.
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let status = match &self {
            HubError::InvalidUrl(_) | HubError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HubError::InvalidContent(_) => StatusCode::BAD_GATEWAY,
            HubError::NotFound(_, _) => StatusCode::NOT_FOUND,
            HubError::UnsupportedContentType(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        (status, self.to_string()).into_response()
    }
}
