pub mod listen;
pub mod publish;
pub mod subscribe;

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

/// Rejects any request whose `Content-Type` is not
/// `application/x-www-form-urlencoded`, per §6.1.
pub fn require_form_urlencoded(headers: &HeaderMap) -> Result<(), Response> {
    let content_type = headers.get(axum::http::header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or("");
    if content_type.split(';').next().unwrap_or("").trim() != "application/x-www-form-urlencoded" {
        let mut resp = (StatusCode::NOT_ACCEPTABLE, "Content-Type must be application/x-www-form-urlencoded").into_response();
        resp.headers_mut().insert(axum::http::header::ACCEPT, "application/x-www-form-urlencoded".parse().unwrap());
        return Err(resp);
    }
    Ok(())
}

/// Parses a `application/x-www-form-urlencoded` body into an ordered list of
/// key/value pairs, preserving repeats (`hub.url`, `hub.verify`).
pub fn parse_form(body: &Bytes) -> Vec<(String, String)> {
    url::form_urlencoded::parse(body).into_owned().collect()
}

pub fn field_values<'a>(fields: &'a [(String, String)], key: &str) -> Vec<&'a str> {
    fields.iter().filter(|(k, _)| k == key).map(|(_, v)| v.as_str()).collect()
}

pub fn field<'a>(fields: &'a [(String, String)], key: &str) -> Option<&'a str> {
    field_values(fields, key).into_iter().next()
}

pub fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, message.into()).into_response()
}
