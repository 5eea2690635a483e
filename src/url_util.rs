//! URL validation and IRI normalization (C1).
//!
//! Ported from `pushhub/utils.py::is_valid_url` / `normalize_iri`. The port
//! drops the source's port whitelist (`VALID_PORTS`) — see `SPEC_FULL.md`
//! §4.1, a deliberate relaxation, not an oversight.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use url::Url;

/// True iff `s` is an absolute `http`/`https` URL with a non-empty host and
/// no fragment. Schemeless, path-only, or fragment-bearing URLs are invalid.
pub fn is_valid_url(s: &str) -> bool {
    let Ok(parsed) = Url::parse(s) else {
        return false;
    };
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return false;
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return false;
    }
    if parsed.fragment().is_some() {
        return false;
    }
    true
}

/// Percent-encodes every non-ASCII byte of `s`, leaving ASCII bytes
/// untouched. Idempotent: re-encoding an already-normalized IRI is a no-op,
/// because percent-encoded output is itself pure ASCII.
pub fn normalize_iri(s: &str) -> String {
    s.chars()
        .map(|c| {
            if (c as u32) <= 0x7f {
                c.to_string()
            } else {
                let mut buf = [0u8; 4];
                let bytes = c.encode_utf8(&mut buf).as_bytes();
                utf8_percent_encode(
                    std::str::from_utf8(bytes).expect("char re-encodes to valid utf8"),
                    NON_ALPHANUMERIC,
                )
                .to_string()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bare_scheme() {
        assert!(!is_valid_url("http://"));
    }

    #[test]
    fn rejects_path_only() {
        assert!(!is_valid_url("/path-only"));
    }

    #[test]
    fn rejects_fragment() {
        assert!(!is_valid_url("http://google.com/#fragment"));
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert!(!is_valid_url("ftp://example.com/feed"));
    }

    #[test]
    fn accepts_plain_host_and_path() {
        assert!(is_valid_url("http://www.google.com/"));
        assert!(is_valid_url("http://httpbin.org/get"));
    }

    #[test]
    fn accepts_host_with_port() {
        assert!(is_valid_url("http://example.com:8080/feed"));
    }

    #[test]
    fn normalize_is_idempotent() {
        let raw = "http://example.com/caf\u{e9}";
        let once = normalize_iri(raw);
        let twice = normalize_iri(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_passes_through_ascii() {
        assert_eq!(normalize_iri("http://example.com/path"), "http://example.com/path");
    }

    #[test]
    fn normalize_encodes_non_ascii() {
        let encoded = normalize_iri("caf\u{e9}");
        assert!(encoded.starts_with("caf"));
        assert!(encoded.contains('%'));
    }
}
