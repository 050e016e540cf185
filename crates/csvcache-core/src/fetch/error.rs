use thiserror::Error;

/// Transport-level failures from an [`HttpFetch`](super::HttpFetch).
///
/// These carry detail for the operator log; they are mapped to
/// `CsvCacheError::FetchError` before reaching a viewer.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Could not read response body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_body() || e.is_decode() {
            TransportError::Body(e.to_string())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

/// Maximum length for response bodies quoted in log lines
const MAX_LOGGED_BODY_LENGTH: usize = 500;

/// Truncate a response body to avoid logging excessive data
pub fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_LOGGED_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_LOGGED_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_body_short() {
        assert_eq!(truncate_body("Not Found"), "Not Found");
    }

    #[test]
    fn test_truncate_body_long() {
        let body = "x".repeat(800);
        let out = truncate_body(&body);
        assert!(out.starts_with(&"x".repeat(500)));
        assert!(out.ends_with("(truncated, 800 total bytes)"));
    }

    #[test]
    fn test_truncate_body_char_boundary() {
        let body = format!("{}é{}", "a".repeat(499), "b".repeat(600));
        let out = truncate_body(&body);
        assert!(out.starts_with(&"a".repeat(499)));
        assert!(!out.contains('é'));
    }
}
