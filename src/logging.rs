//! Middleware for logging API requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    middleware::Next,
    response::Response,
};

/// Bodies longer than this many bytes are shortened in the `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 256;

/// Log the head and body of every request and response at the `info` level.
///
/// Bodies longer than [LOG_BODY_LENGTH_LIMIT] bytes are truncated, the full
/// body is then logged at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body = read_body(body).await;
    log_body(
        &format!("Received request: {} {}", parts.method, parts.uri),
        &body,
    );

    let response = next
        .run(Request::from_parts(parts, Body::from(body)))
        .await;

    let (parts, body) = response.into_parts();
    let body = read_body(body).await;
    log_body(&format!("Sending response: {}", parts.status), &body);

    Response::from_parts(parts, Body::from(body))
}

async fn read_body(body: Body) -> Bytes {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .inspect_err(|error| tracing::error!("could not read body for logging: {error}"))
        .unwrap_or_default()
}

fn log_body(head: &str, body: &[u8]) {
    let text = String::from_utf8_lossy(body);

    if text.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!("{head}\nbody: {}...", truncate(&text, LOG_BODY_LENGTH_LIMIT));
        tracing::debug!("{head}\nfull body: {text}");
    } else {
        tracing::info!("{head}\nbody: {text}");
    }
}

/// Cut `text` to at most `limit` bytes without splitting a character.
fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

#[cfg(test)]
mod logging_tests {
    use super::truncate;

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn long_text_is_cut_at_limit() {
        assert_eq!(truncate("hello world", 5), "hello");
    }

    #[test]
    fn truncation_does_not_split_characters() {
        // "€" is three bytes long.
        assert_eq!(truncate("a€b", 2), "a");
        assert_eq!(truncate("a€b", 4), "a€");
    }
}
