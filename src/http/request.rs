//! Request context construction.
//!
//! # Responsibilities
//! - Parse the query string of the raw request target
//! - Collect headers, keeping repeated headers as arrays
//! - Drain and parse the JSON body for POST, PUT and PATCH
//! - Attach the request ID for controllers
//!
//! # Design Decisions
//! - The context is complete (body fully drained) before it is submitted
//! - No percent-decoding; later duplicate query keys overwrite earlier ones
//! - Body problems are plain errors; the listener maps them to 500

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderMap, Method};
use serde_json::Value;

use crate::routing::{HeaderField, RequestContext};

/// Header carrying the request ID assigned by the listener.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Key of the request ID inside `RequestContext::extra_context`.
pub const REQUEST_ID_KEY: &str = "requestId";

/// Error type for context construction.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Build the invocation context for `request`, draining its body if needed.
pub async fn build_context(
    request: Request,
    max_body_size: usize,
) -> Result<RequestContext, ContextError> {
    let (parts, body) = request.into_parts();

    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut ctx = RequestContext {
        query: parse_query(target),
        headers: collect_headers(&parts.headers),
        body: read_body(&parts.method, body, max_body_size).await?,
        ..RequestContext::default()
    };

    if let Some(id) = parts.headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok()) {
        ctx.extra_context
            .insert(REQUEST_ID_KEY.to_string(), Value::String(id.to_string()));
    }

    Ok(ctx)
}

/// Parse the query part of a raw request target.
///
/// Everything after the first `?` is split on `&`, then each pair on its
/// first `=`. A pair without `=` maps to an empty value; empty pairs are
/// skipped.
pub fn parse_query(target: &str) -> HashMap<String, String> {
    let mut query = HashMap::new();
    let Some((_, raw)) = target.split_once('?') else {
        return query;
    };

    for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        query.insert(key.to_string(), value.to_string());
    }
    query
}

/// Collect headers by lower-case name. Repeated headers become arrays.
pub fn collect_headers(headers: &HeaderMap) -> HashMap<String, HeaderField> {
    let mut collected: HashMap<String, HeaderField> = HashMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        match collected.get_mut(name.as_str()) {
            Some(field) => field.push(value),
            None => {
                collected.insert(name.as_str().to_string(), HeaderField::Single(value));
            }
        }
    }
    collected
}

/// Whether the body of a request with this method is read at all.
pub fn expects_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Drain the body and parse it as JSON. Empty bodies yield `None`.
pub async fn read_body(
    method: &Method,
    body: Body,
    max_body_size: usize,
) -> Result<Option<Value>, ContextError> {
    if !expects_body(method) {
        return Ok(None);
    }

    let bytes = axum::body::to_bytes(body, max_body_size)
        .await
        .map_err(ContextError::Body)?;
    if bytes.is_empty() {
        return Ok(None);
    }

    Ok(Some(serde_json::from_slice(&bytes)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(method: Method, uri: &str, body: &'static str) -> Request {
        axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body))
            .unwrap()
    }

    #[test]
    fn test_parse_query_pairs() {
        let query = parse_query("/grp?a=1&b=2");
        assert_eq!(query.len(), 2);
        assert_eq!(query["a"], "1");
        assert_eq!(query["b"], "2");
    }

    #[test]
    fn test_parse_query_without_question_mark_is_empty() {
        assert!(parse_query("/grp").is_empty());
        assert!(parse_query("/grp?").is_empty());
    }

    #[test]
    fn test_parse_query_edge_cases() {
        let query = parse_query("/grp?a=1&a=2&flag&&x=y=z&e%20=%41");
        assert_eq!(query["a"], "2");
        assert_eq!(query["flag"], "");
        assert_eq!(query["x"], "y=z");
        // No percent-decoding.
        assert_eq!(query["e%20"], "%41");
        assert_eq!(query.len(), 4);
    }

    #[test]
    fn test_collect_headers_groups_repeats() {
        let mut headers = HeaderMap::new();
        headers.append("accept", "text/html".parse().unwrap());
        headers.append("accept", "application/json".parse().unwrap());
        headers.insert("host", "example.com".parse().unwrap());

        let collected = collect_headers(&headers);
        assert_eq!(
            collected["accept"],
            HeaderField::Multi(vec!["text/html".into(), "application/json".into()])
        );
        assert_eq!(collected["host"], HeaderField::Single("example.com".into()));
    }

    #[tokio::test]
    async fn test_post_bodies() {
        let ctx = build_context(request(Method::POST, "/grp", ""), 1024).await.unwrap();
        assert_eq!(ctx.body, None);

        let ctx = build_context(request(Method::POST, "/grp", r#"{"x":1}"#), 1024)
            .await
            .unwrap();
        assert_eq!(ctx.body, Some(json!({"x": 1})));

        let err = build_context(request(Method::PATCH, "/grp", "not-json"), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, ContextError::Json(_)));
    }

    #[tokio::test]
    async fn test_get_body_is_never_read() {
        let ctx = build_context(request(Method::GET, "/grp?a=1", "not-json"), 1024)
            .await
            .unwrap();
        assert_eq!(ctx.body, None);
        assert_eq!(ctx.query["a"], "1");
        assert!(ctx.params.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_body_is_an_error() {
        let err = build_context(request(Method::PUT, "/grp", r#"{"big":"payload"}"#), 4)
            .await
            .unwrap_err();
        assert!(matches!(err, ContextError::Body(_)));
    }

    #[tokio::test]
    async fn test_request_id_is_attached() {
        let request = axum::http::Request::builder()
            .uri("/grp")
            .header(X_REQUEST_ID, "abc-123")
            .body(Body::empty())
            .unwrap();
        let ctx = build_context(request, 1024).await.unwrap();
        assert_eq!(ctx.request_id(), Some("abc-123"));
        assert_eq!(ctx.headers[X_REQUEST_ID], HeaderField::Single("abc-123".into()));
    }
}
