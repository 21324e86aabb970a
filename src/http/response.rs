//! Response construction.
//!
//! # Responsibilities
//! - Serialize controller results into response bodies
//! - Build JSON error responses (`{"message": ...}`)
//!
//! # Design Decisions
//! - String results are written verbatim, everything else as JSON
//! - Success responses carry no forced content type
//! - Error responses are always `application/json`

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};

/// Render a controller result as a response body.
pub fn serialize_result(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// 200 response carrying a serialized controller result.
pub fn success(value: &Value) -> Response {
    Response::new(Body::from(serialize_result(value)))
}

/// JSON error response with the given status and message.
pub fn error(status: StatusCode, message: &str) -> Response {
    let body = json!({ "message": message }).to_string();
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// 404 for a route key with no registered route.
pub fn not_found(route_key: &str) -> Response {
    error(StatusCode::NOT_FOUND, &format!("no such route: {}", route_key))
}

/// 500 for any failure after routing.
pub fn internal_error(message: &str) -> Response {
    error(StatusCode::INTERNAL_SERVER_ERROR, message)
}
