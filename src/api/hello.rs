//! `hello` route group.

use serde_json::json;

use crate::routing::{HttpMethod, RouteEntry};

pub fn routes() -> Vec<RouteEntry> {
    vec![
        RouteEntry::new(HttpMethod::Get, "/", |_| async {
            Ok(json!("hello from controller"))
        }),
        RouteEntry::new(HttpMethod::Get, "/world", |_| async { Ok(json!("hello world")) }),
    ]
}
