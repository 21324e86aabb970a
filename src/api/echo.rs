//! `echo` route group: returns what the controller was given.

use serde_json::json;

use crate::routing::{ControllerResult, HttpMethod, RequestContext, RouteEntry};

async fn echo(ctx: RequestContext) -> ControllerResult {
    Ok(serde_json::to_value(&ctx)?)
}

async fn body(ctx: RequestContext) -> ControllerResult {
    match ctx.body {
        Some(body) => Ok(json!({ "received": body })),
        None => Err("request has no body".into()),
    }
}

pub fn routes() -> Vec<RouteEntry> {
    vec![
        RouteEntry::new(HttpMethod::Get, "/", echo),
        RouteEntry::new(HttpMethod::Post, "/", echo),
        RouteEntry::new(HttpMethod::Put, "/body", body),
    ]
}
