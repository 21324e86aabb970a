//! Invocation context handed to controllers.
//!
//! The context is owned data: it is moved into a worker task and never shared
//! with the listener after submission.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A header value as seen by controllers.
///
/// Headers that appear once are plain strings, repeated headers become arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderField {
    Single(String),
    Multi(Vec<String>),
}

impl HeaderField {
    /// Appends another occurrence of the same header.
    pub fn push(&mut self, value: String) {
        match self {
            HeaderField::Single(first) => {
                let first = std::mem::take(first);
                *self = HeaderField::Multi(vec![first, value]);
            }
            HeaderField::Multi(values) => values.push(value),
        }
    }

    /// First occurrence of the header.
    pub fn first(&self) -> Option<&str> {
        match self {
            HeaderField::Single(value) => Some(value),
            HeaderField::Multi(values) => values.first().map(String::as_str),
        }
    }
}

/// Everything a controller knows about the request that triggered it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub query: HashMap<String, String>,

    /// Path parameters. Never populated; reserved for path templates.
    pub params: HashMap<String, String>,

    pub headers: HashMap<String, HeaderField>,

    /// Parsed JSON body. `None` for bodiless methods and empty bodies.
    pub body: Option<Value>,

    /// Values attached by the listener, such as the request ID.
    pub extra_context: Map<String, Value>,
}

impl RequestContext {
    /// Looks up a header by its lower-case name.
    pub fn header(&self, name: &str) -> Option<&HeaderField> {
        self.headers.get(name)
    }

    /// Request ID assigned by the listener, when present.
    pub fn request_id(&self) -> Option<&str> {
        self.extra_context.get("requestId").and_then(Value::as_str)
    }
}
