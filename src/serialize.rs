//! Cause-chain serialization into plain JSON-RPC error objects.
//!
//! The output shape is the JSON-RPC `error` member:
//!
//! ```json
//! { "code": -32000, "message": "Server error", "data": { "cause": { ... }, "stack": "..." } }
//! ```
//!
//! `code` is present only when the error carries one. `data` starts as the
//! error's own data. The serialized cause and (optionally) the stack are
//! merged into it and always win over same-named keys supplied by the caller.

use crate::chain::Link;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;

/// Key holding the serialized cause inside `data`.
pub const CAUSE_KEY: &str = "cause";
/// Key holding the captured stack inside `data`.
pub const STACK_KEY: &str = "stack";

/// Plain, transport-ready rendering of an error and its causes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedError {
    /// Numeric code, absent for errors without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
    /// Error message.
    pub message: String,
    /// Caller data merged with `cause` and `stack`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl SerializedError {
    /// Convert into a `serde_json::Value` object.
    pub fn into_value(self) -> Value {
        let mut object = Map::with_capacity(3);
        if let Some(code) = self.code {
            object.insert("code".to_owned(), Value::from(code));
        }
        object.insert("message".to_owned(), Value::String(self.message));
        if let Some(data) = self.data {
            object.insert("data".to_owned(), data);
        }
        Value::Object(object)
    }
}

impl From<SerializedError> for Value {
    fn from(err: SerializedError) -> Self {
        err.into_value()
    }
}

/// Flatten `link` and its cause chain.
///
/// With `include_stacks`, every level that captured a stack gets it under
/// `data.stack`. Only enable this for trusted, non-production consumers.
pub fn to_plain_object(link: Link<'_>, include_stacks: bool) -> SerializedError {
    let mut extras = Map::new();
    if let Some(cause) = link.cause() {
        extras.insert(
            CAUSE_KEY.to_owned(),
            to_plain_object(cause, include_stacks).into_value(),
        );
    }
    if include_stacks {
        if let Some(stack) = link.stack() {
            extras.insert(STACK_KEY.to_owned(), Value::String(stack.to_owned()));
        }
    }

    SerializedError {
        code: link.code(),
        message: link.message().into_owned(),
        data: merge_data(link.data(), extras),
    }
}

/// Serialize any error, recovering codes and data when it is one of this
/// crate's types.
pub fn foreign_to_plain_object(
    err: &(dyn Error + 'static),
    include_stacks: bool,
) -> SerializedError {
    to_plain_object(Link::from_foreign(err), include_stacks)
}

/// Merge `extras` over a copy of `data`.
///
/// Without extras the data is returned unchanged. Otherwise the result is
/// an object: arrays and strings contribute their elements under index keys
/// (`"0"`, `"1"`, ..), numbers and booleans contribute nothing.
fn merge_data(data: Option<&Value>, extras: Map<String, Value>) -> Option<Value> {
    if extras.is_empty() {
        return data.cloned();
    }
    let mut merged = match data {
        Some(Value::Object(fields)) => fields.clone(),
        Some(Value::Array(items)) => indexed(items.iter().cloned()),
        Some(Value::String(text)) => indexed(text.chars().map(|c| Value::String(c.to_string()))),
        _ => Map::new(),
    };
    merged.extend(extras);
    Some(Value::Object(merged))
}

fn indexed(values: impl Iterator<Item = Value>) -> Map<String, Value> {
    values.enumerate().map(|(i, value)| (i.to_string(), value)).collect()
}
