//! Decoders from parsed JSON bodies into entities.
//!
//! # Design
//! The service reports application failures in the body, not the status
//! line: a JSON object carrying an `error` key is a failure whatever the
//! status code was. `object_or_error` makes that shape-based dispatch
//! explicit before any typed decoding happens.

use serde_json::{Map, Value};

use crate::error::ApiError;

/// Build an entity from a parsed JSON value.
pub trait Decode: Sized {
    fn decode(json: Value) -> Result<Self, ApiError>;
}

/// Decode a JSON array element-wise, preserving order.
pub fn decode_list<T: Decode>(json: Value) -> Result<Vec<T>, ApiError> {
    match json {
        Value::Array(items) => items.into_iter().map(T::decode).collect(),
        other => Err(ApiError::DeserializationError(format!(
            "expected a JSON array, got {}",
            kind_of(&other)
        ))),
    }
}

/// Either a decoded entity or the error body the server sent instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Entity(T),
    Rejected(ErrorPayload),
}

impl<T> Outcome<T> {
    pub fn into_result(self) -> Result<T, ErrorPayload> {
        match self {
            Outcome::Entity(entity) => Ok(entity),
            Outcome::Rejected(payload) => Err(payload),
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected(_))
    }
}

/// A body carrying an `error` key, kept exactly as received.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorPayload {
    body: Value,
}

impl ErrorPayload {
    /// The `error` value when it is a string.
    pub fn message(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }
}

/// Return the body untouched when it has an `error` key, else decode `T`.
///
/// Only the presence of the key matters, not its value.
pub fn object_or_error<T: Decode>(json: Value) -> Result<Outcome<T>, ApiError> {
    let rejected = json
        .as_object()
        .is_some_and(|object| object.contains_key("error"));
    if rejected {
        return Ok(Outcome::Rejected(ErrorPayload { body: json }));
    }
    T::decode(json).map(Outcome::Entity)
}

/// Unwrap a JSON object, naming `entity` in the error otherwise.
pub(crate) fn into_object(json: Value, entity: &str) -> Result<Map<String, Value>, ApiError> {
    match json {
        Value::Object(fields) => Ok(fields),
        other => Err(ApiError::DeserializationError(format!(
            "{entity} must be a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
