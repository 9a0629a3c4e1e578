//! Error types for the rideshare API client.
//!
//! # Design
//! Only three things can go wrong inside this layer: the network round-trip
//! fails, a body is not the JSON shape an operation expects, or a request
//! payload cannot be encoded. HTTP status codes are not errors here, and
//! `{"error": ...}` payloads are values (`Outcome::Rejected`), not failures.

use thiserror::Error;

/// A network-level failure: DNS, refused connection, reset, broken body stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Errors returned by the rideshare client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(#[from] TransportError),

    /// The response body is not JSON, or not the shape the operation decodes.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}
