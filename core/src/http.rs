//! HTTP transport types shared by the request builders and the transports.
//!
//! # Design
//! Requests and responses are plain data. `RestClient` builds `HttpRequest`
//! values and decodes `HttpResponse` values; a `Transport` performs the
//! actual round-trip in between. Keeping the wire exchange as data lets the
//! credential policy be asserted in tests without a live server.

use serde_json::Value;

use crate::error::ApiError;

/// Content type sent with every JSON request body.
pub const JSON_CONTENT_TYPE: &str = "application/json;charset=utf-8";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Which credentials (session cookies) accompany a request.
///
/// `Fetcher::fetch` rewrites every request to `SameOrigin` before it leaves
/// the process, whatever the caller put here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialsMode {
    Omit,
    #[default]
    SameOrigin,
    Include,
}

/// An HTTP request described as plain data.
///
/// `path` is the absolute URL of the target resource.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub credentials: CredentialsMode,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
            credentials: CredentialsMode::default(),
        }
    }

    /// Attach a JSON body together with the JSON content-type header.
    pub fn with_json_body(mut self, body: String) -> Self {
        self.headers
            .push(("content-type".to_string(), JSON_CONTENT_TYPE.to_string()));
        self.body = Some(body);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
///
/// Any status code, including 4xx and 5xx, is a valid response here. The
/// body is kept as raw bytes; it is only interpreted when a caller decodes it.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Case-insensitive lookup of the first header named `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// The body as UTF-8 text.
    pub fn text(&self) -> Result<&str, ApiError> {
        std::str::from_utf8(&self.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<Value, ApiError> {
        serde_json::from_str(self.text()?)
            .map_err(|e| ApiError::DeserializationError(e.to_string()))
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
