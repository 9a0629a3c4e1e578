//! Client-side data access for the rideshare REST service.
//!
//! # Overview
//! Wraps every endpoint of the service (users, roles, foos, locations, rides,
//! ride participants) in a named operation that returns typed entities.
//!
//! # Design
//! - `RestClient` is stateless: it builds `HttpRequest` values and decodes
//!   `HttpResponse` values without touching the network.
//! - `Fetcher` is the single transport primitive. It forces same-origin
//!   credentials from the explicit `Session`, and reports network failures
//!   to an injected `FailureReporter` before returning them.
//! - HTTP status codes are never interpreted. Application failures arrive as
//!   `{"error": ...}` bodies and surface as `Outcome::Rejected` values.
//! - Entities keep the whole JSON object they were decoded from, so fields
//!   added by the server later pass through untouched.
//! - `RideshareApi` composes the three into one method per operation.

pub mod api;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod http;
pub mod report;
pub mod session;
pub mod transport;
pub mod types;

pub use api::RideshareApi;
pub use client::RestClient;
pub use config::ClientConfig;
pub use decode::{decode_list, object_or_error, Decode, ErrorPayload, Outcome};
pub use error::{ApiError, TransportError};
pub use fetch::Fetcher;
pub use http::{CredentialsMode, HttpMethod, HttpRequest, HttpResponse};
pub use report::{FailureReporter, LogReporter};
pub use session::Session;
pub use transport::{Transport, UreqTransport};
pub use types::{
    Credentials, Foo, JoinRide, JsonFields, Location, LoginRequest, NewRide, Ride,
    RideParticipant, Role, User,
};
