//! Stateless request builder and response parser for the rideshare API.
//!
//! # Design
//! `RestClient` holds only the base URL and carries no mutable state between
//! calls. Each named operation has a `build_*` method producing an
//! `HttpRequest`; responses are consumed by `parse_*` methods named after the
//! shape they decode. No parser looks at the status code: the service signals
//! application failures through `{"error": ...}` bodies instead.

use serde::Serialize;
use url::Url;

use crate::decode::{decode_list, object_or_error, Decode, Outcome};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    Credentials, Foo, JoinRide, Location, LoginRequest, NewRide, Ride, RideParticipant, Role,
    User,
};

#[derive(Debug, Clone)]
pub struct RestClient {
    base_url: Url,
}

impl RestClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // --- users ---

    pub fn build_get_user(&self) -> HttpRequest {
        self.get(&["rest", "user"])
    }

    pub fn build_login(
        &self,
        username: &str,
        password: &str,
        remember: bool,
    ) -> Result<HttpRequest, ApiError> {
        let mut url = self.url(&["rest", "user", "login"]);
        url.query_pairs_mut()
            .append_pair("remember", if remember { "true" } else { "false" });
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        Ok(HttpRequest::new(HttpMethod::Post, url).with_json_body(to_json(&body)?))
    }

    pub fn build_logout(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Post, self.url(&["rest", "user", "logout"]))
    }

    pub fn build_get_users(&self) -> HttpRequest {
        self.get(&["rest", "user", "all"])
    }

    pub fn build_get_roles(&self) -> HttpRequest {
        self.get(&["rest", "user", "roles"])
    }

    pub fn build_add_user(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        let url = self.url(&["rest", "user"]);
        Ok(HttpRequest::new(HttpMethod::Post, url).with_json_body(to_json(credentials)?))
    }

    pub fn build_put_user(
        &self,
        id: i64,
        credentials: &Credentials,
    ) -> Result<HttpRequest, ApiError> {
        let url = self.url(&["rest", "user", &id.to_string()]);
        Ok(HttpRequest::new(HttpMethod::Put, url).with_json_body(to_json(credentials)?))
    }

    pub fn build_delete_user(&self, username: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Delete, self.url(&["rest", "user", username]))
    }

    pub fn build_get_specific_user(&self, user_id: i64) -> HttpRequest {
        self.get(&["rest", "user", &user_id.to_string()])
    }

    // --- foos ---

    /// All foos visible to the session, or only those of `user_id`.
    pub fn build_get_foos(&self, user_id: Option<i64>) -> HttpRequest {
        match user_id {
            Some(id) => self.get(&["rest", "foo", "user", &id.to_string()]),
            None => self.get(&["rest", "foo"]),
        }
    }

    pub fn build_add_foo<F: Serialize>(&self, foo: &F) -> Result<HttpRequest, ApiError> {
        let url = self.url(&["rest", "foo"]);
        Ok(HttpRequest::new(HttpMethod::Post, url).with_json_body(to_json(foo)?))
    }

    pub fn build_delete_foo(&self, foo_id: i64) -> HttpRequest {
        HttpRequest::new(
            HttpMethod::Delete,
            self.url(&["rest", "foo", &foo_id.to_string()]),
        )
    }

    pub fn build_update_foo(&self, foo_id: i64, total: i64) -> HttpRequest {
        let url = self.url(&["rest", "foo", &foo_id.to_string(), "total", &total.to_string()]);
        HttpRequest::new(HttpMethod::Post, url)
    }

    // --- locations ---

    pub fn build_get_locations(&self) -> HttpRequest {
        self.get(&["rest", "location", "all"])
    }

    pub fn build_get_location(&self, location: &str) -> HttpRequest {
        self.get(&["rest", "location", location])
    }

    // --- rides ---

    pub fn build_create_ride(&self, ride: &NewRide) -> Result<HttpRequest, ApiError> {
        let url = self.url(&["rest", "ride"]);
        Ok(HttpRequest::new(HttpMethod::Post, url).with_json_body(to_json(ride)?))
    }

    pub fn build_get_rides(&self) -> HttpRequest {
        self.get(&["rest", "ride", "all"])
    }

    pub fn build_get_user_rides(&self, user_id: i64) -> HttpRequest {
        self.get(&["rest", "ride", "user", &user_id.to_string()])
    }

    pub fn build_join_ride(&self, ride_id: i64) -> Result<HttpRequest, ApiError> {
        let url = self.url(&["rest", "ride", &ride_id.to_string()]);
        let body = to_json(&JoinRide { ride_id })?;
        Ok(HttpRequest::new(HttpMethod::Post, url).with_json_body(body))
    }

    pub fn build_delete_ride(&self, ride_id: i64) -> HttpRequest {
        HttpRequest::new(
            HttpMethod::Delete,
            self.url(&["rest", "ride", "delete", &ride_id.to_string()]),
        )
    }

    pub fn build_leave_ride(&self, ride_id: i64, user_id: i64) -> HttpRequest {
        let url = self.url(&[
            "rest",
            "ride",
            "leave",
            &ride_id.to_string(),
            &user_id.to_string(),
        ]);
        HttpRequest::new(HttpMethod::Delete, url)
    }

    pub fn build_get_all_travelers(&self, ride_id: i64) -> HttpRequest {
        self.get(&["rest", "rideperson", &ride_id.to_string()])
    }

    /// Note the trailing slash: the service routes `rideperson/all/` verbatim.
    pub fn build_get_ride_person_rides(&self) -> HttpRequest {
        self.get(&["rest", "rideperson", "all", ""])
    }

    pub fn build_search_relevant_rides(
        &self,
        arrival_location: &str,
        departure_location: &str,
        departure_time: &str,
    ) -> HttpRequest {
        self.get(&[
            "rest",
            "ride",
            arrival_location,
            departure_location,
            departure_time,
        ])
    }

    // --- parsers ---

    pub fn parse_user(&self, response: &HttpResponse) -> Result<User, ApiError> {
        parse_one(response)
    }

    pub fn parse_users(&self, response: &HttpResponse) -> Result<Vec<User>, ApiError> {
        parse_many(response)
    }

    pub fn parse_roles(&self, response: &HttpResponse) -> Result<Vec<Role>, ApiError> {
        parse_many(response)
    }

    pub fn parse_user_or_error(&self, response: &HttpResponse) -> Result<Outcome<User>, ApiError> {
        object_or_error(response.json()?)
    }

    pub fn parse_foo(&self, response: &HttpResponse) -> Result<Foo, ApiError> {
        parse_one(response)
    }

    pub fn parse_foos(&self, response: &HttpResponse) -> Result<Vec<Foo>, ApiError> {
        parse_many(response)
    }

    /// The service echoes the new total; the requested value is trusted
    /// instead and the body is not read.
    pub fn parse_update_foo(&self, _response: &HttpResponse, total: i64) -> i64 {
        total
    }

    pub fn parse_location(&self, response: &HttpResponse) -> Result<Location, ApiError> {
        parse_one(response)
    }

    pub fn parse_locations(&self, response: &HttpResponse) -> Result<Vec<Location>, ApiError> {
        parse_many(response)
    }

    pub fn parse_ride(&self, response: &HttpResponse) -> Result<Ride, ApiError> {
        parse_one(response)
    }

    pub fn parse_rides(&self, response: &HttpResponse) -> Result<Vec<Ride>, ApiError> {
        parse_many(response)
    }

    pub fn parse_ride_participants(
        &self,
        response: &HttpResponse,
    ) -> Result<Vec<RideParticipant>, ApiError> {
        parse_many(response)
    }

    fn get(&self, segments: &[&str]) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.url(segments))
    }

    /// Append percent-encoded `segments` to the base path.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Cannot fail: `normalize_base_url` only accepts http(s) URLs.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

fn parse_one<T: Decode>(response: &HttpResponse) -> Result<T, ApiError> {
    T::decode(response.json()?)
}

fn parse_many<T: Decode>(response: &HttpResponse) -> Result<Vec<T>, ApiError> {
    decode_list(response.json()?)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::SerializationError(e.to_string()))
}

fn normalize_base_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ApiError::InvalidUrl(format!(
            "{raw}: base url must use http or https"
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ApiError::InvalidUrl(format!(
            "{raw}: base url must not carry a query or fragment"
        )));
    }
    Ok(url)
}
