//! Named operations of the rideshare API.
//!
//! Each method is build → fetch → parse: `RestClient` describes the request,
//! `Fetcher` performs it under the session credential policy, and the
//! matching `RestClient::parse_*` decodes the body. Operations that do not
//! decode a body return the raw `HttpResponse`.

use std::sync::Arc;

use serde::Serialize;

use crate::client::RestClient;
use crate::config::ClientConfig;
use crate::decode::Outcome;
use crate::error::ApiError;
use crate::fetch::Fetcher;
use crate::http::HttpResponse;
use crate::report::{FailureReporter, LogReporter};
use crate::session::Session;
use crate::transport::{Transport, UreqTransport};
use crate::types::{Credentials, Foo, Location, NewRide, Ride, RideParticipant, Role, User};

pub struct RideshareApi<T = UreqTransport> {
    client: RestClient,
    fetcher: Fetcher<T>,
}

impl RideshareApi<UreqTransport> {
    /// Real network transport; failures are reported through `tracing`.
    pub fn connect(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::with_transport(&config.base_url, UreqTransport::new(), LogReporter)
    }
}

impl<T: Transport> RideshareApi<T> {
    pub fn with_transport(
        base_url: &str,
        transport: T,
        reporter: impl FailureReporter + 'static,
    ) -> Result<Self, ApiError> {
        let client = RestClient::new(base_url)?;
        let session = Arc::new(Session::new(client.base_url()));
        Ok(Self {
            fetcher: Fetcher::new(transport, reporter, session),
            client,
        })
    }

    pub fn client(&self) -> &RestClient {
        &self.client
    }

    pub fn session(&self) -> &Arc<Session> {
        self.fetcher.session()
    }

    // --- users ---

    /// The user of the current session; the `NONE` role when logged out.
    pub fn get_user(&self) -> Result<User, ApiError> {
        let response = self.fetcher.fetch(self.client.build_get_user())?;
        self.client.parse_user(&response)
    }

    pub fn login(
        &self,
        username: &str,
        password: &str,
        remember: bool,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.client.build_login(username, password, remember)?;
        self.fetcher.fetch(request)
    }

    pub fn logout(&self) -> Result<HttpResponse, ApiError> {
        self.fetcher.fetch(self.client.build_logout())
    }

    pub fn get_users(&self) -> Result<Vec<User>, ApiError> {
        let response = self.fetcher.fetch(self.client.build_get_users())?;
        self.client.parse_users(&response)
    }

    pub fn get_roles(&self) -> Result<Vec<Role>, ApiError> {
        let response = self.fetcher.fetch(self.client.build_get_roles())?;
        self.client.parse_roles(&response)
    }

    pub fn add_user(&self, credentials: &Credentials) -> Result<Outcome<User>, ApiError> {
        let response = self.fetcher.fetch(self.client.build_add_user(credentials)?)?;
        self.client.parse_user_or_error(&response)
    }

    pub fn put_user(&self, id: i64, credentials: &Credentials) -> Result<Outcome<User>, ApiError> {
        let response = self
            .fetcher
            .fetch(self.client.build_put_user(id, credentials)?)?;
        self.client.parse_user_or_error(&response)
    }

    pub fn delete_user(&self, username: &str) -> Result<HttpResponse, ApiError> {
        self.fetcher.fetch(self.client.build_delete_user(username))
    }

    pub fn get_specific_user(&self, user_id: i64) -> Result<User, ApiError> {
        let response = self
            .fetcher
            .fetch(self.client.build_get_specific_user(user_id))?;
        self.client.parse_user(&response)
    }

    // --- foos ---

    pub fn get_foos(&self, user_id: Option<i64>) -> Result<Vec<Foo>, ApiError> {
        let response = self.fetcher.fetch(self.client.build_get_foos(user_id))?;
        self.client.parse_foos(&response)
    }

    pub fn add_foo<F: Serialize>(&self, foo: &F) -> Result<Foo, ApiError> {
        let response = self.fetcher.fetch(self.client.build_add_foo(foo)?)?;
        self.client.parse_foo(&response)
    }

    pub fn delete_foo(&self, foo_id: i64) -> Result<HttpResponse, ApiError> {
        self.fetcher.fetch(self.client.build_delete_foo(foo_id))
    }

    /// Resolves to `total` once the request went through, whatever the body says.
    pub fn update_foo(&self, foo_id: i64, total: i64) -> Result<i64, ApiError> {
        let response = self
            .fetcher
            .fetch(self.client.build_update_foo(foo_id, total))?;
        Ok(self.client.parse_update_foo(&response, total))
    }

    // --- locations ---

    pub fn get_locations(&self) -> Result<Vec<Location>, ApiError> {
        let response = self.fetcher.fetch(self.client.build_get_locations())?;
        self.client.parse_locations(&response)
    }

    pub fn get_location(&self, location: &str) -> Result<Location, ApiError> {
        let response = self.fetcher.fetch(self.client.build_get_location(location))?;
        self.client.parse_location(&response)
    }

    // --- rides ---

    pub fn create_ride(&self, ride: &NewRide) -> Result<Ride, ApiError> {
        let response = self.fetcher.fetch(self.client.build_create_ride(ride)?)?;
        self.client.parse_ride(&response)
    }

    pub fn get_rides(&self) -> Result<Vec<Ride>, ApiError> {
        let response = self.fetcher.fetch(self.client.build_get_rides())?;
        self.client.parse_rides(&response)
    }

    pub fn get_user_rides(&self, user_id: i64) -> Result<Vec<Ride>, ApiError> {
        let response = self.fetcher.fetch(self.client.build_get_user_rides(user_id))?;
        self.client.parse_rides(&response)
    }

    pub fn join_ride(&self, ride_id: i64) -> Result<Ride, ApiError> {
        let response = self.fetcher.fetch(self.client.build_join_ride(ride_id)?)?;
        self.client.parse_ride(&response)
    }

    pub fn delete_ride(&self, ride_id: i64) -> Result<HttpResponse, ApiError> {
        self.fetcher.fetch(self.client.build_delete_ride(ride_id))
    }

    pub fn leave_ride(&self, ride_id: i64, user_id: i64) -> Result<HttpResponse, ApiError> {
        self.fetcher
            .fetch(self.client.build_leave_ride(ride_id, user_id))
    }

    pub fn get_all_travelers(&self, ride_id: i64) -> Result<Vec<RideParticipant>, ApiError> {
        let response = self
            .fetcher
            .fetch(self.client.build_get_all_travelers(ride_id))?;
        self.client.parse_ride_participants(&response)
    }

    pub fn get_ride_person_rides(&self) -> Result<Vec<RideParticipant>, ApiError> {
        let response = self
            .fetcher
            .fetch(self.client.build_get_ride_person_rides())?;
        self.client.parse_ride_participants(&response)
    }

    pub fn search_relevant_rides(
        &self,
        arrival_location: &str,
        departure_location: &str,
        departure_time: &str,
    ) -> Result<Vec<Ride>, ApiError> {
        let request = self.client.build_search_relevant_rides(
            arrival_location,
            departure_location,
            departure_time,
        );
        let response = self.fetcher.fetch(request)?;
        self.client.parse_rides(&response)
    }
}
