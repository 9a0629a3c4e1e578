//! Domain entities and request payloads for the rideshare API.
//!
//! # Design
//! Each entity is a typed view over the JSON object it was decoded from. The
//! object is kept whole, so keys the client does not know about survive
//! decoding and serialize back out unchanged. Typed accessors read from that
//! object and return `None` when a key is missing or has an unexpected type.
//! The only derived state is `Foo::created_date` and `User::role`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::decode::{into_object, Decode};
use crate::error::ApiError;

/// Read access to the JSON object an entity was decoded from.
pub trait JsonFields {
    fn fields(&self) -> &Map<String, Value>;

    fn get(&self, key: &str) -> Option<&Value> {
        self.fields().get(key)
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }
}

macro_rules! json_view {
    ($ty:ty) => {
        impl JsonFields for $ty {
            fn fields(&self) -> &Map<String, Value> {
                &self.fields
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                self.fields.serialize(serializer)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Foo
// ---------------------------------------------------------------------------

/// A generic expense-like record owned by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Foo {
    fields: Map<String, Value>,
    created_date: Option<DateTime<Utc>>,
}

impl Foo {
    pub fn id(&self) -> Option<i64> {
        self.get_i64("id")
    }

    pub fn user_id(&self) -> Option<i64> {
        self.get_i64("userId")
    }

    pub fn payload(&self) -> Option<&str> {
        self.get_str("payload")
    }

    pub fn total(&self) -> Option<i64> {
        self.get_i64("total")
    }

    /// The `created` timestamp as a date: epoch milliseconds or RFC 3339.
    pub fn created_date(&self) -> Option<DateTime<Utc>> {
        self.created_date
    }

    /// The payload this record was decoded from.
    pub fn json(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

json_view!(Foo);

impl Decode for Foo {
    fn decode(json: Value) -> Result<Self, ApiError> {
        let fields = into_object(json, "foo")?;
        let created_date = fields.get("created").and_then(parse_created);
        Ok(Self {
            fields,
            created_date,
        })
    }
}

fn parse_created(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|ms| ms as i64))
            .and_then(DateTime::from_timestamp_millis),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|date| date.with_timezone(&Utc)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// A user role, built from its canonical upper-case name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Role {
    name: String,
    label: String,
}

impl Role {
    pub const ADMIN: &'static str = "ADMIN";
    pub const USER: &'static str = "USER";
    pub const NONE: &'static str = "NONE";

    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let label = label_for(&name);
        Self { name, label }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display form: `ADMIN` becomes `Admin`.
    pub fn label(&self) -> &str {
        &self.label
    }
}

fn label_for(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => {
            let mut label = first.to_string();
            label.push_str(&chars.as_str().to_lowercase());
            label
        }
        None => String::new(),
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Role::new(name)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.name
    }
}

impl Decode for Role {
    fn decode(json: Value) -> Result<Self, ApiError> {
        match json {
            Value::String(name) => Ok(Role::new(name)),
            other => Err(ApiError::DeserializationError(format!(
                "role must be a string, got {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// An account. `role` is re-derived from the raw `role` string; the raw
/// payload stays available through `json()`.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    fields: Map<String, Value>,
    role: Role,
}

impl User {
    pub fn id(&self) -> Option<i64> {
        self.get_i64("id")
    }

    pub fn username(&self) -> Option<&str> {
        self.get_str("username")
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role.name() == Role::ADMIN
    }

    pub fn is_none(&self) -> bool {
        self.role.name() == Role::NONE
    }

    pub fn json(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

json_view!(User);

impl Decode for User {
    fn decode(json: Value) -> Result<Self, ApiError> {
        let fields = into_object(json, "user")?;
        let role = match fields.get("role") {
            Some(Value::String(name)) => Role::new(name.as_str()),
            Some(other) => {
                return Err(ApiError::DeserializationError(format!(
                    "user role must be a string, got {other}"
                )))
            }
            None => {
                return Err(ApiError::DeserializationError(
                    "user has no role".to_string(),
                ))
            }
        };
        Ok(Self { fields, role })
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A named place rides depart from or arrive at.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    fields: Map<String, Value>,
}

impl Location {
    pub fn location(&self) -> Option<&str> {
        self.get_str("location")
    }

    pub fn latitude(&self) -> Option<f64> {
        self.get("latitude").and_then(Value::as_f64)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.get("longitude").and_then(Value::as_f64)
    }

    pub fn json(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

json_view!(Location);

impl Decode for Location {
    fn decode(json: Value) -> Result<Self, ApiError> {
        Ok(Self {
            fields: into_object(json, "location")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Ride
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Ride {
    fields: Map<String, Value>,
}

impl Ride {
    pub fn id(&self) -> Option<i64> {
        self.get_i64("rideId").or_else(|| self.get_i64("id"))
    }

    pub fn departure_location(&self) -> Option<&str> {
        self.get_str("departureLocation")
    }

    pub fn arrival_location(&self) -> Option<&str> {
        self.get_str("arrivalLocation")
    }

    pub fn departure_time(&self) -> Option<&str> {
        self.get_str("departureTime")
    }

    pub fn arrival_time(&self) -> Option<&str> {
        self.get_str("arrivalTime")
    }

    /// Free seats left in the car.
    pub fn car_size(&self) -> Option<i64> {
        self.get_i64("carSize")
    }

    pub fn driver_id(&self) -> Option<i64> {
        self.get_i64("driverId")
    }

    /// `Driver` or `Passenger` when the ride was listed for a specific user.
    pub fn role(&self) -> Option<&str> {
        self.get_str("role")
    }
}

json_view!(Ride);

impl Decode for Ride {
    fn decode(json: Value) -> Result<Self, ApiError> {
        Ok(Self {
            fields: into_object(json, "ride")?,
        })
    }
}

// ---------------------------------------------------------------------------
// RideParticipant
// ---------------------------------------------------------------------------

/// Links a ride to one of its passengers.
#[derive(Debug, Clone, PartialEq)]
pub struct RideParticipant {
    fields: Map<String, Value>,
}

impl RideParticipant {
    pub fn ride_id(&self) -> Option<i64> {
        self.get_i64("rideId")
    }

    pub fn user_id(&self) -> Option<i64> {
        self.get_i64("userId")
    }
}

json_view!(RideParticipant);

impl Decode for RideParticipant {
    fn decode(json: Value) -> Result<Self, ApiError> {
        Ok(Self {
            fields: into_object(json, "ride participant")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Payload for creating or updating a user. A missing password leaves the
/// stored one unchanged on update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewRide {
    pub departure_location: String,
    pub arrival_location: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub car_size: i64,
    pub driver_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JoinRide {
    pub ride_id: i64,
}
