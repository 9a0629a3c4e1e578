//! In-memory rendition of the rideshare REST service.
//!
//! Serves every `/rest` endpoint the client consumes. State lives in one
//! `Store` behind a `RwLock`; sessions are opaque `USER_TOKEN` cookies.
//! Application failures answer with a 4xx status and an `{"error": ...}`
//! body, the shape the client decodes as a rejected outcome.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use cookie::{time::Duration, Cookie};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "USER_TOKEN";

/// Seconds a remembered session cookie lives.
const REMEMBER_MAX_AGE: i64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: String,
}

impl User {
    /// The user reported for requests without a session.
    pub fn anonymous() -> Self {
        Self {
            id: 0,
            username: "-".to_string(),
            role: "NONE".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Foo {
    pub id: i64,
    pub user_id: i64,
    pub payload: String,
    pub total: i64,
    /// Epoch milliseconds.
    pub created: i64,
}

#[derive(Deserialize)]
pub struct NewFoo {
    pub payload: String,
    #[serde(default)]
    pub total: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub ride_id: i64,
    pub departure_location: String,
    pub arrival_location: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub car_size: i64,
    pub driver_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRide {
    pub departure_location: String,
    pub arrival_location: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub car_size: i64,
    pub driver_id: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RidePerson {
    pub ride_id: i64,
    pub user_id: i64,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
    pub role: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub remember: bool,
}

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
pub struct Store {
    accounts: BTreeMap<i64, Account>,
    sessions: HashMap<String, i64>,
    foos: BTreeMap<i64, Foo>,
    locations: Vec<Location>,
    rides: BTreeMap<i64, Ride>,
    ride_people: Vec<RidePerson>,
    last_id: i64,
}

pub type Db = Arc<RwLock<Store>>;

pub const ROLES: [&str; 3] = ["ADMIN", "USER", "NONE"];

impl Store {
    /// Accounts `admin`/`password` (ADMIN) and `user`/`password` (USER),
    /// plus three locations.
    pub fn seeded() -> Self {
        let mut store = Store::default();
        store.insert_account("admin", "password", "ADMIN");
        store.insert_account("user", "password", "USER");
        store.locations = vec![
            location("Stockholm", 59.3293, 18.0686),
            location("Malmö", 55.6050, 13.0038),
            location("Lund", 55.7047, 13.1910),
        ];
        store
    }

    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn insert_account(&mut self, username: &str, password: &str, role: &str) -> User {
        let user = User {
            id: self.next_id(),
            username: username.to_string(),
            role: role.to_string(),
        };
        self.accounts.insert(
            user.id,
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.accounts
            .values()
            .any(|a| a.user.username == username && Some(a.user.id) != except)
    }

    fn session_user(&self, headers: &HeaderMap) -> Option<User> {
        let token = session_token(headers)?;
        let id = self.sessions.get(&token)?;
        self.accounts.get(id).map(|a| a.user.clone())
    }
}

fn location(name: &str, latitude: f64, longitude: f64) -> Location {
    Location {
        location: name.to_string(),
        latitude,
        longitude,
    }
}

pub fn app() -> Router {
    app_with(Store::seeded())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/rest/user", get(current_user).post(add_user))
        .route("/rest/user/login", post(login))
        .route("/rest/user/logout", post(logout))
        .route("/rest/user/all", get(list_users))
        .route("/rest/user/roles", get(list_roles))
        .route(
            "/rest/user/{key}",
            get(get_specific_user).put(put_user).delete(delete_user),
        )
        .route("/rest/foo", get(list_own_foos).post(add_foo))
        .route("/rest/foo/user/{user_id}", get(list_user_foos))
        .route("/rest/foo/{foo_id}", delete(delete_foo))
        .route("/rest/foo/{foo_id}/total/{total}", post(update_foo_total))
        .route("/rest/location/all", get(list_locations))
        .route("/rest/location/{name}", get(get_location))
        .route("/rest/ride", post(create_ride))
        .route("/rest/ride/all", get(list_rides))
        .route("/rest/ride/user/{user_id}", get(list_user_rides))
        .route("/rest/ride/delete/{ride_id}", delete(delete_ride))
        .route("/rest/ride/leave/{ride_id}/{user_id}", delete(leave_ride))
        .route("/rest/ride/{key}", post(join_ride))
        .route("/rest/ride/{key}/{departure}/{time}", get(search_rides))
        .route("/rest/rideperson/all/", get(list_ride_people))
        .route("/rest/rideperson/{ride_id}", get(list_travelers))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value_trimmed().to_string())
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

// --- users ---

async fn current_user(State(db): State<Db>, headers: HeaderMap) -> Json<User> {
    let store = db.read().await;
    Json(store.session_user(&headers).unwrap_or_else(User::anonymous))
}

async fn login(
    State(db): State<Db>,
    Query(query): Query<LoginQuery>,
    Json(input): Json<LoginRequest>,
) -> Response {
    let mut store = db.write().await;
    let account = store
        .accounts
        .values()
        .find(|a| a.user.username == input.username && a.password == input.password);
    let Some(user_id) = account.map(|a| a.user.id) else {
        return error(StatusCode::UNAUTHORIZED, "Wrong username or password");
    };

    let token = Uuid::new_v4().to_string();
    store.sessions.insert(token.clone(), user_id);
    info!(username = %input.username, remember = query.remember, "login");

    let mut cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true);
    if query.remember {
        cookie = cookie.max_age(Duration::seconds(REMEMBER_MAX_AGE));
    }
    let cookie = cookie.build().to_string();
    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]).into_response()
}

async fn logout(State(db): State<Db>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        db.write().await.sessions.remove(&token);
    }
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build()
        .to_string();
    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]).into_response()
}

async fn list_users(State(db): State<Db>) -> Json<Vec<User>> {
    let store = db.read().await;
    Json(store.accounts.values().map(|a| a.user.clone()).collect())
}

async fn list_roles() -> Json<Vec<&'static str>> {
    Json(ROLES.to_vec())
}

async fn add_user(State(db): State<Db>, Json(input): Json<Credentials>) -> Response {
    let mut store = db.write().await;
    if store.username_taken(&input.username, None) {
        return error(StatusCode::BAD_REQUEST, "Username already taken");
    }
    if !ROLES.contains(&input.role.as_str()) {
        return error(StatusCode::BAD_REQUEST, "Unknown role");
    }
    let Some(password) = input.password.filter(|p| !p.is_empty()) else {
        return error(StatusCode::BAD_REQUEST, "Password required");
    };
    let user = store.insert_account(&input.username, &password, &input.role);
    (StatusCode::CREATED, Json(user)).into_response()
}

async fn put_user(
    State(db): State<Db>,
    Path(key): Path<String>,
    Json(input): Json<Credentials>,
) -> Response {
    let Ok(id) = key.parse::<i64>() else {
        return error(StatusCode::BAD_REQUEST, "User id must be a number");
    };
    let mut store = db.write().await;
    if store.username_taken(&input.username, Some(id)) {
        return error(StatusCode::BAD_REQUEST, "Username already taken");
    }
    let Some(account) = store.accounts.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, "No such user");
    };
    account.user.username = input.username;
    account.user.role = input.role;
    if let Some(password) = input.password.filter(|p| !p.is_empty()) {
        account.password = password;
    }
    Json(account.user.clone()).into_response()
}

async fn delete_user(State(db): State<Db>, Path(username): Path<String>) -> StatusCode {
    let mut store = db.write().await;
    let Some(id) = store
        .accounts
        .values()
        .find(|a| a.user.username == username)
        .map(|a| a.user.id)
    else {
        return StatusCode::NOT_FOUND;
    };
    store.accounts.remove(&id);
    store.sessions.retain(|_, user_id| *user_id != id);
    StatusCode::NO_CONTENT
}

async fn get_specific_user(State(db): State<Db>, Path(key): Path<String>) -> Response {
    let Ok(id) = key.parse::<i64>() else {
        return error(StatusCode::BAD_REQUEST, "User id must be a number");
    };
    let store = db.read().await;
    match store.accounts.get(&id) {
        Some(account) => Json(account.user.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "No such user"),
    }
}

// --- foos ---

async fn list_own_foos(State(db): State<Db>, headers: HeaderMap) -> Response {
    let store = db.read().await;
    let Some(user) = store.session_user(&headers) else {
        return error(StatusCode::UNAUTHORIZED, "Not logged in");
    };
    let foos: Vec<Foo> = store
        .foos
        .values()
        .filter(|f| f.user_id == user.id)
        .cloned()
        .collect();
    Json(foos).into_response()
}

async fn list_user_foos(State(db): State<Db>, Path(user_id): Path<i64>) -> Json<Vec<Foo>> {
    let store = db.read().await;
    Json(
        store
            .foos
            .values()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect(),
    )
}

async fn add_foo(State(db): State<Db>, headers: HeaderMap, Json(input): Json<NewFoo>) -> Response {
    let mut store = db.write().await;
    let Some(user) = store.session_user(&headers) else {
        return error(StatusCode::UNAUTHORIZED, "Not logged in");
    };
    let foo = Foo {
        id: store.next_id(),
        user_id: user.id,
        payload: input.payload,
        total: input.total,
        created: now_millis(),
    };
    store.foos.insert(foo.id, foo.clone());
    (StatusCode::CREATED, Json(foo)).into_response()
}

async fn delete_foo(State(db): State<Db>, Path(foo_id): Path<i64>) -> StatusCode {
    let mut store = db.write().await;
    match store.foos.remove(&foo_id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn update_foo_total(
    State(db): State<Db>,
    Path((foo_id, total)): Path<(i64, i64)>,
) -> Response {
    let mut store = db.write().await;
    let Some(foo) = store.foos.get_mut(&foo_id) else {
        return error(StatusCode::NOT_FOUND, "No such foo");
    };
    foo.total = total;
    Json(foo.clone()).into_response()
}

// --- locations ---

async fn list_locations(State(db): State<Db>) -> Json<Vec<Location>> {
    Json(db.read().await.locations.clone())
}

async fn get_location(State(db): State<Db>, Path(name): Path<String>) -> Response {
    let store = db.read().await;
    match store.locations.iter().find(|l| l.location == name) {
        Some(location) => Json(location.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "No such location"),
    }
}

// --- rides ---

async fn create_ride(State(db): State<Db>, Json(input): Json<NewRide>) -> Json<Ride> {
    let mut store = db.write().await;
    let ride = Ride {
        ride_id: store.next_id(),
        departure_location: input.departure_location,
        arrival_location: input.arrival_location,
        departure_time: input.departure_time,
        arrival_time: input.arrival_time,
        car_size: input.car_size,
        driver_id: input.driver_id,
        role: None,
    };
    store.rides.insert(ride.ride_id, ride.clone());
    Json(ride)
}

async fn list_rides(State(db): State<Db>) -> Json<Vec<Ride>> {
    Json(db.read().await.rides.values().cloned().collect())
}

/// Rides driven by the user, then rides they joined as a passenger.
async fn list_user_rides(State(db): State<Db>, Path(user_id): Path<i64>) -> Json<Vec<Ride>> {
    let store = db.read().await;
    let driving = store
        .rides
        .values()
        .filter(|r| r.driver_id == user_id)
        .map(|r| with_role(r, "Driver"));
    let riding = store
        .ride_people
        .iter()
        .filter(|p| p.user_id == user_id)
        .filter_map(|p| store.rides.get(&p.ride_id))
        .map(|r| with_role(r, "Passenger"));
    Json(driving.chain(riding).collect())
}

fn with_role(ride: &Ride, role: &str) -> Ride {
    Ride {
        role: Some(role.to_string()),
        ..ride.clone()
    }
}

async fn join_ride(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(ride_id): Path<i64>,
) -> Response {
    let mut store = db.write().await;
    let Some(user) = store.session_user(&headers) else {
        return error(StatusCode::UNAUTHORIZED, "Not logged in");
    };
    if store
        .ride_people
        .iter()
        .any(|p| p.ride_id == ride_id && p.user_id == user.id)
    {
        return error(StatusCode::BAD_REQUEST, "Already joined");
    }
    let Some(ride) = store.rides.get_mut(&ride_id) else {
        return error(StatusCode::NOT_FOUND, "No such ride");
    };
    if ride.car_size <= 0 {
        return error(StatusCode::BAD_REQUEST, "Ride is full");
    }
    ride.car_size -= 1;
    let ride = ride.clone();
    store.ride_people.push(RidePerson {
        ride_id,
        user_id: user.id,
    });
    Json(ride).into_response()
}

async fn delete_ride(State(db): State<Db>, Path(ride_id): Path<i64>) -> StatusCode {
    let mut store = db.write().await;
    if store.rides.remove(&ride_id).is_none() {
        return StatusCode::NOT_FOUND;
    }
    store.ride_people.retain(|p| p.ride_id != ride_id);
    StatusCode::NO_CONTENT
}

async fn leave_ride(
    State(db): State<Db>,
    Path((ride_id, user_id)): Path<(i64, i64)>,
) -> StatusCode {
    let mut store = db.write().await;
    let before = store.ride_people.len();
    store
        .ride_people
        .retain(|p| !(p.ride_id == ride_id && p.user_id == user_id));
    if store.ride_people.len() == before {
        return StatusCode::NOT_FOUND;
    }
    if let Some(ride) = store.rides.get_mut(&ride_id) {
        ride.car_size += 1;
    }
    StatusCode::NO_CONTENT
}

/// Rides between the two locations leaving no earlier than `time`.
async fn search_rides(
    State(db): State<Db>,
    Path((arrival, departure, time)): Path<(String, String, String)>,
) -> Json<Vec<Ride>> {
    let store = db.read().await;
    Json(
        store
            .rides
            .values()
            .filter(|r| r.arrival_location == arrival && r.departure_location == departure)
            .filter(|r| r.departure_time.as_str() >= time.as_str())
            .cloned()
            .collect(),
    )
}

async fn list_ride_people(State(db): State<Db>) -> Json<Vec<RidePerson>> {
    Json(db.read().await.ride_people.clone())
}

async fn list_travelers(State(db): State<Db>, Path(ride_id): Path<i64>) -> Json<Vec<RidePerson>> {
    let store = db.read().await;
    Json(
        store
            .ride_people
            .iter()
            .filter(|p| p.ride_id == ride_id)
            .cloned()
            .collect(),
    )
}
