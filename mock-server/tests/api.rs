use axum::http::{self, header, Request, StatusCode};
use axum::response::Response;
use axum::routing::RouterIntoService;
use http_body_util::BodyExt;
use mock_server::{app, Foo, Location, Ride, RidePerson, User};
use tower::{Service, ServiceExt};

async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json;charset=utf-8")
        .body(body.to_string())
        .unwrap()
}

fn request(method: &str, uri: &str, cookie: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(String::new()).unwrap()
}

fn with_cookie(mut req: Request<String>, cookie: &str) -> Request<String> {
    req.headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    req
}

async fn send(app: &mut RouterIntoService<String>, req: Request<String>) -> Response {
    ServiceExt::ready(app).await.unwrap().call(req).await.unwrap()
}

/// Log in and return the `name=value` part of the session cookie.
async fn login(app: &mut RouterIntoService<String>, username: &str) -> String {
    let body = format!(r#"{{"username":"{username}","password":"password"}}"#);
    let resp = send(app, json_request("POST", "/rest/user/login?remember=false", &body)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
    cookie.split(';').next().unwrap().to_string()
}

// --- users ---

#[tokio::test]
async fn current_user_without_session_is_anonymous() {
    let resp = app()
        .oneshot(request("GET", "/rest/user", None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let user: User = body_json(resp).await;
    assert_eq!(user, User::anonymous());
}

#[tokio::test]
async fn roles_are_bare_strings() {
    let resp = app()
        .oneshot(request("GET", "/rest/user/roles", None))
        .await
        .unwrap();

    let roles: Vec<String> = body_json(resp).await;
    assert_eq!(roles, ["ADMIN", "USER", "NONE"]);
}

#[tokio::test]
async fn list_users_returns_seeded_accounts() {
    let resp = app()
        .oneshot(request("GET", "/rest/user/all", None))
        .await
        .unwrap();

    let users: Vec<User> = body_json(resp).await;
    let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, ["admin", "user"]);
}

#[tokio::test]
async fn wrong_password_returns_error_body() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/rest/user/login?remember=true",
            r#"{"username":"admin","password":"nope"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"], "Wrong username or password");
}

#[tokio::test]
async fn remembered_login_sets_max_age() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/rest/user/login?remember=true",
            r#"{"username":"admin","password":"password"}"#,
        ))
        .await
        .unwrap();

    let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("USER_TOKEN="));
    assert!(cookie.contains("Max-Age=2592000"));
}

#[tokio::test]
async fn duplicate_username_returns_error_body() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/rest/user",
            r#"{"username":"admin","password":"pw","role":"USER"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"], "Username already taken");
}

#[tokio::test]
async fn specific_user_needs_numeric_id() {
    let resp = app()
        .oneshot(request("GET", "/rest/user/abc", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app()
        .oneshot(request("GET", "/rest/user/1", None))
        .await
        .unwrap();
    let user: User = body_json(resp).await;
    assert_eq!(user.username, "admin");
}

#[tokio::test]
async fn delete_unknown_user_returns_404() {
    let resp = app()
        .oneshot(request("DELETE", "/rest/user/nobody", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- locations ---

#[tokio::test]
async fn location_lookup_decodes_path() {
    let resp = app()
        .oneshot(request("GET", "/rest/location/Malm%C3%B6", None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let location: Location = body_json(resp).await;
    assert_eq!(location.location, "Malmö");
}

#[tokio::test]
async fn unknown_location_returns_error_body() {
    let resp = app()
        .oneshot(request("GET", "/rest/location/Atlantis", None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"], "No such location");
}

// --- foos ---

#[tokio::test]
async fn own_foos_need_a_session() {
    let resp = app()
        .oneshot(request("GET", "/rest/foo", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_and_foo_lifecycle() {
    let mut app = app().into_service();

    let cookie = login(&mut app, "admin").await;
    let resp = send(&mut app, request("GET", "/rest/user", Some(cookie.as_str()))).await;
    let me: User = body_json(resp).await;
    assert_eq!(me.role, "ADMIN");

    // create
    let req = with_cookie(
        json_request("POST", "/rest/foo", r#"{"payload":"fuel","total":100}"#),
        &cookie,
    );
    let resp = send(&mut app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let foo: Foo = body_json(resp).await;
    assert_eq!(foo.user_id, me.id);
    assert!(foo.created > 0);

    // update total
    let uri = format!("/rest/foo/{}/total/250", foo.id);
    let resp = send(&mut app, request("POST", &uri, Some(cookie.as_str()))).await;
    let updated: Foo = body_json(resp).await;
    assert_eq!(updated.total, 250);

    // list for the user
    let uri = format!("/rest/foo/user/{}", me.id);
    let resp = send(&mut app, request("GET", &uri, None)).await;
    let foos: Vec<Foo> = body_json(resp).await;
    assert_eq!(foos, [updated]);

    // delete
    let uri = format!("/rest/foo/{}", foo.id);
    let resp = send(&mut app, request("DELETE", &uri, None)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // logout clears the cookie and the session
    let resp = send(&mut app, request("POST", "/rest/user/logout", Some(cookie.as_str()))).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let cleared = resp.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let resp = send(&mut app, request("GET", "/rest/user", Some(cookie.as_str()))).await;
    let me: User = body_json(resp).await;
    assert_eq!(me.role, "NONE");
}

// --- rides ---

#[tokio::test]
async fn ride_lifecycle() {
    let mut app = app().into_service();

    let ride = r#"{"departureLocation":"Lund","arrivalLocation":"Malmö",
        "departureTime":"2018-11-08 09:00","arrivalTime":"2018-11-08 10:00",
        "carSize":1,"driverId":1}"#;
    let resp = send(&mut app, json_request("POST", "/rest/ride", ride)).await;
    let created: Ride = body_json(resp).await;
    assert_eq!(created.car_size, 1);
    let id = created.ride_id;

    // joining needs a session
    let uri = format!("/rest/ride/{id}");
    let join_body = format!(r#"{{"rideId":{id}}}"#);
    let resp = send(&mut app, json_request("POST", &uri, &join_body)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let cookie = login(&mut app, "user").await;
    let resp = send(&mut app, with_cookie(json_request("POST", &uri, &join_body), &cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let joined: Ride = body_json(resp).await;
    assert_eq!(joined.car_size, 0);

    let resp = send(&mut app, with_cookie(json_request("POST", &uri, &join_body), &cookie)).await;
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"], "Already joined");

    // participants
    let resp = send(&mut app, request("GET", &format!("/rest/rideperson/{id}"), None)).await;
    let travelers: Vec<RidePerson> = body_json(resp).await;
    assert_eq!(travelers, [RidePerson { ride_id: id, user_id: 2 }]);

    let resp = send(&mut app, request("GET", "/rest/rideperson/all/", None)).await;
    let everyone: Vec<RidePerson> = body_json(resp).await;
    assert_eq!(everyone.len(), 1);

    // user rides carry the participation role
    let resp = send(&mut app, request("GET", "/rest/ride/user/2", None)).await;
    let rides: Vec<Ride> = body_json(resp).await;
    assert_eq!(rides[0].role.as_deref(), Some("Passenger"));
    let resp = send(&mut app, request("GET", "/rest/ride/user/1", None)).await;
    let rides: Vec<Ride> = body_json(resp).await;
    assert_eq!(rides[0].role.as_deref(), Some("Driver"));

    // search
    let resp = send(
        &mut app,
        request("GET", "/rest/ride/Malm%C3%B6/Lund/2018-11-08", None),
    )
    .await;
    let found: Vec<Ride> = body_json(resp).await;
    assert_eq!(found.len(), 1);
    let resp = send(
        &mut app,
        request("GET", "/rest/ride/Lund/Malm%C3%B6/2018-11-08", None),
    )
    .await;
    let found: Vec<Ride> = body_json(resp).await;
    assert!(found.is_empty());

    // leave frees the seat
    let uri = format!("/rest/ride/leave/{id}/2");
    let resp = send(&mut app, request("DELETE", &uri, None)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = send(&mut app, request("DELETE", &uri, None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&mut app, request("GET", "/rest/ride/all", None)).await;
    let rides: Vec<Ride> = body_json(resp).await;
    assert_eq!(rides[0].car_size, 1);

    // delete
    let uri = format!("/rest/ride/delete/{id}");
    let resp = send(&mut app, request("DELETE", &uri, None)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = send(&mut app, request("GET", "/rest/ride/all", None)).await;
    let rides: Vec<Ride> = body_json(resp).await;
    assert!(rides.is_empty());
}
