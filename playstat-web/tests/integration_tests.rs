use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use playstat_db::{Database, SessionCache};
use playstat_web::config::Config;
use playstat_web::create_app;
use serde_json::{Value, json};
use tower::ServiceExt;
// for `oneshot` method

const ADMIN_TOKEN: &str = "admin-secret-token";

/// Helper to create test database with in-memory SQLite
async fn setup_test_db() -> Database {
    Database::open_in_memory()
        .await
        .expect("Failed to create in-memory database")
}

/// Test configuration: rate limiting needs a peer address, which `oneshot` requests lack
fn test_config() -> Config {
    Config {
        admin_token: Some(ADMIN_TOKEN.to_string()),
        rate_limit_enabled: false,
        ..Config::default()
    }
}

/// Helper to create app with default test configuration
fn create_test_app(db: Database) -> axum::Router {
    create_app(db, SessionCache::new(), &test_config()).expect("Failed to create app")
}

/// Helper to send a request and get response
async fn send_request(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    auth_token: Option<&str>,
) -> (StatusCode, Value) {
    let (status, _location, json) = send_request_with_location(app, method, uri, body, auth_token).await;
    (status, json)
}

/// Like [`send_request`], also returning the `Location` header
async fn send_request_with_location(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    auth_token: Option<&str>,
) -> (StatusCode, Option<String>, Value) {
    let mut request_builder = Request::builder().uri(uri).method(method);

    // Add Authorization header if provided
    if let Some(token) = auth_token {
        request_builder = request_builder.header("Authorization", format!("Bearer {}", token));
    }

    // Build request with body
    let request = if let Some(json_body) = body {
        request_builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&json_body).unwrap()))
            .unwrap()
    } else {
        request_builder.body(Body::empty()).unwrap()
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|value| value.to_str().unwrap().to_string());
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    // Try to parse as JSON, or return empty object
    let json = if body_bytes.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(json!({}))
    };

    (status, location, json)
}

/// Connect a server through the admin route and return (server_uuid, api_key)
async fn connect_server(app: &axum::Router, name: &str) -> (String, String) {
    let (status, body) = send_request(
        app.clone(),
        "POST",
        "/connect",
        Some(json!({ "name": name })),
        Some(ADMIN_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        body["server_uuid"].as_str().unwrap().to_string(),
        body["api_key"].as_str().unwrap().to_string(),
    )
}

/// Register a web user and return the token to browse with
async fn register_web_user(app: &axum::Router, username: &str, permissions: &[&str], linked_uuid: Option<&str>) -> String {
    let token = format!("{username}-token-0123456789");
    let (status, _) = send_request(
        app.clone(),
        "POST",
        "/users",
        Some(json!({
            "username": username,
            "token": token,
            "permissions": permissions,
            "linked_uuid": linked_uuid,
        })),
        Some(ADMIN_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    token
}

async fn join(app: &axum::Router, api_key: &str, uuid: &str, name: &str) -> StatusCode {
    let (status, _) = send_request(
        app.clone(),
        "POST",
        "/join",
        Some(json!({
            "uuid": uuid,
            "name": name,
            "join_address": "play.example.com",
            "geolocation": "Finland",
            "world": "world",
            "gamemode": "SURVIVAL",
        })),
        Some(api_key),
    )
    .await;
    status
}

const STEVE: &str = "6f9a4d5e-2c3b-4a1d-9e8f-7a6b5c4d3e2f";
const ALEX: &str = "0b1c2d3e-4f5a-4b6c-8d7e-9f0a1b2c3d4e";

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    // GIVEN: A running application
    let app = create_test_app(setup_test_db().await);

    // WHEN: Making a GET request to /health
    let (status, _body) = send_request(app, "GET", "/health", None, None).await;

    // THEN: Should return 200 OK
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_endpoint_with_post_method() {
    // GIVEN: A running application
    let app = create_test_app(setup_test_db().await);

    // WHEN: Making a POST request to /health (wrong method)
    let (status, _body) = send_request(app, "POST", "/health", None, None).await;

    // THEN: Should return 405 Method Not Allowed
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// ADMIN ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_connect_returns_uuid_and_api_key() {
    // GIVEN: A running application
    let app = create_test_app(setup_test_db().await);

    // WHEN: Connecting a server with the admin token
    let (status, body) = send_request(
        app,
        "POST",
        "/connect",
        Some(json!({ "name": "Survival", "proxy": false })),
        Some(ADMIN_TOKEN),
    )
    .await;

    // THEN: Should return the new server's UUID and API key
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["server_uuid"].as_str().is_some());
    assert!(body["api_key"].as_str().unwrap().starts_with("playstat-sk-"));
}

#[tokio::test]
async fn test_connect_with_wrong_admin_token() {
    // GIVEN: A running application
    let app = create_test_app(setup_test_db().await);

    // WHEN: Connecting with a token that is not the admin token
    let (status, body) = send_request(
        app,
        "POST",
        "/connect",
        Some(json!({ "name": "Survival" })),
        Some("not-the-admin-token"),
    )
    .await;

    // THEN: Should return 401 Unauthorized
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication required");
}

#[tokio::test]
async fn test_connect_duplicate_name_conflicts() {
    // GIVEN: A server named "Survival" is already connected
    let app = create_test_app(setup_test_db().await);
    connect_server(&app, "Survival").await;

    // WHEN: Connecting another server with the same name
    let (status, body) = send_request(
        app,
        "POST",
        "/connect",
        Some(json!({ "name": "Survival" })),
        Some(ADMIN_TOKEN),
    )
    .await;

    // THEN: Should return 409 Conflict
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "A server with this name already exists");
}

#[tokio::test]
async fn test_register_web_user_rejects_unknown_permission() {
    // GIVEN: A running application
    let app = create_test_app(setup_test_db().await);

    // WHEN: Registering a user with a permission that does not exist
    let (status, body) = send_request(
        app,
        "POST",
        "/users",
        Some(json!({
            "username": "admin",
            "token": "a-long-enough-token",
            "permissions": ["page.everything"],
        })),
        Some(ADMIN_TOKEN),
    )
    .await;

    // THEN: Should return 400 Bad Request
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("page.everything"));
}

// =============================================================================
// INGEST ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_join_with_invalid_api_key() {
    // GIVEN: No server owns the presented API key
    let app = create_test_app(setup_test_db().await);

    // WHEN: Reporting a join
    let status = join(&app, "playstat-sk-unknown", STEVE, "Steve").await;

    // THEN: Should return 401 Unauthorized
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_join_with_invalid_player_name() {
    // GIVEN: A connected server
    let app = create_test_app(setup_test_db().await);
    let (_, api_key) = connect_server(&app, "Survival").await;

    // WHEN: Reporting a join with a name Minecraft would never send
    let status = join(&app, &api_key, STEVE, "Steve The Builder").await;

    // THEN: Should return 400 Bad Request
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_join_then_leave_stores_session() {
    // GIVEN: A player joined a connected server
    let app = create_test_app(setup_test_db().await);
    let (_, api_key) = connect_server(&app, "Survival").await;
    assert_eq!(join(&app, &api_key, STEVE, "Steve").await, StatusCode::OK);

    // WHEN: The player leaves twice
    let (first, _) = send_request(app.clone(), "POST", "/leave", Some(json!({ "uuid": STEVE })), Some(&api_key)).await;
    let (second, body) = send_request(app, "POST", "/leave", Some(json!({ "uuid": STEVE })), Some(&api_key)).await;

    // THEN: The first leave ends the session, the second finds none
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Player has no active session");
}

#[tokio::test]
async fn test_kill_without_session() {
    // GIVEN: A connected server with nobody online
    let app = create_test_app(setup_test_db().await);
    let (_, api_key) = connect_server(&app, "Survival").await;

    // WHEN: Reporting a mob kill
    let (status, _) = send_request(app, "POST", "/kill", Some(json!({ "killer": STEVE })), Some(&api_key)).await;

    // THEN: Should return 404 Not Found
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_for_unknown_player() {
    // GIVEN: A connected server that never saw the player
    let app = create_test_app(setup_test_db().await);
    let (_, api_key) = connect_server(&app, "Survival").await;

    // WHEN: Marking the player as banned
    let (status, _) = send_request(
        app,
        "POST",
        "/status",
        Some(json!({ "uuid": STEVE, "banned": true })),
        Some(&api_key),
    )
    .await;

    // THEN: Should return 404 Not Found
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_ping_is_rejected() {
    // GIVEN: A connected server
    let app = create_test_app(setup_test_db().await);
    let (_, api_key) = connect_server(&app, "Survival").await;

    // WHEN: Reporting a ping whose minimum exceeds its maximum
    let (status, _) = send_request(
        app,
        "POST",
        "/ping",
        Some(json!({ "uuid": STEVE, "min": 80, "max": 20, "avg": 50.0 })),
        Some(&api_key),
    )
    .await;

    // THEN: Should return 400 Bad Request
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// RESOLVER ROUTE TESTS
// =============================================================================

#[tokio::test]
async fn test_root_redirects_without_auth() {
    // GIVEN: A running application
    let app = create_test_app(setup_test_db().await);

    // WHEN: Requesting the root path without a token
    let (status, location, _) = send_request_with_location(app, "GET", "/", None, None).await;

    // THEN: Should redirect to the server list
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("/v1/servers"));
}

#[tokio::test]
async fn test_trailing_slash_redirects() {
    // GIVEN: A running application
    let app = create_test_app(setup_test_db().await);

    // WHEN: Requesting a path with a trailing slash
    let (status, location, _) =
        send_request_with_location(app, "GET", "/v1/players/?server=Survival", None, None).await;

    // THEN: Should redirect to the path without it, keeping the query
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("/v1/players?server=Survival"));
}

#[tokio::test]
async fn test_server_list_requires_token() {
    // GIVEN: A running application
    let app = create_test_app(setup_test_db().await);

    // WHEN: Requesting the server list without a token
    let (status, _) = send_request(app, "GET", "/v1/servers", None, None).await;

    // THEN: Should return 401 Unauthorized
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_server_list_requires_permission() {
    // GIVEN: A user who may only see their own player page
    let app = create_test_app(setup_test_db().await);
    let token = register_web_user(&app, "viewer", &["page.player.self"], None).await;

    // WHEN: Requesting the server list
    let (status, _) = send_request(app, "GET", "/v1/servers", None, Some(&token)).await;

    // THEN: Should return 403 Forbidden
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_server_list() {
    // GIVEN: A connected server and a user with server access
    let app = create_test_app(setup_test_db().await);
    let (server_uuid, _) = connect_server(&app, "Survival").await;
    let token = register_web_user(&app, "staff", &["page.server"], None).await;

    // WHEN: Requesting the server list
    let (status, body) = send_request(app, "GET", "/v1/servers", None, Some(&token)).await;

    // THEN: Should list the server
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Survival");
    assert_eq!(body[0]["uuid"], server_uuid);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    // GIVEN: An authenticated user
    let app = create_test_app(setup_test_db().await);
    let token = register_web_user(&app, "staff", &["page.server"], None).await;

    // WHEN: Requesting a path no resolver handles
    let (status, body) = send_request(app, "GET", "/unknown/thing", None, Some(&token)).await;

    // THEN: Should return 404 Not Found
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn test_player_name_redirects_to_uuid() {
    // GIVEN: A player who joined a server
    let app = create_test_app(setup_test_db().await);
    let (_, api_key) = connect_server(&app, "Survival").await;
    join(&app, &api_key, STEVE, "Steve").await;
    let token = register_web_user(&app, "staff", &["page.player.other"], None).await;

    // WHEN: Requesting the player page by name
    let (status, location, _) = send_request_with_location(app, "GET", "/player/Steve", None, Some(&token)).await;

    // THEN: Should redirect to the canonical UUID path
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location, Some(format!("/player/{STEVE}")));
}

#[tokio::test]
async fn test_player_page_includes_active_session() {
    // GIVEN: A player who is online right now
    let app = create_test_app(setup_test_db().await);
    let (server_uuid, api_key) = connect_server(&app, "Survival").await;
    join(&app, &api_key, STEVE, "Steve").await;
    let token = register_web_user(&app, "staff", &["page.player.other"], None).await;

    // WHEN: Requesting the player page
    let (status, body) = send_request(app, "GET", &format!("/player/{STEVE}"), None, Some(&token)).await;

    // THEN: The session in progress counts towards the player's data
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Steve");
    assert_eq!(body["online"], true);
    assert_eq!(body["session_count"], 1);
    assert_eq!(body["servers"][0]["server_uuid"], server_uuid);
    assert_eq!(body["servers"][0]["join_address"], "play.example.com");
    assert_eq!(body["geo_info"][0]["geolocation"], "Finland");
}

#[tokio::test]
async fn test_raw_player_page_lists_every_key() {
    // GIVEN: A player who joined a server
    let app = create_test_app(setup_test_db().await);
    let (_, api_key) = connect_server(&app, "Survival").await;
    join(&app, &api_key, STEVE, "Steve").await;
    let token = register_web_user(&app, "staff", &["page.player.other"], None).await;

    // WHEN: Requesting the raw player data
    let (status, body) = send_request(app, "GET", &format!("/player/{STEVE}/raw"), None, Some(&token)).await;

    // THEN: Keys appear under their own names
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uuid"], STEVE);
    assert_eq!(body["name"], "Steve");
    assert_eq!(body["kick_count"], 0);
    assert!(body["sessions"].is_array());
}

#[tokio::test]
async fn test_linked_user_sees_only_own_player() {
    // GIVEN: Two players and a user linked to one of them
    let app = create_test_app(setup_test_db().await);
    let (_, api_key) = connect_server(&app, "Survival").await;
    join(&app, &api_key, STEVE, "Steve").await;
    join(&app, &api_key, ALEX, "Alex").await;
    let token = register_web_user(&app, "steve", &["page.player.self"], Some(STEVE)).await;

    // WHEN: Requesting both player pages
    let (own, _) = send_request(app.clone(), "GET", &format!("/player/{STEVE}"), None, Some(&token)).await;
    let (other, _) = send_request(app, "GET", &format!("/player/{ALEX}"), None, Some(&token)).await;

    // THEN: Only the linked player is visible
    assert_eq!(own, StatusCode::OK);
    assert_eq!(other, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_player_is_not_found() {
    // GIVEN: A user who may see every player
    let app = create_test_app(setup_test_db().await);
    let token = register_web_user(&app, "staff", &["page.player.other"], None).await;

    // WHEN: Requesting a player that never joined
    let (status, _) = send_request(app, "GET", "/player/Herobrine", None, Some(&token)).await;

    // THEN: Should return 404 Not Found
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_server_name_redirects_to_uuid() {
    // GIVEN: A connected server
    let app = create_test_app(setup_test_db().await);
    let (server_uuid, _) = connect_server(&app, "Survival").await;
    let token = register_web_user(&app, "staff", &["page.server"], None).await;

    // WHEN: Requesting the server page by name
    let (status, location, _) = send_request_with_location(app, "GET", "/server/Survival", None, Some(&token)).await;

    // THEN: Should redirect to the canonical UUID path
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location, Some(format!("/server/{server_uuid}")));
}

#[tokio::test]
async fn test_server_overview() {
    // GIVEN: A server with one online player
    let app = create_test_app(setup_test_db().await);
    let (server_uuid, api_key) = connect_server(&app, "Survival").await;
    join(&app, &api_key, STEVE, "Steve").await;
    let token = register_web_user(&app, "staff", &["page.server"], None).await;

    // WHEN: Requesting the server overview
    let (status, body) = send_request(app, "GET", "/v1/serverOverview?server=Survival", None, Some(&token)).await;

    // THEN: Should describe the server and count the player
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["server_uuid"], server_uuid);
    assert_eq!(body["name"], "Survival");
    assert_eq!(body["player_count"], 1);
    assert_eq!(body["online_players"], 1);
}

#[tokio::test]
async fn test_players_table() {
    // GIVEN: A server two players joined
    let app = create_test_app(setup_test_db().await);
    let (_, api_key) = connect_server(&app, "Survival").await;
    join(&app, &api_key, STEVE, "Steve").await;
    join(&app, &api_key, ALEX, "Alex").await;
    let token = register_web_user(&app, "staff", &["page.server"], None).await;

    // WHEN: Requesting the players table
    let (status, body) = send_request(app, "GET", "/v1/players?server=Survival", None, Some(&token)).await;

    // THEN: Should list both players
    assert_eq!(status, StatusCode::OK);
    let mut names: Vec<&str> = body["players"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["name"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Alex", "Steve"]);
}

#[tokio::test]
async fn test_missing_query_parameter() {
    // GIVEN: A user with server access
    let app = create_test_app(setup_test_db().await);
    let token = register_web_user(&app, "staff", &["page.server"], None).await;

    // WHEN: Requesting the overview without naming a server
    let (status, body) = send_request(app, "GET", "/v1/serverOverview", None, Some(&token)).await;

    // THEN: Should return 400 Bad Request
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing 'server' parameter");
}

#[tokio::test]
async fn test_auth_can_be_disabled() {
    // GIVEN: An application that does not require web user tokens
    let config = Config {
        auth_required: false,
        ..test_config()
    };
    let app = create_app(setup_test_db().await, SessionCache::new(), &config).unwrap();

    // WHEN: Requesting the server list without a token
    let (status, body) = send_request(app, "GET", "/v1/servers", None, None).await;

    // THEN: Should return the (empty) list
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
