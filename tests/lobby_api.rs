use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use seabattle::Registry;
use seabattle::config::Config;
use seabattle::db::repo::MemoryStore;
use seabattle::net::http::router;
use seabattle::state::registry::Repos;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    router(Arc::new(Registry::new(
        Repos::memory(Arc::new(MemoryStore::new())),
        Arc::new(Config::ephemeral("api-secret")),
    )))
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn register(username: &str, password: &str) -> Request<Body> {
    Request::post("/players/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "username": username, "password": password }).to_string()))
        .unwrap()
}

fn login(username: &str, password: &str) -> Request<Body> {
    Request::post("/players/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={username}&password={password}")))
        .unwrap()
}

fn authed(method: &str, uri: &str, token: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
}

async fn signed_up(app: &Router, username: &str) -> Value {
    let (status, _) = call(app, register(username, "secret")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, tokens) = call(app, login(username, "secret")).await;
    assert_eq!(status, StatusCode::OK);
    tokens
}

#[tokio::test]
async fn register_and_login() {
    let app = app();

    let (status, player) = call(&app, register("alice", "secret")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(player["username"], "alice");
    assert_eq!(player["available"], true);
    assert!(player.get("password_hash").is_none());

    let (status, body) = call(&app, register("alice", "other")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], r#"User with name "alice" already exists."#);

    let (status, tokens) = call(&app, login("alice", "secret")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tokens["token_type"], "bearer");

    let (status, body) = call(&app, login("alice", "wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Incorrect username or password");
}

#[tokio::test]
async fn refresh_token_issues_a_new_access_token() {
    let app = app();
    let tokens = signed_up(&app, "alice").await;
    let refresh = tokens["refresh_token"].as_str().unwrap();

    let req = Request::post("/players/refresh_token")
        .header("x-refresh-token", refresh)
        .body(Body::empty())
        .unwrap();
    let (status, renewed) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renewed["refresh_token"], refresh);

    let access = renewed["access_token"].as_str().unwrap();
    let (status, _) = call(&app, authed("GET", "/players", access).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let req = Request::post("/players/refresh_token")
        .header("x-refresh-token", tokens["access_token"].as_str().unwrap())
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn lobby_routes_need_a_bearer_token() {
    let app = app();
    for (method, uri) in [("GET", "/players"), ("GET", "/games"), ("POST", "/games/create")] {
        let req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let (status, body) = call(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["detail"], "Could not validate credentials");
    }
}

#[tokio::test]
async fn create_list_and_stats() {
    let app = app();
    let alice = signed_up(&app, "alice").await;
    signed_up(&app, "bob").await;
    let token = alice["access_token"].as_str().unwrap();

    let (status, players) = call(&app, authed("GET", "/players", token).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(players.as_array().unwrap().len(), 1);
    assert_eq!(players[0]["username"], "bob");

    let create = |opponent: &str| {
        authed("POST", "/games/create", token)
            .header("player2-name", opponent)
            .body(Body::empty())
            .unwrap()
    };

    let (status, game) = call(&app, create("bob")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["result"], "not started");
    assert_eq!(game["player1_name"], "alice");
    assert_eq!(game["player2_name"], "bob");
    assert_eq!(game["player_lived_board"]["ships"].as_array().unwrap().len(), 10);

    let (status, body) = call(&app, create("carol")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], r#"User with name "carol" not found."#);

    let (status, _) = call(&app, create("alice")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, games) = call(&app, authed("GET", "/games", token).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(games.as_array().unwrap().len(), 1);
    assert_eq!(games[0]["sid"], game["sid"]);
    assert_eq!(games[0]["player_lived_board"], game["player_lived_board"]);

    let stats = Request::get("/players/bob/stats").body(Body::empty()).unwrap();
    let (status, finished) = call(&app, stats).await;
    assert_eq!(status, StatusCode::OK);
    assert!(finished.as_array().unwrap().is_empty());

    let stats = Request::get("/players/nobody/stats").body(Body::empty()).unwrap();
    let (status, _) = call(&app, stats).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
