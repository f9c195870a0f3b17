#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

use plaza_proxy::config::Config;
use plaza_proxy::db::PlazaStorage;
use plaza_proxy::router::{PlazaState, plaza_router};
use plaza_proxy::vault::CredentialVault;

pub const TEST_KEY: &str = "0123456789abcdef0123456789abcdef";

/// Low bcrypt cost keeps seeded fixtures fast; login verification does not
/// care what cost the stored hash used.
pub const TEST_BCRYPT_COST: u32 = 4;

pub struct TestApp {
    pub state: PlazaState,
    pub app: Router,
    db_path: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_path);
    }
}

pub async fn spawn_app() -> TestApp {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut db_path = std::env::temp_dir();
    db_path.push(format!(
        "plaza-proxy-test-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));

    let storage = PlazaStorage::connect(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open test database");
    let vault = CredentialVault::new(TEST_KEY).expect("test vault key");

    let cfg = Config {
        encryption_key: TEST_KEY.to_string(),
        upstream_timeout_secs: 5,
        ..Config::default()
    };

    let state = PlazaState::new(storage, vault, &cfg).expect("failed to build state");
    let app = plaza_router(state.clone());

    TestApp {
        state,
        app,
        db_path,
    }
}

// ---- fixtures ----

pub async fn seed_store(
    state: &PlazaState,
    base_url: &str,
    wp_username: &str,
    app_password: &str,
) -> i64 {
    let blob = state.vault.encrypt(app_password).expect("encrypt fixture");
    state
        .storage
        .insert_store("Test Store", base_url, wp_username, &blob)
        .await
        .expect("insert store fixture")
}

pub async fn seed_user(state: &PlazaState, email: &str, password: &str, store_id: i64) -> i64 {
    let hash = bcrypt::hash(password, TEST_BCRYPT_COST).expect("hash fixture");
    state
        .storage
        .insert_user(email, None, Some("Test User"), &hash, store_id)
        .await
        .expect("insert user fixture")
}

pub async fn deactivate_user(state: &PlazaState, id: i64) {
    sqlx::query("UPDATE users SET active = 0 WHERE id = ?")
        .bind(id)
        .execute(state.storage.pool())
        .await
        .expect("deactivate user");
}

pub async fn deactivate_store(state: &PlazaState, id: i64) {
    sqlx::query("UPDATE stores SET active = 0 WHERE id = ?")
        .bind(id)
        .execute(state.storage.pool())
        .await
        .expect("deactivate store");
}

pub async fn clear_user_store(state: &PlazaState, id: i64) {
    sqlx::query("UPDATE users SET store_id = NULL WHERE id = ?")
        .bind(id)
        .execute(state.storage.pool())
        .await
        .expect("clear user store");
}

pub async fn set_store_blob(state: &PlazaState, id: i64, blob: &str) {
    sqlx::query("UPDATE stores SET app_password_encrypted = ? WHERE id = ?")
        .bind(blob)
        .bind(id)
        .execute(state.storage.pool())
        .await
        .expect("set store blob");
}

pub fn rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ---- request helpers ----

pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app
        .clone()
        .oneshot(builder.body(body).expect("failed to build request"))
        .await
        .expect("request failed");

    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    request(app, "POST", uri, Some(body)).await
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    request(app, "GET", uri, None).await
}

// ---- mock upstream ----

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn body_json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

pub struct MockUpstream {
    pub addr: SocketAddr,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockUpstream {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().expect("mock lock").clone()
    }
}

type MockState = (Arc<Mutex<Vec<CapturedRequest>>>, u16, &'static str);

async fn capture_handler(State((captured, status, body)): State<MockState>, req: Request) -> Response {
    let (parts, body_in) = req.into_parts();
    let bytes = to_bytes(body_in, usize::MAX).await.unwrap_or_default();
    captured.lock().expect("mock lock").push(CapturedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_owned),
        authorization: parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        body: bytes.to_vec(),
    });
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::OK),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

/// Spawn an in-process HTTP server that records every request it receives
/// and answers with a fixed status and body.
pub async fn spawn_mock_upstream(status: u16, body: &'static str) -> MockUpstream {
    let captured: Arc<Mutex<Vec<CapturedRequest>>> = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .fallback(capture_handler)
        .with_state((captured.clone(), status, body));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock upstream");
    let addr = listener.local_addr().expect("mock upstream addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, captured }
}
