// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test harness: an in-process mock identity provider plus session
//! manager fixtures.
//!
//! The mock speaks the provider envelope protocol on an ephemeral port and
//! is scriptable per test (failure injection, response delay, permission
//! list), with call counters for asserting what the client actually did.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use session_keeper::{Config, CookiePolicy, CredentialStore, MemoryTier, SessionManager};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// The one password the mock accepts.
pub const VALID_PASSWORD: &str = "Secret1!";

/// Scriptable mock provider state.
pub struct MockState {
    pub login_should_fail: AtomicBool,
    pub register_should_fail: AtomicBool,
    pub refresh_should_fail: AtomicBool,
    pub current_user_should_fail: AtomicBool,
    /// When set, the refresh response rotates the refresh token too.
    pub rotate_refresh_token: AtomicBool,
    /// Artificial latency on the refresh endpoint, for race tests.
    pub refresh_delay_ms: AtomicU64,
    /// Declared access-token lifetime.
    pub expires_in: AtomicI64,
    /// Permission list served to authenticated clients.
    pub permissions: Mutex<Vec<String>>,

    pub login_calls: AtomicUsize,
    pub register_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub current_user_calls: AtomicUsize,
    pub permissions_calls: AtomicUsize,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            login_should_fail: AtomicBool::new(false),
            register_should_fail: AtomicBool::new(false),
            refresh_should_fail: AtomicBool::new(false),
            current_user_should_fail: AtomicBool::new(false),
            rotate_refresh_token: AtomicBool::new(false),
            refresh_delay_ms: AtomicU64::new(0),
            expires_in: AtomicI64::new(900),
            permissions: Mutex::new(vec!["profile:read".to_string(), "content:*".to_string()]),
            login_calls: AtomicUsize::new(0),
            register_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            current_user_calls: AtomicUsize::new(0),
            permissions_calls: AtomicUsize::new(0),
        }
    }
}

/// A running mock provider.
pub struct MockProvider {
    pub base_url: String,
    pub state: Arc<MockState>,
}

/// Spawn the mock provider on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_mock_provider() -> MockProvider {
    let state = Arc::new(MockState::default());

    let app = Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/refresh", post(refresh))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/forgot-password", post(ack))
        .route("/api/v1/auth/reset-password", post(ack))
        .route("/api/v1/auth/resend-verification", post(ack))
        .route("/api/v1/users/me", get(current_user).put(update_me))
        .route("/api/v1/users/me/permissions", get(permissions))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock provider");
    let addr = listener.local_addr().expect("Missing local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock provider died");
    });

    MockProvider {
        base_url: format!("http://{}", addr),
        state,
    }
}

/// Test config pointed at the mock provider.
#[allow(dead_code)]
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::test_default();
    config.api_base_url = base_url.to_string();
    config
}

/// A credential store over two fresh in-memory tiers. The tiers are returned
/// so tests can inspect raw records or seed partial state.
#[allow(dead_code)]
pub fn memory_store(config: &Config) -> (CredentialStore, Arc<MemoryTier>, Arc<MemoryTier>) {
    let durable = MemoryTier::new();
    let session = MemoryTier::new();
    let store = CredentialStore::new(
        durable.clone(),
        session.clone(),
        CookiePolicy::from_config(config),
    );
    (store, durable, session)
}

/// A second store view over the same tiers, for seeding state before a
/// manager takes ownership or inspecting persistence afterwards.
#[allow(dead_code)]
pub fn store_over(
    config: &Config,
    durable: &Arc<MemoryTier>,
    session: &Arc<MemoryTier>,
) -> CredentialStore {
    CredentialStore::new(
        durable.clone(),
        session.clone(),
        CookiePolicy::from_config(config),
    )
}

/// Session manager wired to the mock provider with in-memory tiers.
#[allow(dead_code)]
pub async fn test_manager(provider: &MockProvider) -> (SessionManager, Arc<MemoryTier>, Arc<MemoryTier>) {
    let config = test_config(&provider.base_url);
    let (store, durable, session) = memory_store(&config);
    let manager = SessionManager::new(config, store).expect("Failed to build manager");
    (manager, durable, session)
}

/// The profile the mock serves for `a@b.com`, as a typed model.
#[allow(dead_code)]
pub fn test_user() -> session_keeper::User {
    serde_json::from_value(user_json("a@b.com")).expect("user_json should deserialize")
}

/// Issue an HS256 access token expiring `expires_in` seconds from now
/// (negative for an already-expired token).
#[allow(dead_code)]
pub fn issue_access_token(expires_in: i64) -> String {
    mint_token(expires_in)
}

fn mint_token(expires_in: i64) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
        iat: i64,
    }

    let now = chrono::Utc::now().timestamp();
    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &Claims {
            sub: "user-1".to_string(),
            exp: now + expires_in,
            iat: now,
        },
        &jsonwebtoken::EncodingKey::from_secret(b"mock_provider_key"),
    )
    .expect("Failed to mint token")
}

fn user_json(email: &str) -> Value {
    json!({
        "id": "11111111-2222-3333-4444-555555555555",
        "email": email,
        "first_name": "Ada",
        "last_name": "Lovelace",
        "is_active": true,
        "is_verified": true,
        "roles": [{ "id": "r1", "name": "user", "permissions": [] }],
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": null,
        "last_login": null
    })
}

fn success(data: Value) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

fn failure(error: &str) -> Json<Value> {
    Json(json!({ "success": false, "error": error }))
}

// ─── Handlers ────────────────────────────────────────────────────

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Json<Value> {
    state.login_calls.fetch_add(1, Ordering::SeqCst);

    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default();

    if state.login_should_fail.load(Ordering::SeqCst) || password != VALID_PASSWORD {
        return failure("Invalid email or password");
    }

    let expires_in = state.expires_in.load(Ordering::SeqCst);
    success(json!({
        "access_token": mint_token(expires_in),
        "refresh_token": "refresh-token-1",
        "token_type": "bearer",
        "expires_in": expires_in,
        "user": user_json(&email),
    }))
}

async fn register(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Json<Value> {
    state.register_calls.fetch_add(1, Ordering::SeqCst);

    if state.register_should_fail.load(Ordering::SeqCst) {
        return failure("Email already registered");
    }

    let email = body["email"].as_str().unwrap_or_default();
    success(user_json(email))
}

async fn refresh(State(state): State<Arc<MockState>>, Json(_body): Json<Value>) -> Json<Value> {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
    }

    if state.refresh_should_fail.load(Ordering::SeqCst) {
        return failure("Refresh token invalid or revoked");
    }

    let expires_in = state.expires_in.load(Ordering::SeqCst);
    let mut data = json!({
        "access_token": mint_token(expires_in),
        "token_type": "bearer",
        "expires_in": expires_in,
    });
    if state.rotate_refresh_token.load(Ordering::SeqCst) {
        data["refresh_token"] = json!("refresh-token-rotated");
    }
    success(data)
}

async fn logout(State(state): State<Arc<MockState>>) -> Json<Value> {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    success(json!({ "message": "Logged out" }))
}

async fn current_user(State(state): State<Arc<MockState>>) -> Json<Value> {
    state.current_user_calls.fetch_add(1, Ordering::SeqCst);

    if state.current_user_should_fail.load(Ordering::SeqCst) {
        return failure("Authentication required");
    }

    success(user_json("a@b.com"))
}

async fn update_me(Json(body): Json<Value>) -> Json<Value> {
    let mut user = user_json("a@b.com");
    if let Some(first_name) = body["first_name"].as_str() {
        user["first_name"] = json!(first_name);
    }
    if let Some(last_name) = body["last_name"].as_str() {
        user["last_name"] = json!(last_name);
    }
    success(user)
}

async fn permissions(State(state): State<Arc<MockState>>) -> Json<Value> {
    state.permissions_calls.fetch_add(1, Ordering::SeqCst);
    let list = state.permissions.lock().unwrap().clone();
    success(json!(list))
}

async fn ack() -> Json<Value> {
    success(json!({ "message": "ok" }))
}
