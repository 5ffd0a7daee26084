#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Mock admin backend
//!
//! Serves the navigation-menu endpoint plus a handful of helper endpoints
//! (user info, echo, failure, slow) and records what the client sent.

use axum::{
    extract::{Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Mock admin backend state
struct MockAdminState {
    menu: Value,
    user_info: Value,
    nav_requests: usize,
    last_token: Option<String>,
    last_query: HashMap<String, String>,
}

type SharedState = Arc<RwLock<MockAdminState>>;

/// Mock admin backend
pub struct MockAdminServer {
    addr: SocketAddr,
    state: SharedState,
    handle: JoinHandle<()>,
}

impl MockAdminServer {
    /// Start a mock backend on a random port
    pub async fn start() -> Self {
        let state = Arc::new(RwLock::new(MockAdminState {
            menu: json!({"code": 0, "menuList": [], "permissions": []}),
            user_info: json!({"code": 0, "user": {"username": "admin"}}),
            nav_requests: 0,
            last_token: None,
            last_query: HashMap::new(),
        }));

        let app = Router::new()
            .route("/sys/menu/nav", get(handle_nav))
            .route("/sys/user/info", get(handle_user_info))
            .route("/sys/echo", post(handle_echo))
            .route("/sys/broken", get(handle_broken))
            .route("/sys/slow", get(handle_slow))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL to configure the client with
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Set the navigation-menu envelope
    pub async fn set_menu(&self, menu: Value) {
        self.state.write().await.menu = menu;
    }

    /// Make the user-info endpoint report an expired session
    pub async fn expire_session(&self) {
        self.state.write().await.user_info = json!({"code": 401, "msg": "invalid token, please login again"});
    }

    pub async fn nav_requests(&self) -> usize {
        self.state.read().await.nav_requests
    }

    /// Token header of the most recent request
    pub async fn last_token(&self) -> Option<String> {
        self.state.read().await.last_token.clone()
    }

    /// Query string of the most recent GET
    pub async fn last_query(&self) -> HashMap<String, String> {
        self.state.read().await.last_query.clone()
    }

    /// Stop the mock server
    pub async fn stop(self) {
        self.handle.abort();
    }
}

async fn record(state: &SharedState, headers: &HeaderMap, query: HashMap<String, String>) {
    let mut state = state.write().await;
    state.last_token = headers
        .get("token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.last_query = query;
}

async fn handle_nav(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    record(&state, &headers, query).await;
    let mut state = state.write().await;
    state.nav_requests += 1;
    Json(state.menu.clone())
}

async fn handle_user_info(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    record(&state, &headers, query).await;
    Json(state.read().await.user_info.clone())
}

/// Echo the raw body and its content type back inside a success envelope
async fn handle_echo(State(state): State<SharedState>, headers: HeaderMap, body: String) -> Json<Value> {
    record(&state, &headers, HashMap::new()).await;
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    Json(json!({"code": 0, "contentType": content_type, "body": body}))
}

async fn handle_broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn handle_slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(json!({"code": 0}))
}
