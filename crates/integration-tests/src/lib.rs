//! # integration-tests
//!
//! Support code for the end-to-end suites: an in-process fake of the posts
//! API that records every request, plus recording doubles for the
//! interaction and container ports.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use bytes::Bytes;
use domains::{Interaction, PostsContainer};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::debug;

/// Epoch millis the fake stamps its first created item with.
const CLOCK_START_MS: i64 = 1_717_200_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    /// Raw (still percent-encoded) request path.
    pub path: String,
    pub body: Option<Value>,
}

impl RecordedRequest {
    pub fn is(&self, method: &str, path: &str) -> bool {
        self.method == method && self.path == path
    }
}

#[derive(Debug, Default)]
struct FakeState {
    posts: Vec<Value>,
    next_id: i64,
    requests: Vec<RecordedRequest>,
    fail_status: Option<u16>,
    list_override: Option<Value>,
}

impl FakeState {
    fn record(&mut self, method: &'static str, uri: &Uri, body: &Bytes) -> Option<Value> {
        let body = serde_json::from_slice::<Value>(body).ok();
        debug!(method, path = uri.path(), "fake api request");
        self.requests.push(RecordedRequest {
            method,
            path: uri.path().to_string(),
            body: body.clone(),
        });
        body
    }

    fn failure(&self) -> Option<Response> {
        self.fail_status.map(|code| {
            StatusCode::from_u16(code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
                .into_response()
        })
    }

    fn tick(&mut self) -> (i64, i64) {
        self.next_id += 1;
        (self.next_id, CLOCK_START_MS + self.next_id * 60_000)
    }

    fn post_mut(&mut self, id: &str) -> Option<&mut Value> {
        self.posts.iter_mut().find(|p| id_of(p) == id)
    }
}

type Shared = Arc<Mutex<FakeState>>;

fn lock(state: &Shared) -> MutexGuard<'_, FakeState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn id_of(value: &Value) -> String {
    match &value["id"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A posts API on an ephemeral loopback port. Stops when dropped.
pub struct FakeBoardServer {
    addr: SocketAddr,
    state: Shared,
    handle: JoinHandle<()>,
}

impl FakeBoardServer {
    pub async fn start(posts: Vec<Value>) -> Self {
        let next_id = posts
            .iter()
            .filter_map(|p| p["id"].as_i64())
            .max()
            .unwrap_or(0);
        let state: Shared = Arc::new(Mutex::new(FakeState {
            posts,
            next_id: next_id.max(100),
            ..FakeState::default()
        }));

        let app = Router::new()
            .route("/api/posts", get(list_posts).post(create_post))
            .route("/api/posts/{id}", delete(delete_post))
            .route("/api/posts/{id}/reply", post(create_reply))
            .route("/api/posts/{id}/reply/{reply_id}", delete(delete_reply))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake api");
        let addr = listener.local_addr().expect("fake api address");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state, handle }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    pub fn clear_requests(&self) {
        lock(&self.state).requests.clear();
    }

    pub fn posts(&self) -> Vec<Value> {
        lock(&self.state).posts.clone()
    }

    /// Every subsequent request answers with `status` (`None` heals it).
    pub fn fail_with(&self, status: Option<u16>) {
        lock(&self.state).fail_status = status;
    }

    /// Makes `GET /api/posts` return `body` verbatim.
    pub fn override_list(&self, body: Value) {
        lock(&self.state).list_override = Some(body);
    }
}

impl Drop for FakeBoardServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn list_posts(State(state): State<Shared>, uri: Uri, body: Bytes) -> Response {
    let mut s = lock(&state);
    s.record("GET", &uri, &body);
    if let Some(failure) = s.failure() {
        return failure;
    }
    let listing = s
        .list_override
        .clone()
        .unwrap_or_else(|| Value::Array(s.posts.clone()));
    Json(listing).into_response()
}

async fn create_post(State(state): State<Shared>, uri: Uri, body: Bytes) -> Response {
    let mut s = lock(&state);
    let body = s.record("POST", &uri, &body).unwrap_or(Value::Null);
    if let Some(failure) = s.failure() {
        return failure;
    }
    let (id, ts) = s.tick();
    let created = json!({
        "id": id,
        "author": body["author"],
        "content": body["content"],
        "image": body["image"],
        "timestamp": ts,
        "replies": []
    });
    s.posts.push(created.clone());
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn delete_post(
    State(state): State<Shared>,
    Path(id): Path<String>,
    uri: Uri,
    body: Bytes,
) -> Response {
    let mut s = lock(&state);
    s.record("DELETE", &uri, &body);
    if let Some(failure) = s.failure() {
        return failure;
    }
    let before = s.posts.len();
    s.posts.retain(|p| id_of(p) != id);
    if s.posts.len() == before {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({ "message": "Post deleted" })).into_response()
}

async fn create_reply(
    State(state): State<Shared>,
    Path(id): Path<String>,
    uri: Uri,
    body: Bytes,
) -> Response {
    let mut s = lock(&state);
    let body = s.record("POST", &uri, &body).unwrap_or(Value::Null);
    if let Some(failure) = s.failure() {
        return failure;
    }
    let (reply_id, ts) = s.tick();
    let reply = json!({
        "id": reply_id,
        "author": body["author"],
        "content": body["content"],
        "timestamp": ts
    });
    let Some(post) = s.post_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match post["replies"].as_array_mut() {
        Some(replies) => replies.push(reply.clone()),
        None => post["replies"] = json!([reply.clone()]),
    }
    (StatusCode::CREATED, Json(reply)).into_response()
}

async fn delete_reply(
    State(state): State<Shared>,
    Path((id, reply_id)): Path<(String, String)>,
    uri: Uri,
    body: Bytes,
) -> Response {
    let mut s = lock(&state);
    s.record("DELETE", &uri, &body);
    if let Some(failure) = s.failure() {
        return failure;
    }
    let removed = s
        .post_mut(&id)
        .and_then(|post| post["replies"].as_array_mut())
        .map(|replies| {
            let before = replies.len();
            replies.retain(|r| id_of(r) != reply_id);
            replies.len() != before
        })
        .unwrap_or(false);
    if !removed {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({ "message": "Reply deleted" })).into_response()
}

/// Answers every confirmation the same way and keeps every alert.
#[derive(Debug, Default)]
pub struct ScriptedInteraction {
    confirm: bool,
    alerts: Mutex<Vec<String>>,
    confirmations: Mutex<Vec<String>>,
}

impl ScriptedInteraction {
    pub fn confirming(confirm: bool) -> Self {
        Self {
            confirm,
            ..Self::default()
        }
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn confirmations(&self) -> Vec<String> {
        self.confirmations.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Interaction for ScriptedInteraction {
    fn alert(&self, message: &str) {
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.push(message.to_string());
        }
    }

    fn confirm(&self, message: &str) -> bool {
        if let Ok(mut confirmations) = self.confirmations.lock() {
            confirmations.push(message.to_string());
        }
        self.confirm
    }
}

/// Keeps every render in order.
#[derive(Debug, Default)]
pub struct RecordingContainer {
    renders: Mutex<Vec<String>>,
}

impl RecordingContainer {
    pub fn renders(&self) -> Vec<String> {
        self.renders.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<String> {
        self.renders().pop()
    }
}

impl PostsContainer for RecordingContainer {
    fn replace(&self, html: &str) {
        if let Ok(mut renders) = self.renders.lock() {
            renders.push(html.to_string());
        }
    }
}
