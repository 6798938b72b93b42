//! In-process stand-in for the remote prompt API, for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Debug, Default)]
pub struct StubState {
    /// Raw JSON served by `GET /prompts`, in whatever shape the test wants.
    pub prompts: Mutex<Value>,
    /// Bodies received by `POST /prompts/request`.
    pub requests: Mutex<Vec<Value>>,
    pub fail_list: AtomicBool,
    pub reject_requests: AtomicBool,
    pub list_calls: AtomicUsize,
}

impl StubState {
    pub fn new(prompts: Value) -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(prompts),
            ..Default::default()
        })
    }

    pub fn set_prompts(&self, prompts: Value) {
        *self.prompts.lock().unwrap() = prompts;
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn set_reject_requests(&self, reject: bool) {
        self.reject_requests.store(reject, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

pub fn stub_router(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/prompts", get(list_prompts))
        .route("/prompts/request", post(request_prompt))
        .with_state(state)
}

async fn list_prompts(State(state): State<Arc<StubState>>) -> Response {
    state.list_calls.fetch_add(1, Ordering::SeqCst);
    if state.fail_list.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "database unavailable" })),
        )
            .into_response();
    }
    let body = state.prompts.lock().unwrap().clone();
    Json(body).into_response()
}

async fn request_prompt(
    State(state): State<Arc<StubState>>,
    Json(body): Json<Value>,
) -> Response {
    state.requests.lock().unwrap().push(body);
    if state.reject_requests.load(Ordering::SeqCst) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "request rejected" })),
        )
            .into_response();
    }
    (StatusCode::CREATED, Json(json!({ "status": "received" }))).into_response()
}

/// A running stub with its base URL and shared state.
pub struct StubApi {
    pub base_url: String,
    pub state: Arc<StubState>,
    _handle: tokio::task::JoinHandle<()>,
}

/// Spawn the stub on a random port of the current runtime.
pub async fn spawn_stub_api(prompts: Value) -> StubApi {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let state = StubState::new(prompts);
    let app = stub_router(state.clone());
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    StubApi {
        base_url,
        state,
        _handle: handle,
    }
}

/// Spawn the stub on a background thread with its own runtime.
///
/// `BlockingHttpService` owns a runtime too, and runtimes cannot nest, so
/// sync tests keep the stub on a separate thread. The stub lives until the
/// test process exits.
pub fn spawn_stub_api_thread(prompts: Value) -> (String, Arc<StubState>) {
    let (tx, rx) = std::sync::mpsc::sync_channel(1);
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let stub = spawn_stub_api(prompts).await;
            tx.send((stub.base_url.clone(), stub.state.clone())).unwrap();
            std::future::pending::<()>().await;
        });
    });
    rx.recv().unwrap()
}
