//! Mock 백엔드 모듈
//!
//! 요청 큐 통합 테스트를 위한 경량 mock 서버.
//! Axum 기반으로 성공/에러 객체/잘못된 응답/느린 응답을 흉내 낸다.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Mock 서버 상태
#[derive(Debug, Default)]
pub struct MockServerState {
    /// 수신된 요청 수
    pub request_count: AtomicU64,
    /// 현재 처리 중인 요청 수
    pub running: AtomicUsize,
    /// 동시에 처리한 최대 요청 수
    pub max_running: AtomicUsize,
}

/// Mock 서버
pub struct MockServer {
    addr: String,
    state: Arc<MockServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockServer {
    /// 새 mock 서버 시작 (자동 포트 할당)
    pub async fn start() -> Self {
        let state = Arc::new(MockServerState::default());
        let app = create_router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("포트 바인딩 실패");
        let port = listener.local_addr().unwrap().port();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("서버 실행 실패");
        });

        Self {
            addr: format!("http://127.0.0.1:{port}"),
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// 서버 주소
    pub fn url(&self) -> &str {
        &self.addr
    }

    /// 요청 수
    pub fn request_count(&self) -> u64 {
        self.state.request_count.load(Ordering::SeqCst)
    }

    /// 동시에 처리한 최대 요청 수
    pub fn max_running(&self) -> usize {
        self.state.max_running.load(Ordering::SeqCst)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn create_router(state: Arc<MockServerState>) -> Router {
    Router::new()
        .route("/items/{id}", get(get_item).post(echo_item))
        .route("/string", get(json_string))
        .route("/html", get(html_page))
        .route("/broken", get(broken_json))
        .route("/bad-error", get(bad_error))
        .route("/session-expired", get(session_expired))
        .route("/slow", get(slow))
        .route("/delayed/{ms}", get(delayed))
        .with_state(state)
}

fn hit(state: &MockServerState) {
    state.request_count.fetch_add(1, Ordering::SeqCst);
}

/// GET /items/{id}: 404는 에러 객체
async fn get_item(
    State(state): State<Arc<MockServerState>>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    hit(&state);
    if id == 404 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "description": "Item not found", "code": 404 } })),
        );
    }
    (StatusCode::OK, Json(json!({ "id": id, "name": "Widget" })))
}

/// POST /items/{id}: 본문을 그대로 돌려준다
async fn echo_item(State(state): State<Arc<MockServerState>>, body: Bytes) -> impl IntoResponse {
    hit(&state);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

async fn json_string(State(state): State<Arc<MockServerState>>) -> impl IntoResponse {
    hit(&state);
    Json(json!("just a string"))
}

async fn html_page(State(state): State<Arc<MockServerState>>) -> impl IntoResponse {
    hit(&state);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html")],
        "<html>maintenance</html>",
    )
}

async fn broken_json(State(state): State<Arc<MockServerState>>) -> impl IntoResponse {
    hit(&state);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        "{not json",
    )
}

/// 에러 객체에 description이 없다
async fn bad_error(State(state): State<Arc<MockServerState>>) -> impl IntoResponse {
    hit(&state);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": { "code": 1 } })),
    )
}

async fn session_expired(State(state): State<Arc<MockServerState>>) -> impl IntoResponse {
    hit(&state);
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": { "description": "Session expired", "code": 401 } })),
    )
}

/// 취소 테스트용. 사실상 응답하지 않는다.
async fn slow(State(state): State<Arc<MockServerState>>) -> impl IntoResponse {
    hit(&state);
    tokio::time::sleep(Duration::from_secs(30)).await;
    Json(json!({ "late": true }))
}

/// 동시 실행 측정용
async fn delayed(
    State(state): State<Arc<MockServerState>>,
    Path(ms): Path<u64>,
) -> impl IntoResponse {
    hit(&state);
    let now = state.running.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_running.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(ms)).await;
    state.running.fetch_sub(1, Ordering::SeqCst);
    Json(json!({ "waited": ms }))
}
