//! # reqflow-network
//!
//! 비동기 HTTP 요청 큐와 요청 라이프사이클.
//! 요청 한 건은 큐에 제출되어 동시 실행 상한 아래에서 실행되고,
//! 응답은 검증 파이프라인(content type → JSON 파싱 → 객체 확인 → 상태 코드 분기 →
//! 에러 객체/결과 매핑)을 거쳐 결과 또는 분류된 실패로 보고된다.
//!
//! ## 구성
//!
//! - [`queue`]: 요청 큐 (입장 판단 + 동시 실행 상한)
//! - [`request`]: 요청 계약, 라이프사이클 상태, 핸들
//! - [`pipeline`]: 응답 검증 파이프라인
//! - [`error_handler`]: 프로세스 전역 에러 싱크와 후크
//! - [`callback`]: 콜백 전달 컨텍스트
//! - [`http_client`]: reqwest 기반 `HttpTransport` 구현
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use reqflow_core::config::NetworkConfig;
//! use reqflow_core::models::http::{Endpoint, HttpMethod};
//! use reqflow_network::queue::RequestQueue;
//! use reqflow_network::request::{JsonRequest, Request};
//!
//! let queue = RequestQueue::from_config(&NetworkConfig::default_config())?;
//! let request = Request::new(JsonRequest::new(Endpoint::new(HttpMethod::Get, url)))
//!     .on_failure(|err| eprintln!("{err}"));
//! if let Some(handle) = queue.submit(request) {
//!     let outcome = handle.wait().await;
//! }
//! ```

pub mod callback;
pub mod error_handler;
pub mod http_client;
pub mod pipeline;
pub mod queue;
pub mod request;
