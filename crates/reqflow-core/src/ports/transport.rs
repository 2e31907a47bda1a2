//! HTTP 전송 포트.
//!
//! 구현: `reqflow-network` crate (reqwest)

use async_trait::async_trait;

use crate::error::TransportError;
use crate::models::http::{HttpRequest, HttpResponse};

/// HTTP 요청 한 건을 보내고 응답 전체를 받는다
///
/// 상태 코드와 무관하게 응답을 받았다면 `Ok`를 돌려준다.
/// 연결을 맺지 못했거나 도중에 끊긴 경우에만 `Err`.
/// 반환된 future를 drop하면 진행 중인 전송이 중단되어야 한다.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
