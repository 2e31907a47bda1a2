//! 에러 후크 포트.
//!
//! 에러 핸들러가 분류/로깅을 마친 뒤 호출하는 확장 지점.
//! 알림, 세션 만료 처리, 분석 전송 등 횡단 관심사를 여기에 붙인다.

use crate::error::RequestError;

/// 요청 실패 후크
///
/// 여러 요청에서 동시에 호출되므로 블로킹 없이 빠르게 반환해야 한다.
pub trait ErrorHook: Send + Sync {
    fn on_error(&self, error: &RequestError);
}
