//! 에러 핸들러.
//!
//! 모든 요청 실패가 호출자 콜백보다 먼저 거쳐 가는 프로세스 전역 싱크.
//! 분류별 로그를 남기고 등록된 [`ErrorHook`]을 순서대로 호출한다.
//! 어떤 경우에도 패닉을 밖으로 전파하지 않는다.

use reqflow_core::error::{ApplicationError, RequestError};
use reqflow_core::ports::error_hook::ErrorHook;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 에러 핸들러
///
/// 생성 후에는 변경되지 않는다. 여러 요청 워커에서 동시에 호출된다.
#[derive(Default, Clone)]
pub struct ErrorHandler {
    hooks: Vec<Arc<dyn ErrorHook>>,
}

impl ErrorHandler {
    /// 후크 없는 핸들러 (로깅만)
    pub fn new() -> Self {
        Self::default()
    }

    /// 후크 추가
    pub fn with_hook(mut self, hook: Arc<dyn ErrorHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// 등록된 후크 수
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// 에러 분류 → 로그 → 후크
    pub fn handle(&self, err: &RequestError) {
        match err {
            RequestError::Application(e) => {
                info!(code = e.code, "애플리케이션 에러 수신: {}", e.description);
            }
            RequestError::Service(e) => {
                info!(kind = %e.kind, url = %e.url, "서비스 에러 수신: {}", e.description);
                if let Some(text) = &e.response {
                    debug!("서비스 에러 응답 본문: {text}");
                }
            }
            RequestError::Transport(e) => {
                warn!(url = %e.url, "연결 에러 수신: {}", e.reason);
            }
        }

        for hook in &self.hooks {
            if catch_unwind(AssertUnwindSafe(|| hook.on_error(err))).is_err() {
                error!(kind = %err.kind(), "에러 후크 실행 중 패닉 발생, 무시");
            }
        }
    }
}

impl std::fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// 특정 애플리케이션 에러 코드에 반응하는 후크
///
/// 예: 세션 만료 코드 수신 시 전역 재로그인 흐름 시작.
pub struct ApplicationCodeHook {
    code: i64,
    action: Box<dyn Fn(&ApplicationError) + Send + Sync>,
}

impl ApplicationCodeHook {
    pub fn new<F>(code: i64, action: F) -> Self
    where
        F: Fn(&ApplicationError) + Send + Sync + 'static,
    {
        Self {
            code,
            action: Box::new(action),
        }
    }

    pub fn code(&self) -> i64 {
        self.code
    }
}

impl ErrorHook for ApplicationCodeHook {
    fn on_error(&self, err: &RequestError) {
        if let RequestError::Application(app) = err {
            if app.code == self.code {
                debug!("애플리케이션 에러 코드 {} 후크 실행", self.code);
                (self.action)(app);
            }
        }
    }
}
