//! 요청 큐.
//!
//! 요청을 받아 입장 여부를 묻고, 입장한 요청을 동시 실행 상한 아래에서 실행한다.
//! 상한이 없으면 입장 즉시 실행. 요청 사이의 순서나 우선순위는 보장하지 않는다.
//!
//! 프로세스 시작 시 한 번 만들어 `Arc`로 필요한 곳에 주입한다.

use parking_lot::Mutex;
use reqflow_core::config::NetworkConfig;
use reqflow_core::error::CoreError;
use reqflow_core::models::http::{Endpoint, HttpMethod};
use reqflow_core::ports::transport::HttpTransport;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, Semaphore};
use tracing::{debug, info};
use uuid::Uuid;

use crate::callback::CallbackContext;
use crate::error_handler::ErrorHandler;
use crate::http_client::ReqwestTransport;
use crate::request::{Admitted, ApiRequest, Dispatch, Request, RequestControl, RequestHandle};

/// 입장했지만 아직 끝나지 않은 요청
///
/// 엔드포인트를 만들지 못한 요청은 `method`, `url`이 `None`이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRequest {
    pub id: Uuid,
    pub request_type: TypeId,
    pub method: Option<HttpMethod>,
    /// 쿼리까지 붙은 최종 URL
    pub url: Option<String>,
}

/// 입장 판단 시점의 큐 상태
#[derive(Debug, Clone, Default)]
pub struct QueueSnapshot {
    /// 입장했지만 아직 끝나지 않은 요청 수 (대기 + 실행 중)
    pub in_flight: usize,
    /// 동시 실행 상한
    pub max_concurrent: Option<usize>,
    /// 입장했지만 아직 끝나지 않은 요청 목록
    pub active: Vec<ActiveRequest>,
}

impl QueueSnapshot {
    /// 같은 요청 타입이 진행 중인지
    pub fn has_type<R: 'static>(&self) -> bool {
        let type_id = TypeId::of::<R>();
        self.active.iter().any(|a| a.request_type == type_id)
    }

    /// 같은 메서드 + 최종 URL(쿼리 포함) 요청이 진행 중인지
    pub fn has_endpoint(&self, method: HttpMethod, url: &str) -> bool {
        self.active
            .iter()
            .any(|a| a.method == Some(method) && a.url.as_deref() == Some(url))
    }

    /// 같은 엔드포인트로 가는 요청이 진행 중인지
    ///
    /// 비교는 [`Endpoint::resolve`]로 만든 최종 URL 기준이다.
    pub fn has_request_to(&self, endpoint: &Endpoint) -> bool {
        self.has_endpoint(endpoint.method, &resolved_url(endpoint))
    }
}

/// 쿼리가 붙은 최종 URL. 만들 수 없으면 원본 문자열.
fn resolved_url(endpoint: &Endpoint) -> String {
    endpoint
        .resolve()
        .map(|url| url.to_string())
        .unwrap_or_else(|_| endpoint.url.clone())
}

type ActiveMap = Arc<Mutex<HashMap<Uuid, ActiveRequest>>>;

/// 워커가 끝날 때 (어떤 경로로든) 진행 목록에서 제거
struct ActiveGuard {
    id: Uuid,
    active: ActiveMap,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.lock().remove(&self.id);
    }
}

/// 요청 큐
pub struct RequestQueue {
    dispatch: Arc<Dispatch>,
    limiter: Option<Arc<Semaphore>>,
    max_concurrent: Option<usize>,
    active: ActiveMap,
    /// 입장 판단 직렬화
    admission: Mutex<()>,
}

/// Arc로 감싼 RequestQueue
pub type SharedRequestQueue = Arc<RequestQueue>;

impl RequestQueue {
    /// 협력자를 직접 주입해 생성
    pub fn new(
        config: &NetworkConfig,
        transport: Arc<dyn HttpTransport>,
        error_handler: Arc<ErrorHandler>,
        callbacks: CallbackContext,
    ) -> Self {
        let max_concurrent = config.max_concurrent_requests.filter(|n| *n > 0);
        Self {
            dispatch: Arc::new(Dispatch {
                transport,
                error_handler,
                callbacks,
                success_status: config.success_status,
            }),
            limiter: max_concurrent.map(|n| Arc::new(Semaphore::new(n))),
            max_concurrent,
            active: Arc::new(Mutex::new(HashMap::new())),
            admission: Mutex::new(()),
        }
    }

    /// 설정만으로 생성 (reqwest 전송, 로깅 전용 에러 핸들러, 전용 콜백 태스크)
    ///
    /// tokio 런타임 안에서 호출해야 한다.
    pub fn from_config(config: &NetworkConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let transport = ReqwestTransport::from_config(config)?;
        Ok(Self::new(
            config,
            Arc::new(transport),
            Arc::new(ErrorHandler::new()),
            CallbackContext::spawn(),
        ))
    }

    /// 동시 실행 상한
    pub fn max_concurrent(&self) -> Option<usize> {
        self.max_concurrent
    }

    /// 입장했지만 아직 끝나지 않은 요청 수
    pub fn in_flight(&self) -> usize {
        self.active.lock().len()
    }

    /// 현재 상태
    pub fn snapshot(&self) -> QueueSnapshot {
        let active: Vec<ActiveRequest> = self.active.lock().values().cloned().collect();
        QueueSnapshot {
            in_flight: active.len(),
            max_concurrent: self.max_concurrent,
            active,
        }
    }

    /// 공유 에러 핸들러
    pub fn error_handler(&self) -> &Arc<ErrorHandler> {
        &self.dispatch.error_handler
    }

    /// 요청 제출
    ///
    /// 요청의 입장 판단이 거부하면 `None`. 입장한 요청은 즉시 워커 태스크로 넘어간다.
    /// tokio 런타임 안에서 호출해야 한다.
    pub fn submit<R, Q>(&self, request: Q) -> Option<RequestHandle<R::Output>>
    where
        R: ApiRequest,
        Q: Into<Request<R>>,
    {
        let request = request.into();

        let endpoint = request.api().endpoint();
        let (method, url) = match &endpoint {
            Ok(e) => (Some(e.method), Some(resolved_url(e))),
            Err(_) => (None, None),
        };

        // 입장 판단과 진행 목록 등록 사이에 다른 제출이 끼어들지 않는다.
        // 진행 목록 잠금은 스냅샷과 등록 순간에만 잡는다.
        let _admission = self.admission.lock();
        let snapshot = self.snapshot();
        if !request.api().should_enqueue(&snapshot) {
            debug!(
                "큐 입장 거부: {} (진행 중 {})",
                std::any::type_name::<R>(),
                snapshot.in_flight
            );
            return None;
        }

        let control = Arc::new(RequestControl::new(url.clone().unwrap_or_default()));
        let id = control.id();
        self.active.lock().insert(
            id,
            ActiveRequest {
                id,
                request_type: TypeId::of::<R>(),
                method,
                url,
            },
        );

        let (done_tx, done_rx) = oneshot::channel();
        let admitted = Admitted {
            request,
            endpoint,
            control: control.clone(),
            done: done_tx,
        };
        let guard = ActiveGuard {
            id,
            active: self.active.clone(),
        };
        let dispatch = self.dispatch.clone();
        let limiter = self.limiter.clone();

        info!(
            request_id = %id,
            "요청 큐 입장: {} {}",
            method.map_or("-", HttpMethod::as_str),
            control.url()
        );

        tokio::spawn(async move {
            let _guard = guard;
            let _permit = match limiter {
                Some(limiter) => {
                    let acquired = tokio::select! {
                        biased;
                        _ = admitted.control.cancelled() => None,
                        permit = limiter.acquire_owned() => permit.ok(),
                    };
                    match acquired {
                        Some(permit) => Some(permit),
                        None => {
                            // 대기 중 취소 → begin() 실패로 Cancelled 전달
                            admitted.run(&dispatch).await;
                            return;
                        }
                    }
                }
                None => None,
            };
            admitted.run(&dispatch).await;
        });

        Some(RequestHandle::new(control, done_rx))
    }
}

impl std::fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestQueue")
            .field("max_concurrent", &self.max_concurrent)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}
