//! 요청 계약과 라이프사이클.
//!
//! 구체 요청 타입은 [`ApiRequest`]를 구현해 대상 엔드포인트(메서드, 최종 URL, 본문)와
//! 결과 처리기를 제공한다. 큐에 제출된 요청은 다음 상태를 한 번씩만 거친다.
//!
//! ```text
//! Idle ──입장──▶ Executing ──┬──▶ Completed
//!   │                        ├──▶ Failed
//!   └───────── 취소 ─────────┴──▶ Cancelled
//! ```
//!
//! 종료 상태 전이는 CAS로 한 번만 일어나므로 성공 경로와 실패 콜백은 서로 배타적이고,
//! 어느 쪽도 두 번 실행되지 않는다.

use parking_lot::Mutex;
use reqflow_core::error::{CoreError, RequestError, TransportError};
use reqflow_core::models::http::{Endpoint, HttpRequest};
use reqflow_core::models::model::{JsonObject, Model};
use reqflow_core::ports::transport::HttpTransport;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::callback::CallbackContext;
use crate::error_handler::ErrorHandler;
use crate::pipeline::{PipelineOutcome, ResponsePipeline};
use crate::queue::QueueSnapshot;

/// 구체 요청 타입이 구현하는 계약
pub trait ApiRequest: Send + Sync + 'static {
    /// 결과 처리기가 만들어 내는 값
    type Output: Clone + Send + 'static;

    /// 대상 엔드포인트 (메서드, 최종 URL, 선택적 본문)
    fn endpoint(&self) -> Result<Endpoint, CoreError>;

    /// 성공 상태 코드의 응답 객체를 결과로 매핑
    ///
    /// 실패하면 요청은 결과 매핑 실패로 끝난다.
    fn process_result(&self, response: &JsonObject) -> Result<Self::Output, CoreError>;

    /// 큐 입장 여부
    ///
    /// 요청 타입별 제한의 유일한 확장 지점 (예: 토큰 갱신은 한 번에 하나만).
    /// 제출은 이 판단 동안 직렬화된다. 여기서 같은 큐의 `snapshot()`, `in_flight()`는
    /// 불러도 되지만 `submit()`을 부르면 교착된다.
    fn should_enqueue(&self, _queue: &QueueSnapshot) -> bool {
        true
    }
}

/// 응답 객체를 그대로 돌려주는 요청
#[derive(Debug, Clone)]
pub struct JsonRequest {
    endpoint: Endpoint,
}

impl JsonRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

impl ApiRequest for JsonRequest {
    type Output = JsonObject;

    fn endpoint(&self) -> Result<Endpoint, CoreError> {
        Ok(self.endpoint.clone())
    }

    fn process_result(&self, response: &JsonObject) -> Result<JsonObject, CoreError> {
        Ok(response.clone())
    }
}

/// 응답 객체를 엔티티 `M`으로 매핑하고 검증하는 요청
pub struct ModelRequest<M> {
    endpoint: Endpoint,
    _model: PhantomData<fn() -> M>,
}

impl<M> ModelRequest<M> {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            _model: PhantomData,
        }
    }
}

impl<M> std::fmt::Debug for ModelRequest<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRequest")
            .field("endpoint", &self.endpoint)
            .field("model", &std::any::type_name::<M>())
            .finish()
    }
}

impl<M> ApiRequest for ModelRequest<M>
where
    M: Model + Clone + Send + 'static,
{
    type Output = M;

    fn endpoint(&self) -> Result<Endpoint, CoreError> {
        Ok(self.endpoint.clone())
    }

    fn process_result(&self, response: &JsonObject) -> Result<M, CoreError> {
        let model = M::from_mapping(response)?;
        model.validate()?;
        Ok(model)
    }
}

type SuccessCallback<T> = Box<dyn FnOnce(T) + Send + 'static>;
type FailureCallback = Box<dyn FnOnce(RequestError) + Send + 'static>;

/// 제출 단위: 요청과 선택적 콜백
pub struct Request<R: ApiRequest> {
    api: R,
    on_success: Option<SuccessCallback<R::Output>>,
    on_failure: Option<FailureCallback>,
}

impl<R: ApiRequest> Request<R> {
    pub fn new(api: R) -> Self {
        Self {
            api,
            on_success: None,
            on_failure: None,
        }
    }

    /// 성공 콜백 (콜백 컨텍스트에서 한 번 실행)
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(R::Output) + Send + 'static,
    {
        self.on_success = Some(Box::new(callback));
        self
    }

    /// 실패 콜백 (에러 핸들러를 거친 뒤 콜백 컨텍스트에서 한 번 실행)
    pub fn on_failure<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(RequestError) + Send + 'static,
    {
        self.on_failure = Some(Box::new(callback));
        self
    }

    pub fn api(&self) -> &R {
        &self.api
    }
}

impl<R: ApiRequest> From<R> for Request<R> {
    fn from(api: R) -> Self {
        Self::new(api)
    }
}

/// 라이프사이클 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RequestState {
    Idle = 0,
    Executing = 1,
    Completed = 2,
    Failed = 3,
    Cancelled = 4,
}

impl RequestState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => RequestState::Idle,
            1 => RequestState::Executing,
            2 => RequestState::Completed,
            3 => RequestState::Failed,
            _ => RequestState::Cancelled,
        }
    }

    /// 종료 상태 여부
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestState::Completed | RequestState::Failed | RequestState::Cancelled
        )
    }
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestState::Idle => write!(f, "Idle"),
            RequestState::Executing => write!(f, "Executing"),
            RequestState::Completed => write!(f, "Completed"),
            RequestState::Failed => write!(f, "Failed"),
            RequestState::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// 요청 최종 결과
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome<T> {
    Completed(T),
    Failed(RequestError),
    Cancelled,
}

impl<T> RequestOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, RequestOutcome::Completed(_))
    }

    /// `Result`로 변환 (취소는 `None`)
    pub fn into_result(self) -> Option<Result<T, RequestError>> {
        match self {
            RequestOutcome::Completed(value) => Some(Ok(value)),
            RequestOutcome::Failed(err) => Some(Err(err)),
            RequestOutcome::Cancelled => None,
        }
    }
}

/// 요청 상태 + 취소 신호 (핸들과 워커가 공유)
#[derive(Debug)]
pub(crate) struct RequestControl {
    id: Uuid,
    state: AtomicU8,
    cancel_tx: watch::Sender<bool>,
    /// 로그용 최종 URL
    url: Mutex<String>,
}

impl RequestControl {
    pub(crate) fn new(url: impl Into<String>) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            id: Uuid::new_v4(),
            state: AtomicU8::new(RequestState::Idle as u8),
            cancel_tx,
            url: Mutex::new(url.into()),
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn state(&self) -> RequestState {
        RequestState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.state() == RequestState::Cancelled
    }

    pub(crate) fn url(&self) -> String {
        self.url.lock().clone()
    }

    fn set_url(&self, url: &str) {
        *self.url.lock() = url.to_string();
    }

    fn transition(&self, from: RequestState, to: RequestState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Idle → Executing
    pub(crate) fn begin(&self) -> bool {
        self.transition(RequestState::Idle, RequestState::Executing)
    }

    /// Executing → Completed | Failed
    pub(crate) fn finish(&self, to: RequestState) -> bool {
        self.transition(RequestState::Executing, to)
    }

    /// Idle | Executing → Cancelled. 이미 종료됐으면 `false`.
    pub(crate) fn cancel(&self) -> bool {
        let cancelled = self.transition(RequestState::Executing, RequestState::Cancelled)
            || self.transition(RequestState::Idle, RequestState::Cancelled);
        if cancelled {
            self.cancel_tx.send_replace(true);
            info!(request_id = %self.id, "요청 취소됨: {}", self.url());
        }
        cancelled
    }

    /// 취소될 때까지 대기
    pub(crate) async fn cancelled(&self) {
        let mut rx = self.cancel_tx.subscribe();
        // 송신자가 self에 있으므로 수신 에러는 발생하지 않는다
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// 제출된 요청 핸들
#[derive(Debug)]
pub struct RequestHandle<T> {
    control: Arc<RequestControl>,
    outcome: oneshot::Receiver<RequestOutcome<T>>,
}

impl<T> RequestHandle<T> {
    pub(crate) fn new(
        control: Arc<RequestControl>,
        outcome: oneshot::Receiver<RequestOutcome<T>>,
    ) -> Self {
        Self { control, outcome }
    }

    pub fn id(&self) -> Uuid {
        self.control.id()
    }

    pub fn state(&self) -> RequestState {
        self.control.state()
    }

    pub fn is_executing(&self) -> bool {
        self.state() == RequestState::Executing
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn is_cancelled(&self) -> bool {
        self.control.is_cancelled()
    }

    /// 취소 요청. 진행 중인 전송은 중단되고 콜백은 실행되지 않는다.
    ///
    /// 이미 종료된 요청이면 `false`.
    pub fn cancel(&self) -> bool {
        self.control.cancel()
    }

    /// 취소 전용 핸들 (대기와 분리해 다른 태스크에 넘길 때)
    pub fn canceller(&self) -> Canceller {
        Canceller {
            control: self.control.clone(),
        }
    }

    /// 최종 결과 대기
    pub async fn wait(self) -> RequestOutcome<T> {
        match self.outcome.await {
            Ok(outcome) => outcome,
            // 결과 없이 송신 측이 사라졌으면 취소로 본다
            Err(_) => RequestOutcome::Cancelled,
        }
    }
}

/// 취소 전용 핸들
#[derive(Debug, Clone)]
pub struct Canceller {
    control: Arc<RequestControl>,
}

impl Canceller {
    pub fn cancel(&self) -> bool {
        self.control.cancel()
    }
}

/// 요청 실행에 필요한 공유 협력자
pub(crate) struct Dispatch {
    pub(crate) transport: Arc<dyn HttpTransport>,
    pub(crate) error_handler: Arc<ErrorHandler>,
    pub(crate) callbacks: CallbackContext,
    pub(crate) success_status: u16,
}

/// 입장 후 워커에 넘겨지는 요청
pub(crate) struct Admitted<R: ApiRequest> {
    pub(crate) request: Request<R>,
    pub(crate) endpoint: Result<Endpoint, CoreError>,
    pub(crate) control: Arc<RequestControl>,
    pub(crate) done: oneshot::Sender<RequestOutcome<R::Output>>,
}

impl<R: ApiRequest> Admitted<R> {
    /// Executing 진입부터 종료 상태까지 실행
    pub(crate) async fn run(self, dispatch: &Dispatch) {
        let Admitted {
            request,
            endpoint,
            control,
            done,
        } = self;
        let Request {
            api,
            on_success,
            on_failure,
        } = request;

        let finisher = Finisher {
            control: control.as_ref(),
            dispatch,
            on_success,
            on_failure,
            done: Some(done),
        };

        if !control.begin() {
            debug!(request_id = %control.id(), "시작 전 취소된 요청");
            finisher.cancelled();
            return;
        }

        let http_request: HttpRequest = match endpoint.and_then(Endpoint::into_request) {
            Ok(r) => r,
            Err(e) => {
                let url = control.url();
                error!(request_id = %control.id(), "잘못된 URL로 요청 시도: {url}: {e}");
                finisher.failed(TransportError::new(url, e.to_string()).into());
                return;
            }
        };

        let url = http_request.url.clone();
        control.set_url(&url);
        info!(
            request_id = %control.id(),
            "요청 전송: {} {}",
            http_request.method,
            url
        );

        let sent = tokio::select! {
            biased;
            _ = control.cancelled() => {
                finisher.cancelled();
                return;
            }
            result = dispatch.transport.send(http_request) => result,
        };

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                error!(request_id = %control.id(), "연결 실패: {url}");
                finisher.failed(e.into());
                return;
            }
        };

        info!(
            request_id = %control.id(),
            "응답 수신: {url} → {}",
            response.status
        );

        let pipeline = ResponsePipeline::new(&url, dispatch.success_status);
        match pipeline.run(&api, Some(&response), || control.is_cancelled()) {
            PipelineOutcome::Completed(output) => finisher.completed(output),
            PipelineOutcome::Failed(err) => finisher.failed(err),
            PipelineOutcome::Abandoned => finisher.cancelled(),
        }
    }
}

/// 종료 상태 전이와 결과/콜백 전달을 한 곳에서
struct Finisher<'a, T> {
    control: &'a RequestControl,
    dispatch: &'a Dispatch,
    on_success: Option<SuccessCallback<T>>,
    on_failure: Option<FailureCallback>,
    done: Option<oneshot::Sender<RequestOutcome<T>>>,
}

impl<T: Clone + Send + 'static> Finisher<'_, T> {
    fn deliver(&mut self, outcome: RequestOutcome<T>) {
        if let Some(done) = self.done.take() {
            // 핸들이 먼저 drop된 경우는 무시
            let _ = done.send(outcome);
        }
    }

    fn completed(mut self, output: T) {
        if !self.control.finish(RequestState::Completed) {
            self.cancelled();
            return;
        }
        debug!(request_id = %self.control.id(), "요청 완료");

        if let Some(callback) = self.on_success.take() {
            let value = output.clone();
            self.dispatch.callbacks.post(move || callback(value));
        }
        self.deliver(RequestOutcome::Completed(output));
    }

    fn failed(mut self, err: RequestError) {
        if !self.control.finish(RequestState::Failed) {
            self.cancelled();
            return;
        }
        info!(request_id = %self.control.id(), "응답 처리 중 에러: {err}");

        self.dispatch.error_handler.handle(&err);
        if let Some(callback) = self.on_failure.take() {
            let failure = err.clone();
            self.dispatch.callbacks.post(move || callback(failure));
        }
        self.deliver(RequestOutcome::Failed(err));
    }

    fn cancelled(mut self) {
        self.deliver(RequestOutcome::Cancelled);
    }
}
