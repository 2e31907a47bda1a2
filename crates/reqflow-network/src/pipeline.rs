//! 응답 검증 파이프라인.
//!
//! 응답 한 건을 순서대로 검사하고 첫 실패에서 멈춘다.
//!
//! 1. 응답 존재 → 없으면 `NoResponseData`
//! 2. `Content-Type == application/json` → 아니면 `WrongContentType`
//! 3. 본문 JSON 파싱 → 실패하면 `ParseFail`
//! 4. 최상위 값이 객체 → 아니면 `ResponseNotAnObject`
//! 5. 상태 코드 분기
//!    - 성공 코드: 결과 처리기 → 실패하면 `ResultMappingFail`
//!    - 그 외: 에러 객체 매핑 → 성공하면 `ApplicationError`, 실패하면 `ErrorMappingFail`
//!
//! 단계 사이마다 취소 여부를 다시 확인하고, 취소됐으면 부수 효과 없이 포기한다.

use reqflow_core::error::{ApplicationError, RequestError, ServiceError, ServiceErrorKind};
use reqflow_core::models::http::{HttpResponse, CONTENT_TYPE_JSON};
use reqflow_core::models::model::json_type_name;
use serde_json::Value;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error};

use crate::request::ApiRequest;

/// 파이프라인 결과
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome<T> {
    /// 결과 처리기가 받아들임
    Completed(T),
    /// 분류된 실패
    Failed(RequestError),
    /// 도중에 취소됨 (상태 변경/콜백 없음)
    Abandoned,
}

/// 응답 검증 파이프라인
#[derive(Debug, Clone, Copy)]
pub struct ResponsePipeline<'a> {
    url: &'a str,
    success_status: u16,
}

impl<'a> ResponsePipeline<'a> {
    pub fn new(url: &'a str, success_status: u16) -> Self {
        Self {
            url,
            success_status,
        }
    }

    fn service_error<T>(
        &self,
        kind: ServiceErrorKind,
        response: Option<String>,
    ) -> PipelineOutcome<T> {
        PipelineOutcome::Failed(ServiceError::new(kind, self.url, response).into())
    }

    /// 응답 한 건 평가
    ///
    /// `is_cancelled`는 진입 전과 각 단계 사이에서 호출된다.
    pub fn run<R, C>(
        &self,
        api: &R,
        response: Option<&HttpResponse>,
        is_cancelled: C,
    ) -> PipelineOutcome<R::Output>
    where
        R: ApiRequest + ?Sized,
        C: Fn() -> bool,
    {
        if is_cancelled() {
            return PipelineOutcome::Abandoned;
        }

        let Some(response) = response else {
            error!("응답 없음: {}", self.url);
            return self.service_error(ServiceErrorKind::NoResponseData, None);
        };

        let text = response.text();

        match response.content_type() {
            Some(CONTENT_TYPE_JSON) => {}
            other => {
                error!(
                    "응답 content type이 json이 아님 ({}): {:?}",
                    self.url,
                    other.unwrap_or("<none>")
                );
                error!("{text}");
                return self.service_error(ServiceErrorKind::WrongContentType, Some(text));
            }
        }

        if is_cancelled() {
            return PipelineOutcome::Abandoned;
        }
        debug!("응답 본문 ({}): {text}", self.url);

        let parsed: Value = match serde_json::from_slice(&response.body) {
            Ok(value) => value,
            Err(e) => {
                error!("JSON 파싱 실패 ({}): {e}", self.url);
                error!("{text}");
                return self.service_error(ServiceErrorKind::ParseFail, Some(text));
            }
        };

        if is_cancelled() {
            return PipelineOutcome::Abandoned;
        }

        let object = match parsed {
            Value::Object(object) => object,
            other => {
                error!(
                    "응답이 객체가 아님 ({}): {}",
                    self.url,
                    json_type_name(&other)
                );
                return self.service_error(ServiceErrorKind::ResponseNotAnObject, Some(text));
            }
        };

        if response.status != self.success_status {
            let mapped = ApplicationError::try_from(&object);
            if is_cancelled() {
                return PipelineOutcome::Abandoned;
            }
            return match mapped {
                Ok(app) => PipelineOutcome::Failed(app.into()),
                Err(e) => {
                    debug!("에러 객체 매핑 실패 ({}): {e}", self.url);
                    self.service_error(ServiceErrorKind::ErrorMappingFail, Some(text))
                }
            };
        }

        if is_cancelled() {
            return PipelineOutcome::Abandoned;
        }

        let description = match catch_unwind(AssertUnwindSafe(|| api.process_result(&object))) {
            Ok(Ok(output)) => return PipelineOutcome::Completed(output),
            Ok(Err(e)) => e.to_string(),
            Err(payload) => {
                let message = panic_message(&*payload);
                error!("결과 처리기 패닉 ({}): {message}", self.url);
                format!("결과 처리기 패닉: {message}")
            }
        };
        PipelineOutcome::Failed(
            ServiceError::with_description(
                ServiceErrorKind::ResultMappingFail,
                description,
                self.url,
                Some(text),
            )
            .into(),
        )
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("알 수 없는 패닉")
}
