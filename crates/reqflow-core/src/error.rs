//! reqflow 에러 타입.
//!
//! - [`CoreError`]: 설정, 직렬화, 유효성 검증 등 도메인 공통 에러
//! - [`RequestError`]: 요청 한 건의 실패 분류 체계.
//!   전송([`TransportError`]), 서비스 계약 위반([`ServiceError`]),
//!   백엔드가 보고한 비즈니스 에러([`ApplicationError`]) 중 정확히 하나에 속한다.

use std::fmt;

use thiserror::Error;

/// 코어 레이어 에러.
/// 직렬화, 설정, 유효성 검증 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패: {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 요청 대상 URL을 만들 수 없음
    #[error("잘못된 엔드포인트: {0}")]
    InvalidEndpoint(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

/// 요청 실패 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 연결 수준 실패 (응답 없음)
    Transport,
    /// 응답 형식/계약 위반
    Service,
    /// 백엔드가 명시적으로 보고한 비즈니스 에러
    Application,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Service => write!(f, "service"),
            ErrorKind::Application => write!(f, "application"),
        }
    }
}

/// 연결 실패: 연결을 맺지 못했거나 도중에 끊김
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("연결 실패 ({url}): {reason}")]
pub struct TransportError {
    /// 요청 대상 URL
    pub url: String,
    /// 전송 계층이 보고한 사유
    pub reason: String,
}

impl TransportError {
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// 서비스 에러 세부 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceErrorKind {
    /// `Content-Type`이 `application/json`이 아님
    WrongContentType,
    /// 본문 JSON 파싱 실패
    ParseFail,
    /// 최상위 JSON 값이 객체가 아님
    ResponseNotAnObject,
    /// 에러 객체 매핑 실패
    ErrorMappingFail,
    /// 결과 객체 매핑 실패
    ResultMappingFail,
    /// 응답 자체가 없음
    NoResponseData,
}

impl ServiceErrorKind {
    /// 종류별 기본 설명
    pub fn default_description(self) -> &'static str {
        match self {
            ServiceErrorKind::WrongContentType => "Response is not json",
            ServiceErrorKind::ParseFail => "Error while parsing json",
            ServiceErrorKind::ResponseNotAnObject => "Response is not a dictionary object",
            ServiceErrorKind::ErrorMappingFail => "Mapping to error object did fail",
            ServiceErrorKind::ResultMappingFail => "Mapping to expected object did fail",
            ServiceErrorKind::NoResponseData => "No response data received",
        }
    }
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceErrorKind::WrongContentType => "wrong-content-type",
            ServiceErrorKind::ParseFail => "parse-failure",
            ServiceErrorKind::ResponseNotAnObject => "response-not-an-object",
            ServiceErrorKind::ErrorMappingFail => "error-object-mapping-failure",
            ServiceErrorKind::ResultMappingFail => "result-mapping-failure",
            ServiceErrorKind::NoResponseData => "no-response-data",
        };
        f.write_str(name)
    }
}

/// 서비스 에러: 응답이 약속된 형식을 따르지 않음
///
/// 진단을 위해 요청 URL과 (있다면) 원본 응답 텍스트를 함께 보관한다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("서비스 에러 [{kind}] {url}: {description}")]
pub struct ServiceError {
    /// 세부 종류
    pub kind: ServiceErrorKind,
    /// 사람이 읽을 수 있는 설명
    pub description: String,
    /// 요청 대상 URL
    pub url: String,
    /// 원본 응답 텍스트
    pub response: Option<String>,
}

impl ServiceError {
    /// 종류별 기본 설명으로 생성
    pub fn new(kind: ServiceErrorKind, url: impl Into<String>, response: Option<String>) -> Self {
        Self::with_description(kind, kind.default_description(), url, response)
    }

    /// 설명을 직접 지정하여 생성
    pub fn with_description(
        kind: ServiceErrorKind,
        description: impl Into<String>,
        url: impl Into<String>,
        response: Option<String>,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            url: url.into(),
            response,
        }
    }
}

/// 애플리케이션 에러: 백엔드가 에러 객체로 보고한 비즈니스 실패
///
/// 유효한 에러 객체(`description`, `code` 모두 존재)에서만 만들어진다.
/// 생성은 [`crate::models::error_model::ErrorModel`] 참조.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("애플리케이션 에러 (code {code}): {description}")]
pub struct ApplicationError {
    /// 사람이 읽을 수 있는 설명
    pub description: String,
    /// 백엔드 에러 코드
    pub code: i64,
}

/// 요청 실패: 세 분류 중 정확히 하나
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Application(#[from] ApplicationError),
}

impl RequestError {
    /// 디스패치용 분류
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::Transport(_) => ErrorKind::Transport,
            RequestError::Service(_) => ErrorKind::Service,
            RequestError::Application(_) => ErrorKind::Application,
        }
    }

    /// 서비스 에러 세부 종류 (서비스 에러가 아니면 `None`)
    pub fn service_kind(&self) -> Option<ServiceErrorKind> {
        match self {
            RequestError::Service(e) => Some(e.kind),
            _ => None,
        }
    }

    /// 애플리케이션 에러 코드 (애플리케이션 에러가 아니면 `None`)
    pub fn application_code(&self) -> Option<i64> {
        match self {
            RequestError::Application(e) => Some(e.code),
            _ => None,
        }
    }

    /// 실패한 요청의 URL (알 수 있는 경우)
    pub fn url(&self) -> Option<&str> {
        match self {
            RequestError::Transport(e) => Some(&e.url),
            RequestError::Service(e) => Some(&e.url),
            RequestError::Application(_) => None,
        }
    }

    /// 원본 응답 텍스트 (있는 경우)
    pub fn response_text(&self) -> Option<&str> {
        match self {
            RequestError::Service(e) => e.response.as_deref(),
            _ => None,
        }
    }
}
