//! HTTP 데이터 타입.
//!
//! 요청 대상([`Endpoint`])과 전송 계층이 주고받는 요청/응답을 평범한 데이터로 표현한다.
//! 실제 I/O는 [`crate::ports::transport::HttpTransport`] 구현이 담당한다.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CoreError;
use crate::models::model::Model;

/// JSON 콘텐츠 타입
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// `Content-Type` 헤더 이름
pub const CONTENT_TYPE: &str = "Content-Type";

/// HTTP 메서드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(CoreError::InvalidEndpoint(format!(
                "지원하지 않는 HTTP 메서드: {other}"
            ))),
        }
    }
}

/// 요청 대상: 메서드, URL, 쿼리/본문 파라미터
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Endpoint {
    /// 절대 URL로 생성
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// 기본 URL + 경로로 생성 (중복 슬래시 제거)
    pub fn at(method: HttpMethod, base_url: &str, path: &str) -> Self {
        let url = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Self::new(method, url)
    }

    /// 쿼리 파라미터 추가
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// 헤더 추가
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// 원시 본문 설정
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// 엔티티를 JSON 본문으로 설정
    pub fn with_model<M: Model>(self, model: &M) -> Result<Self, CoreError> {
        let mapping = model.to_mapping()?;
        let body = serde_json::to_vec(&mapping)?;
        Ok(self
            .with_header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .with_body(body))
    }

    /// 쿼리가 붙은 최종 URL
    pub fn resolve(&self) -> Result<Url, CoreError> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| CoreError::InvalidEndpoint(format!("{}: {e}", self.url)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::InvalidEndpoint(format!(
                "지원하지 않는 스킴: {}",
                self.url
            )));
        }

        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }

    /// 전송 계층에 넘길 요청으로 변환
    pub fn into_request(self) -> Result<HttpRequest, CoreError> {
        let url = self.resolve()?.to_string();
        Ok(HttpRequest {
            method: self.method,
            url,
            headers: self.headers,
            body: self.body,
        })
    }
}

/// 전송 계층에 넘기는 요청
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

/// 전송 계층이 돌려주는 응답
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// 헤더 값 (이름은 대소문자 무시)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `Content-Type` 헤더 값
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }

    /// 본문 텍스트 (잘못된 UTF-8은 대체 문자로)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
