//! HTTP 전송 어댑터.
//!
//! `HttpTransport` 포트 구현. reqwest로 요청 한 건을 보내고 응답 전체를 모은다.
//! 상태 코드 해석은 하지 않는다 (응답 검증 파이프라인의 몫).

use async_trait::async_trait;
use reqflow_core::config::NetworkConfig;
use reqflow_core::error::{CoreError, TransportError};
use reqflow_core::models::http::{HttpMethod, HttpRequest, HttpResponse};
use reqflow_core::ports::transport::HttpTransport;
use std::time::Duration;
use tracing::debug;

/// reqwest 기반 HTTP 전송
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// 새 전송 생성
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| CoreError::Config(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self { client })
    }

    /// 설정에서 생성
    pub fn from_config(config: &NetworkConfig) -> Result<Self, CoreError> {
        Self::new(config.request_timeout(), &config.user_agent)
    }

    /// 이미 구성된 클라이언트 사용
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Options => reqwest::Method::OPTIONS,
    }
}

/// 전송 실패 사유 요약
fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("타임아웃: {error}")
    } else if error.is_connect() {
        format!("연결 실패: {error}")
    } else {
        error.to_string()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(to_reqwest_method(method), &url);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| TransportError::new(&url, describe(&e)))?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::new(&url, format!("응답 본문 수신 실패: {}", describe(&e))))?
            .to_vec();

        debug!("응답 수신: {method} {url} → {status} ({} bytes)", body.len());
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(Duration::from_secs(5), "reqflow-test").unwrap()
    }

    #[test]
    fn transport_from_default_config() {
        assert!(ReqwestTransport::from_config(&NetworkConfig::default_config()).is_ok());
    }

    #[test]
    fn method_mapping() {
        assert_eq!(to_reqwest_method(HttpMethod::Get), reqwest::Method::GET);
        assert_eq!(to_reqwest_method(HttpMethod::Patch), reqwest::Method::PATCH);
        assert_eq!(to_reqwest_method(HttpMethod::Options), reqwest::Method::OPTIONS);
    }

    #[tokio::test]
    async fn send_collects_status_headers_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/items/42")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":42,"name":"Widget"}"#)
            .create_async()
            .await;

        let response = transport()
            .send(HttpRequest {
                method: HttpMethod::Get,
                url: format!("{}/items/42", server.url()),
                headers: Vec::new(),
                body: None,
            })
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.text(), r#"{"id":42,"name":"Widget"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_not_a_transport_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/items/1")
            .with_status(404)
            .with_body("missing")
            .create_async()
            .await;

        let response = transport()
            .send(HttpRequest {
                method: HttpMethod::Delete,
                url: format!("{}/items/1", server.url()),
                headers: Vec::new(),
                body: None,
            })
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.text(), "missing");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn sends_headers_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/items")
            .match_header("content-type", "application/json")
            .match_body(r#"{"name":"Widget"}"#)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let response = transport()
            .send(HttpRequest {
                method: HttpMethod::Post,
                url: format!("{}/items", server.url()),
                headers: vec![("Content-Type".to_string(), "application/json".to_string())],
                body: Some(br#"{"name":"Widget"}"#.to_vec()),
            })
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        // 바인딩 후 즉시 닫아 아무도 듣지 않는 포트를 얻는다
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{addr}/items");
        let err = transport()
            .send(HttpRequest {
                method: HttpMethod::Get,
                url: url.clone(),
                headers: Vec::new(),
                body: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.url, url);
        assert!(!err.reason.is_empty());
    }
}
