//! 네트워크 설정 구조체.
//!
//! 서버 URL, 요청 타임아웃, 동시 요청 상한 등 런타임 설정을 정의한다.
//! [`crate::config_manager::ConfigManager`]를 통해 JSON 파일에서 로드.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CoreError;

/// 네트워크 레이어 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// API 서버 기본 URL (예: "https://api.example.com")
    #[serde(default)]
    pub base_url: Option<String>,
    /// 요청 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// 동시 실행 요청 상한 (None = 명시적 상한 없음)
    #[serde(default)]
    pub max_concurrent_requests: Option<usize>,
    /// User-Agent 헤더
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// 성공으로 취급하는 상태 코드
    #[serde(default = "default_success_status")]
    pub success_status: u16,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_user_agent() -> String {
    format!("reqflow/{}", env!("CARGO_PKG_VERSION"))
}

fn default_success_status() -> u16 {
    200
}

impl NetworkConfig {
    /// 기본 설정
    pub fn default_config() -> Self {
        Self {
            base_url: None,
            request_timeout_ms: default_request_timeout_ms(),
            max_concurrent_requests: None,
            user_agent: default_user_agent(),
            success_status: default_success_status(),
        }
    }

    /// 요청 타임아웃
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// 값 범위 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.request_timeout_ms == 0 {
            return Err(CoreError::Validation {
                field: "request_timeout_ms".to_string(),
                message: "0보다 커야 합니다".to_string(),
            });
        }
        if self.max_concurrent_requests == Some(0) {
            return Err(CoreError::Validation {
                field: "max_concurrent_requests".to_string(),
                message: "0보다 커야 합니다".to_string(),
            });
        }
        if !(100..=599).contains(&self.success_status) {
            return Err(CoreError::Validation {
                field: "success_status".to_string(),
                message: format!("유효하지 않은 상태 코드: {}", self.success_status),
            });
        }
        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let config: NetworkConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, NetworkConfig::default_config());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.user_agent.starts_with("reqflow/"));
    }

    #[test]
    fn partial_json_overrides() {
        let config: NetworkConfig =
            serde_json::from_str(r#"{"base_url":"http://localhost:3000","max_concurrent_requests":4}"#)
                .unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(config.max_concurrent_requests, Some(4));
        assert_eq!(config.request_timeout_ms, 30_000);
    }

    #[test]
    fn validate_rejects_zero_values() {
        let mut config = NetworkConfig::default_config();
        config.request_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = NetworkConfig::default_config();
        config.max_concurrent_requests = Some(0);
        assert!(config.validate().is_err());

        let mut config = NetworkConfig::default_config();
        config.success_status = 42;
        assert!(config.validate().is_err());

        assert!(NetworkConfig::default_config().validate().is_ok());
    }
}
