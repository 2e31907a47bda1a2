//! # reqflow-core
//!
//! reqflow 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 네트워크 어댑터와 앱 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`]: 엔티티 계약(`Model`), 에러 객체, HTTP 데이터 타입
//! - [`ports`]: Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`error`]: 코어 에러와 요청 실패 분류 체계 (thiserror)
//! - [`config`]: 네트워크 설정 구조체
//! - [`config_manager`]: 설정 파일 관리 (로드/저장)

pub mod config;
pub mod config_manager;
pub mod error;
pub mod models;
pub mod ports;
