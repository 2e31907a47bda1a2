//! reqflow 도메인 모델.
//!
//! 엔티티 (역)직렬화 계약, 백엔드 에러 객체, 전송 계층과 주고받는
//! HTTP 데이터 타입을 정의한다.

pub mod error_model;
pub mod http;
pub mod model;
