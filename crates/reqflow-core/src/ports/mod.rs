//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! `reqflow-network`가 이 trait들을 구현하거나 소비하며,
//! 앱 크레이트에서 `Arc<dyn T>`로 와이어링한다.
//!
//! async trait은 `async_trait` 매크로를 사용하여 object safety를 보장한다.

pub mod error_hook;
pub mod transport;
