//! # Cargoms Core
//!
//! 화물 주문 관리 시스템의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 사용자, 화물, 주문 엔티티
//! - 사용자 역할 (User, Admin)
//! - 주문 상태 및 라이프사이클 전이 규칙
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
