//! 화물 주문 관리 REST API.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 자격 증명 검증 (Argon2)
//! - JWT 기반 신원 토큰 발급/검증
//! - 소유자/역할 기반 인가 정책
//! - 캐시를 거치는 사용자/화물/주문 서비스
//! - Axum 기반 REST API
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 인증 및 인가
//! - [`services`]: 엔티티 서비스
//! - [`error`]: 서비스 에러와 응답 매핑
//! - [`extract`]: 에러 형식을 맞춘 본문/경로 추출기

pub mod auth;
pub mod error;
pub mod extract;
pub mod routes;
pub mod services;
pub mod state;

pub use auth::{AccessClass, Authenticated, Identity, TokenService};
pub use error::{ApiErrorResponse, ServiceError, ServiceResult};
pub use extract::{ApiJson, ApiPath};
pub use routes::create_api_router;
pub use state::{AppState, Stores};
