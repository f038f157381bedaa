//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/auth` - 회원 가입, 로그인
//! - `/api/users` - 사용자 관리
//! - `/api/cargos` - 화물 관리
//! - `/api/orders` - 주문 관리

pub mod auth;
pub mod cargos;
pub mod health;
pub mod orders;
pub mod users;

pub use auth::{auth_router, LoginResponse};
pub use cargos::cargos_router;
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use orders::orders_router;
pub use users::{users_router, ChangeRoleRequest, UserResponse};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/auth", auth_router())
        .nest("/api/users", users_router())
        .nest("/api/cargos", cargos_router())
        .nest("/api/orders", orders_router())
}
