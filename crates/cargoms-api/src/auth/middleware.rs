//! Axum용 인증 추출기.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::Identity;
use crate::error::ServiceError;
use crate::state::AppState;

/// 인증된 호출자 추출기.
///
/// `Authorization: Bearer <token>` 헤더를 검증해 [`Identity`]를 꺼냅니다.
/// 헤더가 없거나 토큰이 무효하면 401을 반환합니다.
///
/// ```rust,ignore
/// async fn handler(Authenticated(identity): Authenticated) -> impl IntoResponse {
///     format!("Authenticated user: {}", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ServiceError::unauthorized("Authentication token is required."))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ServiceError::unauthorized("Invalid Authorization header format."))?;

        let identity = state.tokens.validate(token.trim())?;
        Ok(Authenticated(identity))
    }
}
