//! 회원 가입/로그인 endpoint (인증 불필요).

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::users::UserResponse;
use crate::error::ServiceResult;
use crate::extract::ApiJson;
use crate::services::{LoginInput, RegisterInput};
use crate::state::AppState;

/// 로그인 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    /// 항상 "Bearer"
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> ServiceResult<(StatusCode, Json<UserResponse>)> {
    let user = state.users.register_user(input).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<LoginInput>,
) -> ServiceResult<Json<LoginResponse>> {
    let result = state.users.login(input).await?;
    Ok(Json(LoginResponse {
        token: result.token,
        token_type: "Bearer".to_string(),
        expires_at: result.expires_at,
        user: UserResponse::from(result.user),
    }))
}

pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}
