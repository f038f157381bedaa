//! 사용자 endpoint.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use cargoms_core::{Role, User};
use serde::{Deserialize, Serialize};

use crate::auth::Authenticated;
use crate::error::ServiceResult;
use crate::extract::{ApiJson, ApiPath};
use crate::services::UpdateUserInput;
use crate::state::AppState;

/// 사용자 응답. 비밀번호 해시는 포함하지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

/// 역할 변경 요청.
#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

/// GET /api/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
) -> ServiceResult<Json<Vec<UserResponse>>> {
    let users = state.users.get_all_users(&identity).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    ApiPath(id): ApiPath<i64>,
) -> ServiceResult<Json<UserResponse>> {
    let user = state.users.get_user_by_id(&identity, id).await?;
    Ok(Json(user.into()))
}

/// PUT /api/users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateUserInput>,
) -> ServiceResult<Json<UserResponse>> {
    let user = state.users.update_user(&identity, id, input).await?;
    Ok(Json(user.into()))
}

/// PATCH /api/users/{id}/role
pub async fn change_role(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<ChangeRoleRequest>,
) -> ServiceResult<Json<UserResponse>> {
    let role: Role = request.role.parse()?;
    let user = state.users.change_user_role(&identity, id, role).await?;
    Ok(Json(user.into()))
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    ApiPath(id): ApiPath<i64>,
) -> ServiceResult<StatusCode> {
    state.users.delete_user(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/{id}/role", patch(change_role))
}
