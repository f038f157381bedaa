//! 화물 endpoint.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use cargoms_core::Cargo;

use crate::auth::Authenticated;
use crate::error::ServiceResult;
use crate::extract::{ApiJson, ApiPath};
use crate::services::CargoInput;
use crate::state::AppState;

/// GET /api/cargos
pub async fn list_cargos(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
) -> ServiceResult<Json<Vec<Cargo>>> {
    Ok(Json(state.cargos.get_all_cargos(&identity).await?))
}

/// GET /api/cargos/{id}
pub async fn get_cargo(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    ApiPath(id): ApiPath<i64>,
) -> ServiceResult<Json<Cargo>> {
    Ok(Json(state.cargos.get_cargo_by_id(&identity, id).await?))
}

/// POST /api/cargos
pub async fn add_cargo(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    ApiJson(input): ApiJson<CargoInput>,
) -> ServiceResult<(StatusCode, Json<Cargo>)> {
    let cargo = state.cargos.add_cargo(&identity, input).await?;
    Ok((StatusCode::CREATED, Json(cargo)))
}

/// PUT /api/cargos/{id}
pub async fn update_cargo(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<CargoInput>,
) -> ServiceResult<Json<Cargo>> {
    Ok(Json(state.cargos.update_cargo(&identity, id, input).await?))
}

/// DELETE /api/cargos/{id}
pub async fn delete_cargo(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    ApiPath(id): ApiPath<i64>,
) -> ServiceResult<StatusCode> {
    state.cargos.delete_cargo(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn cargos_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_cargos).post(add_cargo))
        .route("/{id}", get(get_cargo).put(update_cargo).delete(delete_cargo))
}
