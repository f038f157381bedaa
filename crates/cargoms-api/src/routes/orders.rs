//! 주문 endpoint.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use cargoms_core::{Cargo, OrderStatus, User};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::Authenticated;
use crate::error::ServiceResult;
use crate::extract::{ApiJson, ApiPath};
use crate::services::{CreateOrderInput, OrderDetails, UpdateOrderStatusInput};
use crate::state::AppState;

/// 주문자 요약.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderUserSummary {
    pub username: String,
    pub email: String,
}

impl From<User> for OrderUserSummary {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
        }
    }
}

/// 주문 화물 요약.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCargoSummary {
    pub name: String,
    pub weight: Decimal,
    pub destination: String,
}

impl From<Cargo> for OrderCargoSummary {
    fn from(cargo: Cargo) -> Self {
        Self {
            name: cargo.name,
            weight: cargo.weight,
            destination: cargo.destination,
        }
    }
}

/// 주문 응답.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: i64,
    pub user_id: i64,
    pub cargo_id: i64,
    pub user: Option<OrderUserSummary>,
    pub cargo: Option<OrderCargoSummary>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderDetails> for OrderResponse {
    fn from(details: OrderDetails) -> Self {
        let OrderDetails { order, user, cargo } = details;
        Self {
            id: order.id,
            user_id: order.user_id,
            cargo_id: order.cargo_id,
            user: user.map(OrderUserSummary::from),
            cargo: cargo.map(OrderCargoSummary::from),
            status: order.status,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

fn into_responses(details: Vec<OrderDetails>) -> Vec<OrderResponse> {
    details.into_iter().map(OrderResponse::from).collect()
}

/// GET /api/orders
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
) -> ServiceResult<Json<Vec<OrderResponse>>> {
    let orders = state.orders.get_all_orders(&identity).await?;
    Ok(Json(into_responses(state.orders.with_details(orders).await?)))
}

/// GET /api/orders/mine
pub async fn my_orders(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
) -> ServiceResult<Json<Vec<OrderResponse>>> {
    let orders = state.orders.get_my_orders(&identity).await?;
    Ok(Json(into_responses(state.orders.with_details(orders).await?)))
}

/// GET /api/orders/{id}
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    ApiPath(id): ApiPath<i64>,
) -> ServiceResult<Json<OrderResponse>> {
    let order = state.orders.get_order_by_id(&identity, id).await?;
    Ok(Json(state.orders.with_detail(order).await?.into()))
}

/// POST /api/orders
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    ApiJson(input): ApiJson<CreateOrderInput>,
) -> ServiceResult<(StatusCode, Json<OrderResponse>)> {
    let order = state.orders.create_order(&identity, input).await?;
    let details = state.orders.with_detail(order).await?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

/// PUT /api/orders/{id}
pub async fn update_order_status(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateOrderStatusInput>,
) -> ServiceResult<Json<OrderResponse>> {
    let order = state.orders.update_order_status(&identity, id, input).await?;
    Ok(Json(state.orders.with_detail(order).await?.into()))
}

/// DELETE /api/orders/{id}
pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    ApiPath(id): ApiPath<i64>,
) -> ServiceResult<StatusCode> {
    state.orders.delete_order(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn orders_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/mine", get(my_orders))
        .route(
            "/{id}",
            get(get_order).put(update_order_status).delete(delete_order),
        )
}
