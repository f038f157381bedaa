//! 주문 서비스와 주문 라이프사이클.

use std::collections::HashMap;
use std::sync::Arc;

use cargoms_core::{Cargo, NewOrder, Order, OrderStatus, User};
use cargoms_data::{keys, CacheAside, CacheTag, CargoStore, OrderStore, UserStore};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::auth::{require, AccessClass, Identity};
use crate::error::{ServiceError, ServiceResult};

use super::ensure_same_id;

/// 주문 생성 입력.
///
/// 소유자는 항상 호출자이고 초기 상태는 항상 `Pending`입니다.
/// 본문에 다른 값이 있어도 무시됩니다.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    pub cargo_id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

/// 주문 상태 변경 입력.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatusInput {
    #[serde(default)]
    pub id: Option<i64>,
    pub status: OrderStatus,
}

/// 사용자/화물 정보를 붙인 주문.
///
/// 연결된 레코드를 찾지 못하면 해당 필드는 `None`입니다.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    pub order: Order,
    pub user: Option<User>,
    pub cargo: Option<Cargo>,
}

/// 주문 서비스.
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    users: Arc<dyn UserStore>,
    cargos: Arc<dyn CargoStore>,
    cache: Arc<CacheAside>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        users: Arc<dyn UserStore>,
        cargos: Arc<dyn CargoStore>,
        cache: Arc<CacheAside>,
    ) -> Self {
        Self {
            orders,
            users,
            cargos,
            cache,
        }
    }

    /// 전체 주문 (관리자).
    #[instrument(skip(self, identity), fields(caller = identity.subject_id))]
    pub async fn get_all_orders(&self, identity: &Identity) -> ServiceResult<Vec<Order>> {
        require(identity, AccessClass::AdminOnly, None)?;
        let orders = &self.orders;
        Ok(self
            .cache
            .get_or_fetch(keys::ALL_ORDERS, || async { orders.get_all().await })
            .await?)
    }

    /// 호출자 본인의 주문.
    #[instrument(skip(self, identity), fields(caller = identity.subject_id))]
    pub async fn get_my_orders(&self, identity: &Identity) -> ServiceResult<Vec<Order>> {
        require(identity, AccessClass::Authenticated, None)?;
        Ok(self.orders.get_by_user_id(identity.subject_id).await?)
    }

    /// 단일 주문 (소유자 또는 관리자).
    ///
    /// 없으면 `NotFound`, 다른 사용자의 주문이면 `Forbidden`.
    #[instrument(skip(self, identity), fields(caller = identity.subject_id))]
    pub async fn get_order_by_id(&self, identity: &Identity, id: i64) -> ServiceResult<Order> {
        let order = self.find(id).await?;
        require(identity, AccessClass::OwnerOrAdmin, Some(order.user_id))?;
        Ok(order)
    }

    /// 주문 생성 (인증된 호출자).
    ///
    /// 사용자와 화물이 존재하는지 먼저 확인한 뒤 저장합니다.
    #[instrument(skip(self, identity, input), fields(caller = identity.subject_id, cargo_id = input.cargo_id))]
    pub async fn create_order(
        &self,
        identity: &Identity,
        input: CreateOrderInput,
    ) -> ServiceResult<Order> {
        require(identity, AccessClass::Authenticated, None)?;

        if input.status.is_some() || input.user_id.is_some() {
            debug!("Ignoring client-supplied owner/status on order creation");
        }

        let owner_id = identity.subject_id;
        if self.users.get_by_id(owner_id).await?.is_none() {
            return Err(ServiceError::not_found(format!("User {} not found.", owner_id)));
        }
        if self.cargos.get_by_id(input.cargo_id).await?.is_none() {
            return Err(ServiceError::not_found(format!(
                "Cargo {} not found.",
                input.cargo_id
            )));
        }

        let order = self
            .orders
            .add(NewOrder::pending(owner_id, input.cargo_id, Utc::now()))
            .await?;
        self.cache.invalidate_tag(CacheTag::Orders, Some(order.id)).await;
        info!(order_id = order.id, "Order created");
        Ok(order)
    }

    /// 주문 상태 변경 (관리자).
    ///
    /// 허용되지 않는 전이는 `Conflict`입니다.
    #[instrument(skip(self, identity, input), fields(caller = identity.subject_id, status = %input.status))]
    pub async fn update_order_status(
        &self,
        identity: &Identity,
        id: i64,
        input: UpdateOrderStatusInput,
    ) -> ServiceResult<Order> {
        if let Some(body_id) = input.id {
            ensure_same_id(id, body_id)?;
        }
        require(identity, AccessClass::AdminOnly, None)?;

        let mut order = self.load(id).await?;
        order.transition_to(input.status, Utc::now())?;

        self.orders.update(&order).await?;
        self.cache.invalidate_tag(CacheTag::Orders, Some(id)).await;
        info!(order_id = id, status = %order.status, "Order status updated");
        Ok(order)
    }

    /// 주문 삭제 (관리자).
    #[instrument(skip(self, identity), fields(caller = identity.subject_id))]
    pub async fn delete_order(&self, identity: &Identity, id: i64) -> ServiceResult<()> {
        require(identity, AccessClass::AdminOnly, None)?;

        self.orders.delete(id).await?;
        self.cache.invalidate_tag(CacheTag::Orders, Some(id)).await;
        info!(order_id = id, "Order deleted");
        Ok(())
    }

    /// 주문 목록에 사용자/화물 정보를 붙입니다.
    ///
    /// 사용자/화물 전체 목록 캐시를 통해 조회합니다.
    pub async fn with_details(&self, orders: Vec<Order>) -> ServiceResult<Vec<OrderDetails>> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let (user_store, cargo_store) = (&self.users, &self.cargos);
        let users: HashMap<i64, User> = self
            .cache
            .get_or_fetch(keys::ALL_USERS, || async { user_store.get_all().await })
            .await?
            .into_iter()
            .map(|user: User| (user.id, user))
            .collect();
        let cargos: HashMap<i64, Cargo> = self
            .cache
            .get_or_fetch(keys::ALL_CARGOS, || async { cargo_store.get_all().await })
            .await?
            .into_iter()
            .map(|cargo: Cargo| (cargo.id, cargo))
            .collect();

        Ok(orders
            .into_iter()
            .map(|order| OrderDetails {
                user: users.get(&order.user_id).cloned(),
                cargo: cargos.get(&order.cargo_id).cloned(),
                order,
            })
            .collect())
    }

    /// 단일 주문에 사용자/화물 정보를 붙입니다.
    pub async fn with_detail(&self, order: Order) -> ServiceResult<OrderDetails> {
        let mut details = self.with_details(vec![order.clone()]).await?;
        Ok(details.pop().unwrap_or(OrderDetails {
            order,
            user: None,
            cargo: None,
        }))
    }

    /// 캐시된 목록에서 찾고, 없으면 저장소 조회.
    async fn find(&self, id: i64) -> ServiceResult<Order> {
        if let Some(orders) = self.cache.get::<Vec<Order>>(keys::ALL_ORDERS).await {
            if let Some(order) = orders.into_iter().find(|o| o.id == id) {
                return Ok(order);
            }
        }
        self.load(id).await
    }

    /// 저장소에서 직접 조회 (변경 전 최신 상태).
    async fn load(&self, id: i64) -> ServiceResult<Order> {
        self.orders
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Order {} not found.", id)))
    }
}
