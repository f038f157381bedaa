//! 인메모리 저장소.
//!
//! 외부 데이터베이스 없이 실행할 때와 테스트에서 사용합니다.
//! `set_available(false)`로 저장소 장애를 흉내낼 수 있습니다.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use cargoms_core::{Cargo, NewCargo, NewOrder, NewUser, Order, User};
use tokio::sync::RwLock;
use tracing::debug;

use super::{CargoStore, OrderStore, UserStore};
use crate::error::{DataError, Result};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    cargos: BTreeMap<i64, Cargo>,
    orders: BTreeMap<i64, Order>,
}

/// 세 엔티티 테이블을 하나의 락으로 보관하는 인메모리 저장소.
///
/// 하나의 락을 쓰므로 연쇄 삭제가 원자적으로 수행됩니다.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    next_id: AtomicI64,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            next_id: AtomicI64::new(1),
            available: AtomicBool::new(true),
        }
    }

    /// 저장소 가용성 설정 (장애 주입용).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DataError::Unavailable("memory store is offline".to_string()))
        }
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_all(&self) -> Result<Vec<User>> {
        self.check_available()?;
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        self.check_available()?;
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn add(&self, user: NewUser) -> Result<User> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(DataError::DuplicateError(format!(
                "username '{}' already exists",
                user.username
            )));
        }
        let user = user.with_id(self.allocate_id());
        tables.users.insert(user.id, user.clone());
        debug!(user_id = user.id, "User inserted");
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<()> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(DataError::DuplicateError(format!(
                "username '{}' already exists",
                user.username
            )));
        }
        match tables.users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(())
            }
            None => Err(DataError::NotFound(format!("User {} not found.", user.id))),
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Err(DataError::NotFound(format!("User {} not found.", id)));
        }
        tables.orders.retain(|_, order| order.user_id != id);
        Ok(())
    }
}

#[async_trait]
impl CargoStore for MemoryStore {
    async fn get_all(&self) -> Result<Vec<Cargo>> {
        self.check_available()?;
        Ok(self.tables.read().await.cargos.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Cargo>> {
        self.check_available()?;
        Ok(self.tables.read().await.cargos.get(&id).cloned())
    }

    async fn add(&self, cargo: NewCargo) -> Result<Cargo> {
        self.check_available()?;
        let cargo = cargo.with_id(self.allocate_id());
        self.tables
            .write()
            .await
            .cargos
            .insert(cargo.id, cargo.clone());
        Ok(cargo)
    }

    async fn update(&self, cargo: &Cargo) -> Result<()> {
        self.check_available()?;
        match self.tables.write().await.cargos.get_mut(&cargo.id) {
            Some(slot) => {
                *slot = cargo.clone();
                Ok(())
            }
            None => Err(DataError::NotFound(format!("Cargo {} not found.", cargo.id))),
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if tables.cargos.remove(&id).is_none() {
            return Err(DataError::NotFound(format!("Cargo {} not found.", id)));
        }
        tables.orders.retain(|_, order| order.cargo_id != id);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn get_all(&self) -> Result<Vec<Order>> {
        self.check_available()?;
        Ok(self.tables.read().await.orders.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Order>> {
        self.check_available()?;
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn get_by_user_id(&self, user_id: i64) -> Result<Vec<Order>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn add(&self, order: NewOrder) -> Result<Order> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        // 외래 키 제약 조건
        if !tables.users.contains_key(&order.user_id) {
            return Err(DataError::NotFound(format!("User {} not found.", order.user_id)));
        }
        if !tables.cargos.contains_key(&order.cargo_id) {
            return Err(DataError::NotFound(format!("Cargo {} not found.", order.cargo_id)));
        }
        let order = order.with_id(self.allocate_id());
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn update(&self, order: &Order) -> Result<()> {
        self.check_available()?;
        match self.tables.write().await.orders.get_mut(&order.id) {
            Some(slot) => {
                *slot = order.clone();
                Ok(())
            }
            None => Err(DataError::NotFound(format!("Order {} not found.", order.id))),
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.check_available()?;
        match self.tables.write().await.orders.remove(&id) {
            Some(_) => Ok(()),
            None => Err(DataError::NotFound(format!("Order {} not found.", id))),
        }
    }
}
