//! 영구 저장소 인터페이스.
//!
//! 각 엔티티 타입별로 `get_all`, `get_by_id`, `add`, `update`, `delete`를 제공합니다.
//! 모든 메서드는 저장소 장애 시 [`DataError::Unavailable`](crate::DataError)를
//! 반환할 수 있으며, 호출자는 이를 숨기지 않고 전파해야 합니다.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{Database, PgStore};

use async_trait::async_trait;
use cargoms_core::{Cargo, NewCargo, NewOrder, NewUser, Order, User};

use crate::error::Result;

/// 사용자 저장소.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<User>>;
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;
    /// 새 사용자를 저장하고 ID가 부여된 엔티티를 반환합니다.
    async fn add(&self, user: NewUser) -> Result<User>;
    async fn update(&self, user: &User) -> Result<()>;
    /// 사용자와 해당 사용자의 주문을 삭제합니다.
    async fn delete(&self, id: i64) -> Result<()>;
}

/// 화물 저장소.
#[async_trait]
pub trait CargoStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Cargo>>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Cargo>>;
    async fn add(&self, cargo: NewCargo) -> Result<Cargo>;
    async fn update(&self, cargo: &Cargo) -> Result<()>;
    /// 화물과 해당 화물을 참조하는 주문을 삭제합니다.
    async fn delete(&self, id: i64) -> Result<()>;
}

/// 주문 저장소.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Order>>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Order>>;
    async fn get_by_user_id(&self, user_id: i64) -> Result<Vec<Order>>;
    async fn add(&self, order: NewOrder) -> Result<Order>;
    async fn update(&self, order: &Order) -> Result<()>;
    async fn delete(&self, id: i64) -> Result<()>;
}
