//! PostgreSQL 저장소 구현.
//!
//! 각 작업은 단일 SQL 문장이며, 문장 단위 트랜잭션이 유일한 원자성 경계입니다.

use std::time::Duration;

use async_trait::async_trait;
use cargoms_core::{Cargo, DatabaseConfig, NewCargo, NewOrder, NewUser, Order, User};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::{debug, info, instrument};

use super::{CargoStore, OrderStore, UserStore};
use crate::error::{DataError, Result};

/// 데이터베이스 연결 풀 래퍼.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 새로운 데이터베이스 연결 풀을 생성합니다.
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| DataError::Unavailable(e.to_string()))?;

        info!("Database connection established");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 데이터베이스 마이그레이션을 실행합니다.
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");

        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DataError::MigrationError(e.to_string()))?;

        info!("Migrations completed successfully");
        Ok(())
    }

    /// 데이터베이스 상태를 확인합니다.
    pub async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(true)
    }
}

// ==================== 레코드 ====================

#[derive(Debug, FromRow)]
struct UserRecord {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    role: String,
}

impl TryFrom<UserRecord> for User {
    type Error = DataError;

    fn try_from(record: UserRecord) -> Result<Self> {
        let role = record
            .role
            .parse()
            .map_err(|e: cargoms_core::CoreError| DataError::InvalidData(e.to_string()))?;
        Ok(User {
            id: record.id,
            username: record.username,
            email: record.email,
            password_hash: record.password_hash,
            role,
        })
    }
}

#[derive(Debug, FromRow)]
struct CargoRecord {
    id: i64,
    name: String,
    weight: Decimal,
    destination: String,
}

impl From<CargoRecord> for Cargo {
    fn from(record: CargoRecord) -> Self {
        Cargo {
            id: record.id,
            name: record.name,
            weight: record.weight,
            destination: record.destination,
        }
    }
}

#[derive(Debug, FromRow)]
struct OrderRecord {
    id: i64,
    user_id: i64,
    cargo_id: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRecord> for Order {
    type Error = DataError;

    fn try_from(record: OrderRecord) -> Result<Self> {
        let status = record
            .status
            .parse()
            .map_err(|e: cargoms_core::CoreError| DataError::InvalidData(e.to_string()))?;
        Ok(Order {
            id: record.id,
            user_id: record.user_id,
            cargo_id: record.cargo_id,
            status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

fn affected_or_not_found(rows: u64, what: &str, id: i64) -> Result<()> {
    if rows == 0 {
        Err(DataError::NotFound(format!("{} {} not found.", what, id)))
    } else {
        Ok(())
    }
}

// ==================== 저장소 ====================

/// PostgreSQL 기반 저장소.
#[derive(Clone)]
pub struct PgStore {
    db: Database,
}

impl PgStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, role";
const ORDER_COLUMNS: &str = "id, user_id, cargo_id, status, created_at, updated_at";

#[async_trait]
impl UserStore for PgStore {
    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users ORDER BY id",
            USER_COLUMNS
        ))
        .fetch_all(self.db.pool())
        .await?;

        records.into_iter().map(User::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?
        .map(User::try_from)
        .transpose()
    }

    #[instrument(skip(self))]
    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(self.db.pool())
        .await?
        .map(User::try_from)
        .transpose()
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn add(&self, user: NewUser) -> Result<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(self.db.pool())
        .await?;

        debug!(user_id = record.id, "User inserted");
        User::try_from(record)
    }

    #[instrument(skip(self, user), fields(user_id = user.id))]
    async fn update(&self, user: &User) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                username = $2,
                email = $3,
                password_hash = $4,
                role = $5
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .execute(self.db.pool())
        .await?;

        affected_or_not_found(result.rows_affected(), "User", user.id)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        affected_or_not_found(result.rows_affected(), "User", id)
    }
}

#[async_trait]
impl CargoStore for PgStore {
    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<Cargo>> {
        let records = sqlx::query_as::<_, CargoRecord>(
            "SELECT id, name, weight, destination FROM cargos ORDER BY id",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(records.into_iter().map(Cargo::from).collect())
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> Result<Option<Cargo>> {
        let record = sqlx::query_as::<_, CargoRecord>(
            "SELECT id, name, weight, destination FROM cargos WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(record.map(Cargo::from))
    }

    #[instrument(skip(self, cargo))]
    async fn add(&self, cargo: NewCargo) -> Result<Cargo> {
        let record = sqlx::query_as::<_, CargoRecord>(
            r#"
            INSERT INTO cargos (name, weight, destination)
            VALUES ($1, $2, $3)
            RETURNING id, name, weight, destination
            "#,
        )
        .bind(&cargo.name)
        .bind(cargo.weight)
        .bind(&cargo.destination)
        .fetch_one(self.db.pool())
        .await?;

        Ok(record.into())
    }

    #[instrument(skip(self, cargo), fields(cargo_id = cargo.id))]
    async fn update(&self, cargo: &Cargo) -> Result<()> {
        let result = sqlx::query(
            "UPDATE cargos SET name = $2, weight = $3, destination = $4 WHERE id = $1",
        )
        .bind(cargo.id)
        .bind(&cargo.name)
        .bind(cargo.weight)
        .bind(&cargo.destination)
        .execute(self.db.pool())
        .await?;

        affected_or_not_found(result.rows_affected(), "Cargo", cargo.id)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM cargos WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        affected_or_not_found(result.rows_affected(), "Cargo", id)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<Order>> {
        let records = sqlx::query_as::<_, OrderRecord>(&format!(
            "SELECT {} FROM orders ORDER BY id",
            ORDER_COLUMNS
        ))
        .fetch_all(self.db.pool())
        .await?;

        records.into_iter().map(Order::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> Result<Option<Order>> {
        sqlx::query_as::<_, OrderRecord>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?
        .map(Order::try_from)
        .transpose()
    }

    #[instrument(skip(self))]
    async fn get_by_user_id(&self, user_id: i64) -> Result<Vec<Order>> {
        let records = sqlx::query_as::<_, OrderRecord>(&format!(
            "SELECT {} FROM orders WHERE user_id = $1 ORDER BY id",
            ORDER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        records.into_iter().map(Order::try_from).collect()
    }

    #[instrument(skip(self, order), fields(user_id = order.user_id, cargo_id = order.cargo_id))]
    async fn add(&self, order: NewOrder) -> Result<Order> {
        let record = sqlx::query_as::<_, OrderRecord>(&format!(
            r#"
            INSERT INTO orders (user_id, cargo_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(order.user_id)
        .bind(order.cargo_id)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .fetch_one(self.db.pool())
        .await?;

        debug!(order_id = record.id, "Order inserted");
        Order::try_from(record)
    }

    #[instrument(skip(self, order), fields(order_id = order.id))]
    async fn update(&self, order: &Order) -> Result<()> {
        // created_at은 변경하지 않음
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                user_id = $2,
                cargo_id = $3,
                status = $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.cargo_id)
        .bind(order.status.as_str())
        .bind(order.updated_at)
        .execute(self.db.pool())
        .await?;

        affected_or_not_found(result.rows_affected(), "Order", order.id)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        affected_or_not_found(result.rows_affected(), "Order", id)
    }
}
