//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! 서명 키와 캐시 연결은 시작 시 한 번 만들어지고 이후 읽기 전용입니다.

use std::sync::Arc;

use cargoms_core::JwtConfig;
use cargoms_data::{
    CacheAside, CacheBackend, CacheTtl, CargoStore, Database, MemoryCache, MemoryStore,
    OrderStore, RedisCache, UserStore,
};

use crate::auth::TokenService;
use crate::services::{CargoService, OrderService, UserService};

/// 엔티티별 저장소 묶음.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub cargos: Arc<dyn CargoStore>,
    pub orders: Arc<dyn OrderStore>,
}

impl Stores {
    /// 세 저장소를 모두 구현하는 하나의 백엔드로 구성.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: UserStore + CargoStore + OrderStore + 'static,
    {
        Self {
            users: store.clone(),
            cargos: store.clone(),
            orders: store,
        }
    }
}

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub cargos: Arc<CargoService>,
    pub orders: Arc<OrderService>,

    /// 토큰 검증기 (인증 추출기에서 사용)
    pub tokens: Arc<TokenService>,

    /// 캐시 (통계 조회용)
    pub cache: Arc<CacheAside>,

    /// PostgreSQL 연결 (설정된 경우, 헬스 체크용)
    pub database: Option<Database>,

    /// Redis 연결 (설정된 경우, 헬스 체크용)
    pub redis: Option<Arc<RedisCache>>,

    /// 서버 시작 시간
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    pub fn new(stores: Stores, cache: Arc<CacheAside>, tokens: Arc<TokenService>) -> Self {
        Self {
            users: Arc::new(UserService::new(
                stores.users.clone(),
                cache.clone(),
                tokens.clone(),
            )),
            cargos: Arc::new(CargoService::new(stores.cargos.clone(), cache.clone())),
            orders: Arc::new(OrderService::new(
                stores.orders,
                stores.users,
                stores.cargos,
                cache.clone(),
            )),
            tokens,
            cache,
            database: None,
            redis: None,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 외부 의존성 없이 인메모리 저장소/캐시로 구성.
    pub fn in_memory(jwt: &JwtConfig, ttl: CacheTtl) -> Self {
        let backend: Arc<dyn CacheBackend> = Arc::new(MemoryCache::new());
        Self::new(
            Stores::shared(Arc::new(MemoryStore::new())),
            Arc::new(CacheAside::new(backend, ttl)),
            Arc::new(TokenService::new(jwt)),
        )
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_redis(mut self, redis: Arc<RedisCache>) -> Self {
        self.redis = Some(redis);
        self
    }

    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }

    pub async fn is_db_healthy(&self) -> bool {
        match &self.database {
            Some(db) => db.health_check().await.unwrap_or(false),
            None => false,
        }
    }

    pub async fn is_redis_healthy(&self) -> bool {
        match &self.redis {
            Some(redis) => redis.health_check().await.unwrap_or(false),
            None => false,
        }
    }
}
