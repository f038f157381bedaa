//! 저장소 및 캐시 레이어.
//!
//! 이 crate는 다음을 제공합니다:
//! - 엔티티별 저장소 trait ([`UserStore`], [`CargoStore`], [`OrderStore`])
//! - PostgreSQL 저장소 (sqlx) 및 인메모리 저장소
//! - 캐시 백엔드 (Redis, 인메모리)
//! - Cache-aside 레이어 ([`CacheAside`]): 읽기 경로 캐싱, 태그 기반 무효화, 적중률 통계

pub mod cache;
pub mod error;
pub mod store;

pub use cache::{
    keys, CacheAside, CacheBackend, CacheStats, CacheTag, CacheTtl, CollectionKeys, MemoryCache,
    RedisCache, TagInvalidator,
};
pub use error::{DataError, Result};
pub use store::{CargoStore, Database, MemoryStore, OrderStore, PgStore, UserStore};
