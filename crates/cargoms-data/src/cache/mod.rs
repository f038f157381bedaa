//! 캐싱 레이어.
//!
//! - [`CacheBackend`]: 직렬화된 문자열을 저장하는 원시 캐시 (Redis, 인메모리)
//! - [`CacheAside`]: 타입 있는 읽기 경로 캐싱과 무효화
//! - [`TagInvalidator`]: 엔티티 변경이 어떤 키를 무효화해야 하는지 결정
//!
//! 키는 레코드 단위가 아니라 엔티티 타입/쿼리 형태 단위의 논리 이름입니다.

mod aside;
mod memory;
mod redis;

pub use aside::{CacheAside, CacheStats};
pub use memory::{CacheEntry, MemoryCache};
pub use self::redis::RedisCache;

use std::time::Duration;

use async_trait::async_trait;
use cargoms_core::CacheConfig;

use crate::error::Result;

/// 논리 캐시 키.
pub mod keys {
    /// 전체 사용자 목록
    pub const ALL_USERS: &str = "users:all";
    /// 전체 화물 목록
    pub const ALL_CARGOS: &str = "cargos:all";
    /// 전체 주문 목록
    pub const ALL_ORDERS: &str = "orders:all";
}

/// 캐시 항목 만료 설정.
///
/// 슬라이딩 만료는 읽을 때마다 연장되지만 절대 만료를 넘지 않습니다.
/// 둘 다 `None`이면 명시적 무효화 전까지 유지됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheTtl {
    pub absolute: Option<Duration>,
    pub sliding: Option<Duration>,
}

impl CacheTtl {
    pub fn new(absolute: Option<Duration>, sliding: Option<Duration>) -> Self {
        Self { absolute, sliding }
    }

    /// 다음 만료 시점까지 남은 시간 (절대 만료로 제한된 슬라이딩 창).
    pub fn initial_window(&self) -> Option<Duration> {
        match (self.absolute, self.sliding) {
            (Some(a), Some(s)) => Some(a.min(s)),
            (a, s) => a.or(s),
        }
    }
}

impl From<CacheConfig> for CacheTtl {
    fn from(config: CacheConfig) -> Self {
        Self {
            absolute: Some(Duration::from_secs(config.absolute_ttl_secs)),
            sliding: Some(Duration::from_secs(config.sliding_ttl_secs)),
        }
    }
}

/// 원시 캐시 백엔드.
///
/// 값은 불투명한 직렬화 문자열입니다. 만료 규칙은 백엔드가 적용합니다.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// 값 조회. 읽기는 슬라이딩 만료를 연장합니다.
    async fn get_raw(&self, key: &str) -> Result<Option<String>>;
    async fn set_raw(&self, key: &str, value: String, ttl: CacheTtl) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// 무효화 태그 (변경된 엔티티 컬렉션).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTag {
    Users,
    Cargos,
    Orders,
}

impl CacheTag {
    /// 이 태그의 전체 컬렉션 키.
    pub fn collection_key(&self) -> &'static str {
        match self {
            CacheTag::Users => keys::ALL_USERS,
            CacheTag::Cargos => keys::ALL_CARGOS,
            CacheTag::Orders => keys::ALL_ORDERS,
        }
    }
}

/// 태그(와 선택적 레코드 ID)를 무효화할 키 목록으로 변환합니다.
///
/// 레코드 단위 키를 추가하려면 새 구현만 교체하면 됩니다.
pub trait TagInvalidator: Send + Sync {
    fn keys_for(&self, tag: CacheTag, id: Option<i64>) -> Vec<String>;
}

/// 컬렉션 키만 무효화하는 기본 구현.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionKeys;

impl TagInvalidator for CollectionKeys {
    fn keys_for(&self, tag: CacheTag, _id: Option<i64>) -> Vec<String> {
        vec![tag.collection_key().to_string()]
    }
}
