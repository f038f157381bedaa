//! Cache-aside 레이어.
//!
//! 읽기: 캐시 확인 → 미스면 저장소 조회 → 캐시 채우기.
//! 쓰기: 저장소 변경 후 관련 키 무효화 (갱신하지 않음).
//!
//! 캐시 장애는 요청 실패로 이어지지 않습니다. 읽기 실패는 미스로 취급하고,
//! 쓰기/무효화 실패는 경고 로그만 남깁니다.
//!
//! 키별 세대(generation) 카운터로 "무효화 이전에 시작된 조회"가 무효화 이후에
//! 오래된 값을 캐시에 다시 채우는 것을 막습니다.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::{CacheBackend, CacheTag, CacheTtl, CollectionKeys, TagInvalidator};

/// 캐시 통계.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// 백엔드 오류 횟수 (미스/무시로 처리됨)
    pub errors: u64,
    pub hit_rate: f64,
}

/// 타입 있는 cache-aside 래퍼.
pub struct CacheAside {
    backend: Arc<dyn CacheBackend>,
    invalidator: Arc<dyn TagInvalidator>,
    default_ttl: CacheTtl,
    generations: Mutex<HashMap<String, u64>>,
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

impl CacheAside {
    /// 컬렉션 키 무효화 정책으로 생성.
    pub fn new(backend: Arc<dyn CacheBackend>, default_ttl: CacheTtl) -> Self {
        Self::with_invalidator(backend, Arc::new(CollectionKeys), default_ttl)
    }

    pub fn with_invalidator(
        backend: Arc<dyn CacheBackend>,
        invalidator: Arc<dyn TagInvalidator>,
        default_ttl: CacheTtl,
    ) -> Self {
        Self {
            backend,
            invalidator,
            default_ttl,
            generations: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    pub fn default_ttl(&self) -> CacheTtl {
        self.default_ttl
    }

    /// 캐시에서 값을 가져옵니다.
    ///
    /// 반환값은 역직렬화된 사본이므로 호출자가 수정해도 캐시에 영향이 없습니다.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get_raw(key).await {
            Ok(raw) => raw,
            Err(e) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                warn!(key, error = %e, "Cache read failed, treating as miss");
                None
            }
        };

        let value = raw.and_then(|json| match serde_json::from_str::<T>(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                warn!(key, error = %e, "Cached value could not be decoded, treating as miss");
                None
            }
        });

        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key, "Cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key, "Cache miss");
        }
        value
    }

    /// 값을 캐시에 저장합니다. 실패는 로그만 남깁니다.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: CacheTtl) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                warn!(key, error = %e, "Cache value could not be encoded");
                return;
            }
        };
        if let Err(e) = self.backend.set_raw(key, json, ttl).await {
            self.errors.fetch_add(1, Ordering::Relaxed);
            warn!(key, error = %e, "Cache write failed");
        }
    }

    /// 키를 무효화합니다.
    ///
    /// 세대를 먼저 올린 뒤 삭제하므로, 진행 중인 조회는 이후 값을 채우지 못합니다.
    pub async fn invalidate(&self, key: &str) {
        self.bump_generation(key);
        self.remove_quietly(key).await;
        debug!(key, "Cache invalidated");
    }

    /// 태그에 해당하는 모든 키를 무효화합니다.
    pub async fn invalidate_tag(&self, tag: CacheTag, id: Option<i64>) {
        for key in self.invalidator.keys_for(tag, id) {
            self.invalidate(&key).await;
        }
    }

    /// 캐시에 있으면 반환하고, 없으면 `fetch`로 조회해 캐시를 채웁니다.
    ///
    /// `fetch` 오류는 그대로 전파되며 캐시는 채워지지 않습니다.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &str, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(key).await {
            return Ok(cached);
        }

        let generation = self.generation(key);
        let value = fetch().await?;

        if self.generation(key) != generation {
            debug!(key, "Invalidated during fetch, not populating cache");
            return Ok(value);
        }
        self.set(key, &value, self.default_ttl).await;

        // 저장 도중 무효화가 끼어들었으면 방금 쓴 값을 지웁니다.
        if self.generation(key) != generation {
            self.remove_quietly(key).await;
        }
        Ok(value)
    }

    /// 현재 통계.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            errors: self.errors.load(Ordering::Relaxed),
            hit_rate,
        }
    }

    /// 통계를 초기화합니다.
    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }

    async fn remove_quietly(&self, key: &str) {
        if let Err(e) = self.backend.remove(key).await {
            self.errors.fetch_add(1, Ordering::Relaxed);
            warn!(key, error = %e, "Cache invalidation failed");
        }
    }

    fn generation(&self, key: &str) -> u64 {
        self.generations
            .lock()
            .map(|g| g.get(key).copied().unwrap_or(0))
            .unwrap_or_else(|poisoned| poisoned.into_inner().get(key).copied().unwrap_or(0))
    }

    fn bump_generation(&self, key: &str) {
        let mut generations = self
            .generations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *generations.entry(key.to_string()).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::error::DataError;
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: i64,
        name: String,
    }

    fn setup() -> (Arc<MemoryCache>, CacheAside) {
        let backend = Arc::new(MemoryCache::new());
        let ttl = CacheTtl::new(
            Some(Duration::from_secs(1800)),
            Some(Duration::from_secs(300)),
        );
        (backend.clone(), CacheAside::new(backend, ttl))
    }

    #[tokio::test]
    async fn test_consecutive_gets_after_set_are_identical() {
        let (_, cache) = setup();
        let items = vec![Item { id: 1, name: "crate".to_string() }];
        cache.set("items", &items, cache.default_ttl()).await;

        let first: Vec<Item> = cache.get("items").await.unwrap();
        let second: Vec<Item> = cache.get("items").await.unwrap();
        assert_eq!(first, items);
        assert_eq!(first, second);
        assert_eq!(cache.stats().hits, 2);
    }

    #[tokio::test]
    async fn test_invalidate_guarantees_next_miss() {
        let (_, cache) = setup();
        cache.set("items", &vec![1, 2, 3], cache.default_ttl()).await;
        cache.invalidate("items").await;

        assert!(cache.get::<Vec<i32>>("items").await.is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_returned_value_is_a_copy() {
        let (_, cache) = setup();
        cache.set("items", &vec![Item { id: 1, name: "a".to_string() }], cache.default_ttl()).await;

        let mut mine: Vec<Item> = cache.get("items").await.unwrap();
        mine[0].name = "mutated".to_string();

        let fresh: Vec<Item> = cache.get("items").await.unwrap();
        assert_eq!(fresh[0].name, "a");
    }

    #[tokio::test]
    async fn test_get_or_fetch_populates_once() {
        let (_, cache) = setup();
        let calls = AtomicU64::new(0);

        for _ in 0..3 {
            let value: Result<Vec<i32>, DataError> = cache
                .get_or_fetch("nums", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![7, 8])
                })
                .await;
            assert_eq!(value.unwrap(), vec![7, 8]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates_and_skips_population() {
        let (backend, cache) = setup();
        let result: Result<Vec<i32>, DataError> = cache
            .get_or_fetch("nums", || async {
                Err(DataError::Unavailable("db down".to_string()))
            })
            .await;

        assert!(matches!(result, Err(DataError::Unavailable(_))));
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalidation_during_fetch_skips_population() {
        let (backend, cache) = setup();

        let value: Result<Vec<i32>, DataError> = cache
            .get_or_fetch("nums", || async {
                // 조회 도중 다른 요청이 변경 후 무효화
                cache.invalidate("nums").await;
                Ok(vec![1])
            })
            .await;

        assert_eq!(value.unwrap(), vec![1]);
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_backend_failure_degrades_to_miss() {
        let (backend, cache) = setup();
        backend.set_failing(true);

        let value: Result<Vec<i32>, DataError> =
            cache.get_or_fetch("nums", || async { Ok(vec![4]) }).await;
        assert_eq!(value.unwrap(), vec![4]);

        // 무효화 실패도 패닉/오류 없이 통과
        cache.invalidate("nums").await;

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert!(stats.errors >= 2);
    }

    #[tokio::test]
    async fn test_invalidate_tag_uses_collection_key() {
        let (_, cache) = setup();
        cache.set(super::super::keys::ALL_USERS, &vec![1], cache.default_ttl()).await;
        cache.invalidate_tag(CacheTag::Users, Some(1)).await;
        assert!(cache.get::<Vec<i32>>(super::super::keys::ALL_USERS).await.is_none());
    }

    #[tokio::test]
    async fn test_hit_rate() {
        let (_, cache) = setup();
        assert_eq!(cache.stats().hit_rate, 0.0);
        cache.set("k", &1, cache.default_ttl()).await;
        let _ = cache.get::<i32>("k").await;
        let _ = cache.get::<i32>("missing").await;
        assert_eq!(cache.stats().hit_rate, 0.5);

        cache.reset_stats();
        assert_eq!(cache.stats().hits, 0);
    }
}
