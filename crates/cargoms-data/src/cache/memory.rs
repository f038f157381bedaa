//! 인메모리 캐시 백엔드.
//!
//! Redis 없이 실행할 때와 테스트에서 사용합니다. 시간은 `tokio::time::Instant`를
//! 사용하므로 테스트에서 `tokio::time::pause`/`advance`로 만료를 재현할 수 있습니다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{CacheBackend, CacheTtl};
use crate::error::{DataError, Result};

/// 캐시 항목.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    absolute_expiry: Option<Instant>,
    sliding: Option<Duration>,
    sliding_expiry: Option<Instant>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, value: String, ttl: CacheTtl, now: Instant) -> Self {
        let absolute_expiry = ttl.absolute.map(|a| now + a);
        let mut entry = Self {
            key: key.into(),
            value,
            absolute_expiry,
            sliding: ttl.sliding,
            sliding_expiry: None,
        };
        entry.touch(now);
        entry
    }

    /// 만료 여부. 두 만료 시점 중 하나라도 지났으면 만료입니다.
    pub fn is_expired(&self, now: Instant) -> bool {
        let past = |deadline: Option<Instant>| deadline.is_some_and(|d| now >= d);
        past(self.absolute_expiry) || past(self.sliding_expiry)
    }

    /// 슬라이딩 창을 재설정합니다. 절대 만료를 넘지 않습니다.
    pub fn touch(&mut self, now: Instant) {
        if let Some(sliding) = self.sliding {
            let next = now + sliding;
            self.sliding_expiry = Some(match self.absolute_expiry {
                Some(absolute) => next.min(absolute),
                None => next,
            });
        }
    }
}

/// 인메모리 캐시.
///
/// `set_failing(true)`로 캐시 장애를 흉내낼 수 있습니다.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    failing: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 모든 작업을 실패시킵니다 (장애 주입용).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// 현재 저장된(만료 여부와 무관한) 항목 수.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DataError::CacheError("memory cache is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        let expired = match entries.get_mut(key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired(now) => {
                entry.touch(now);
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
        };
        if expired {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set_raw(&self, key: &str, value: String, ttl: CacheTtl) -> Result<()> {
        self.check()?;
        let entry = CacheEntry::new(key, value, ttl, Instant::now());
        self.entries.lock().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check()?;
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
