//! Redis 캐시 백엔드.
//!
//! 값은 절대 만료 시각과 슬라이딩 간격을 함께 담은 봉투(envelope)로 저장합니다.
//! Redis 키 TTL은 항상 "다음 슬라이딩 만료"와 "절대 만료" 중 이른 쪽으로 설정되므로,
//! 읽을 때마다 TTL을 다시 계산해 슬라이딩 창을 연장합니다.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{CacheBackend, CacheTtl};
use crate::error::{DataError, Result};

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    /// 절대 만료 (Unix epoch 밀리초)
    #[serde(skip_serializing_if = "Option::is_none")]
    absolute_expiry_ms: Option<i64>,
    /// 슬라이딩 간격 (밀리초)
    #[serde(skip_serializing_if = "Option::is_none")]
    sliding_ms: Option<u64>,
    payload: String,
}

impl Envelope {
    /// `now_ms` 기준 남은 TTL. `Some(0)`이면 이미 만료.
    fn remaining_ms(&self, now_ms: i64) -> Option<u64> {
        let absolute_left = self
            .absolute_expiry_ms
            .map(|deadline| deadline.saturating_sub(now_ms).max(0) as u64);
        match (absolute_left, self.sliding_ms) {
            (Some(a), Some(s)) => Some(a.min(s)),
            (a, s) => a.or(s),
        }
    }
}

/// Redis 연결 래퍼.
///
/// `ConnectionManager`는 복제 비용이 낮고 자동 재연결하므로
/// 작업마다 복제해서 사용합니다. I/O 동안 락을 잡지 않습니다.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    key_prefix: String,
}

impl RedisCache {
    /// 새로운 Redis 캐시 연결을 생성합니다.
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> Result<Self> {
        info!("Connecting to Redis...");

        let client = Client::open(url)?;
        let connection = client.get_connection_manager().await?;

        info!("Redis connection established");

        Ok(Self {
            connection,
            key_prefix: key_prefix.into(),
        })
    }

    /// Redis 상태를 확인합니다.
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection.clone();
        let result: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(result == "PONG")
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let full_key = self.full_key(key);
        let mut conn = self.connection.clone();

        let raw: Option<String> = conn.get(&full_key).await?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let envelope: Envelope = serde_json::from_str(&raw)?;

        match envelope.remaining_ms(Utc::now().timestamp_millis()) {
            Some(0) => {
                let _: i64 = conn.del(&full_key).await?;
                Ok(None)
            }
            Some(ttl_ms) if envelope.sliding_ms.is_some() => {
                let _: bool = conn.pexpire(&full_key, ttl_ms as i64).await?;
                Ok(Some(envelope.payload))
            }
            _ => Ok(Some(envelope.payload)),
        }
    }

    async fn set_raw(&self, key: &str, value: String, ttl: CacheTtl) -> Result<()> {
        let full_key = self.full_key(key);
        let now_ms = Utc::now().timestamp_millis();
        let envelope = Envelope {
            absolute_expiry_ms: ttl.absolute.map(|a| now_ms + a.as_millis() as i64),
            sliding_ms: ttl.sliding.map(|s| s.as_millis() as u64),
            payload: value,
        };
        let json = serde_json::to_string(&envelope)?;

        let mut conn = self.connection.clone();
        match ttl.initial_window() {
            Some(window) if window == Duration::ZERO => {
                return Err(DataError::InvalidData(format!(
                    "zero TTL for cache key {}",
                    key
                )));
            }
            Some(window) => {
                let _: () = conn.pset_ex(&full_key, json, window.as_millis() as u64).await?;
            }
            None => {
                let _: () = conn.set(&full_key, json).await?;
            }
        }

        debug!(key, "Cache entry stored");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        let _: i64 = conn.del(self.full_key(key)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_remaining_bounded_by_absolute() {
        let envelope = Envelope {
            absolute_expiry_ms: Some(10_000),
            sliding_ms: Some(3_000),
            payload: String::new(),
        };
        assert_eq!(envelope.remaining_ms(0), Some(3_000));
        assert_eq!(envelope.remaining_ms(8_000), Some(2_000));
        assert_eq!(envelope.remaining_ms(12_000), Some(0));
    }

    #[test]
    fn test_envelope_without_ttl() {
        let envelope = Envelope {
            absolute_expiry_ms: None,
            sliding_ms: None,
            payload: "x".to_string(),
        };
        assert_eq!(envelope.remaining_ms(0), None);
    }
}
