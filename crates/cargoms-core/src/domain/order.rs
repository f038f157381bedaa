//! 주문 엔티티와 상태 라이프사이클.
//!
//! 상태 전이 규칙:
//!
//! ```text
//! Pending → Processing → Shipped → InTransit → Delivered
//!    └──────────┴───────────┴──────────┴──────→ Cancelled
//! ```
//!
//! 전이는 항상 앞으로만 진행되며 `Delivered`와 `Cancelled`는 종료 상태입니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// 주문 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// 접수됨 (생성 시 초기 상태)
    Pending,
    /// 처리 중
    Processing,
    /// 출고됨
    Shipped,
    /// 운송 중
    InTransit,
    /// 배송 완료 (종료)
    Delivered,
    /// 취소됨 (종료)
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::InTransit => "InTransit",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// 종료 상태 여부.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// 진행 순서 (취소는 별도 취급).
    fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Processing => 1,
            Self::Shipped => 2,
            Self::InTransit => 3,
            Self::Delivered => 4,
            Self::Cancelled => u8::MAX,
        }
    }

    /// `next`로의 전이가 허용되는지 확인.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Cancelled => true,
            _ => next.rank() > self.rank(),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownStatus(s.to_string()))
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 화물 주문.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// 주문 소유자 (User ID)
    pub user_id: i64,
    pub cargo_id: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// 상태를 전이하고 `updated_at`을 갱신합니다.
    pub fn transition_to(&mut self, next: OrderStatus, now: DateTime<Utc>) -> CoreResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch(now);
        Ok(())
    }

    /// `updated_at` 갱신. `created_at`보다 이전으로는 가지 않습니다.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}

/// 새 주문 입력.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: i64,
    pub cargo_id: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewOrder {
    /// `Pending` 상태의 새 주문.
    pub fn pending(user_id: i64, cargo_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            cargo_id,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(self, id: i64) -> Order {
        Order {
            id,
            user_id: self.user_id,
            cargo_id: self.cargo_id,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
