//! 핵심 도메인 에러 타입.

use thiserror::Error;

use crate::domain::OrderStatus;

/// 핵심 도메인 에러.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// 알 수 없는 역할 문자열
    #[error("알 수 없는 역할: {0}")]
    UnknownRole(String),

    /// 알 수 없는 주문 상태 문자열
    #[error("알 수 없는 주문 상태: {0}")]
    UnknownStatus(String),

    /// 허용되지 않는 주문 상태 전이
    #[error("주문 상태를 {from}에서 {to}(으)로 변경할 수 없습니다")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}
