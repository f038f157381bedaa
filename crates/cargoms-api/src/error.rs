//! 서비스 에러와 API 에러 응답.
//!
//! 모든 실패는 안정적인 에러 코드와 사람이 읽을 수 있는 메시지를 가집니다.
//!
//! | 코드 | HTTP |
//! |---|---|
//! | `BAD_REQUEST` | 400 |
//! | `UNAUTHORIZED` | 401 |
//! | `FORBIDDEN` | 403 |
//! | `NOT_FOUND` | 404 |
//! | `CONFLICT` | 409 |
//! | `INTERNAL_ERROR` | 500 |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cargoms_core::CoreError;
use cargoms_data::DataError;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::auth::{PasswordError, TokenError};

/// 내부 에러 시 클라이언트에 노출되는 메시지.
const INTERNAL_MESSAGE: &str = "An internal error occurred.";

/// API 에러 응답 본문.
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Order 42 not found.",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드
    pub code: String,
    /// 에러 메시지
    pub message: String,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    pub timestamp: i64,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// 서비스 계층 에러.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// 입력 검증 실패
    #[error("{0}")]
    BadRequest(String),

    /// 인증 실패 (토큰 없음/무효, 자격 증명 불일치)
    #[error("{0}")]
    Unauthorized(String),

    /// 인가 실패 (인증됐지만 권한 없음)
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// 중복 또는 허용되지 않는 상태 변경
    #[error("{0}")]
    Conflict(String),

    /// 의존성 장애 (저장소 불가 등). 메시지는 로그에만 남습니다.
    #[error("internal error: {0}")]
    Internal(String),
}

/// 서비스 Result 타입.
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// 안정적인 에러 코드.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "BAD_REQUEST",
            ServiceError::Unauthorized(_) => "UNAUTHORIZED",
            ServiceError::Forbidden(_) => "FORBIDDEN",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::Conflict(_) => "CONFLICT",
            ServiceError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 클라이언트에 보여줄 메시지. 내부 에러는 상세 내용을 숨깁니다.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Internal(_) => INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// 응답 본문.
    pub fn to_response_body(&self) -> ApiErrorResponse {
        ApiErrorResponse::new(self.kind(), self.public_message())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if let ServiceError::Internal(detail) = &self {
            error!(error = %detail, "Request failed with internal error");
        }
        (self.status_code(), Json(self.to_response_body())).into_response()
    }
}

impl From<DataError> for ServiceError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound(msg) => ServiceError::NotFound(msg),
            DataError::DuplicateError(msg) => ServiceError::Conflict(msg),
            DataError::InvalidData(msg) => ServiceError::BadRequest(msg),
            other => {
                error!(error = %other, "Dependency failure");
                ServiceError::Internal(other.to_string())
            }
        }
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidTransition { .. } => ServiceError::Conflict(err.to_string()),
            CoreError::UnknownRole(_) | CoreError::UnknownStatus(_) => {
                ServiceError::BadRequest(err.to_string())
            }
            CoreError::Config(msg) => ServiceError::Internal(msg),
        }
    }
}

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encoding(msg) => ServiceError::Internal(msg),
            other => {
                warn!(error = %other, "Token rejected");
                ServiceError::Unauthorized("Invalid or expired token.".to_string())
            }
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();
        ServiceError::BadRequest(messages.join(" "))
    }
}
