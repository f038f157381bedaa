//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 저장소에 연결할 수 없음
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 레코드를 찾을 수 없음
    #[error("Record not found: {0}")]
    NotFound(String),

    /// 고유 제약 조건 위반
    #[error("Duplicate record: {0}")]
    DuplicateError(String),

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// 캐시 오류
    #[error("Cache error: {0}")]
    CacheError(String),

    /// 잘못된 데이터 형식
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// 마이그레이션 오류
    #[error("Migration error: {0}")]
    MigrationError(String),
}

impl DataError {
    /// 인프라(연결/쿼리) 장애 여부.
    pub fn is_dependency_failure(&self) -> bool {
        !matches!(self, DataError::NotFound(_) | DataError::DuplicateError(_))
    }
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DataError::NotFound("Row not found".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DataError::Unavailable(err.to_string())
            }
            sqlx::Error::Database(db_err) => from_database_error(
                db_err.code().as_deref().unwrap_or_default(),
                db_err.constraint(),
                db_err.message(),
            ),
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

/// PostgreSQL SQLSTATE 코드 분류.
///
/// - `23505`: 고유 제약 조건 위반
/// - `23503`: 외래 키 위반. 참조 대상이 확인 후 삭제된 경우이므로 `NotFound`
fn from_database_error(code: &str, constraint: Option<&str>, message: &str) -> DataError {
    match code {
        "23505" => DataError::DuplicateError(message.to_string()),
        "23503" => {
            let what = match constraint {
                Some(name) if name.contains("user_id") => "Referenced user",
                Some(name) if name.contains("cargo_id") => "Referenced cargo",
                _ => "Referenced record",
            };
            DataError::NotFound(format!("{} not found.", what))
        }
        _ => DataError::QueryError(message.to_string()),
    }
}

impl From<redis::RedisError> for DataError {
    fn from(err: redis::RedisError) -> Self {
        DataError::CacheError(err.to_string())
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_is_duplicate() {
        let err = from_database_error("23505", Some("users_username_key"), "duplicate key");
        assert!(matches!(err, DataError::DuplicateError(_)));
    }

    #[test]
    fn test_foreign_key_violation_is_not_found() {
        let err = from_database_error(
            "23503",
            Some("orders_cargo_id_fkey"),
            "insert or update on table \"orders\" violates foreign key constraint",
        );
        assert!(matches!(&err, DataError::NotFound(msg) if msg == "Referenced cargo not found."));
        assert!(!err.is_dependency_failure());

        let err = from_database_error("23503", Some("orders_user_id_fkey"), "violation");
        assert!(matches!(err, DataError::NotFound(msg) if msg == "Referenced user not found."));

        let err = from_database_error("23503", None, "violation");
        assert!(matches!(err, DataError::NotFound(msg) if msg == "Referenced record not found."));
    }

    #[test]
    fn test_other_codes_are_query_errors() {
        let err = from_database_error("42P01", None, "relation does not exist");
        assert!(matches!(err, DataError::QueryError(msg) if msg == "relation does not exist"));
    }
}
