//! 요청 단위 신원.

use cargoms_core::{Role, User};
use chrono::{DateTime, Utc};

/// 검증된 토큰에서 얻은 호출자 신원.
///
/// 토큰 검증기만 생성하며 저장되지 않습니다. 모든 인가/서비스 호출에 명시적으로 전달됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: i64,
    pub username: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(
        subject_id: i64,
        username: impl Into<String>,
        role: Role,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_id,
            username: username.into(),
            role,
            expires_at,
        }
    }

    /// 사용자 레코드로부터 신원 생성 (로그인 시).
    pub fn for_user(user: &User, expires_at: DateTime<Utc>) -> Self {
        Self::new(user.id, user.username.clone(), user.role, expires_at)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
