//! 사용자 엔티티.

use serde::{Deserialize, Serialize};

use super::Role;

/// 사용자 계정.
///
/// 저장소가 원본을 소유하며, 캐시는 직렬화된 읽기 전용 사본만 보관합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// 고유 사용자 이름
    pub username: String,
    pub email: String,
    /// PHC 형식 비밀번호 해시
    pub password_hash: String,
    pub role: Role,
}

/// 새 사용자 입력 (ID는 저장소가 부여).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    /// ID를 부여하여 [`User`]로 변환.
    pub fn with_id(self, id: i64) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
        }
    }
}
