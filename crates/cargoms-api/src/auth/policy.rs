//! 인가 정책.
//!
//! (신원, 접근 등급, 리소스 소유자 ID) → 허용/거부. I/O 없는 순수 함수입니다.

use super::Identity;
use crate::error::ServiceError;

/// 작업의 접근 등급.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessClass {
    /// 인증 불필요.
    ///
    /// 가입/로그인/헬스체크가 이 등급이며, 이 경로들은 [`Identity`] 없이
    /// 처리되므로 정책 함수를 호출하지 않습니다. 호출되면 항상 허용입니다.
    Public,
    /// 인증된 모든 호출자
    Authenticated,
    /// 리소스 소유자 또는 관리자
    OwnerOrAdmin,
    /// 관리자 전용
    AdminOnly,
}

/// 접근 허용 여부.
///
/// `OwnerOrAdmin`에서 소유자를 알 수 없으면(`None`) 관리자만 허용됩니다.
pub fn authorize(identity: &Identity, class: AccessClass, owner_id: Option<i64>) -> bool {
    match class {
        AccessClass::Public | AccessClass::Authenticated => true,
        AccessClass::OwnerOrAdmin => {
            identity.is_admin() || owner_id == Some(identity.subject_id)
        }
        AccessClass::AdminOnly => identity.is_admin(),
    }
}

/// [`authorize`]의 Result 버전. 거부 시 `Forbidden`.
pub fn require(
    identity: &Identity,
    class: AccessClass,
    owner_id: Option<i64>,
) -> Result<(), ServiceError> {
    if authorize(identity, class, owner_id) {
        Ok(())
    } else {
        Err(ServiceError::forbidden(
            "You do not have permission to perform this action.",
        ))
    }
}
