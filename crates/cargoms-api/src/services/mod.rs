//! 엔티티 서비스.
//!
//! 모든 서비스 메서드는 호출자 [`Identity`](crate::auth::Identity)를 명시적으로 받습니다.
//! 흐름은 항상 같습니다:
//!
//! 1. 입력 검증 → `BadRequest`
//! 2. 인가 → `Forbidden`
//! 3. 읽기는 캐시 우선, 미스면 저장소 조회 후 캐시 채우기
//! 4. 쓰기는 저장소 변경 후 관련 태그 무효화, 둘 다 완료된 뒤 반환

pub mod cargo_service;
pub mod order_service;
pub mod user_service;

pub use cargo_service::{CargoInput, CargoService};
pub use order_service::{CreateOrderInput, OrderDetails, OrderService, UpdateOrderStatusInput};
pub use user_service::{LoginInput, LoginResult, RegisterInput, UpdateUserInput, UserService};

use crate::error::{ServiceError, ServiceResult};

/// 본문 ID와 경로 ID가 다르면 `BadRequest`.
pub(crate) fn ensure_same_id(path_id: i64, body_id: i64) -> ServiceResult<()> {
    if path_id == body_id {
        Ok(())
    } else {
        Err(ServiceError::bad_request("ID mismatch."))
    }
}
