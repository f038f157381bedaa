//! 화물 엔티티.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 화물.
///
/// 소유자가 없는 공용 리소스입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cargo {
    pub id: i64,
    pub name: String,
    /// 무게 (kg)
    pub weight: Decimal,
    pub destination: String,
}

/// 새 화물 입력.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCargo {
    pub name: String,
    pub weight: Decimal,
    pub destination: String,
}

impl NewCargo {
    pub fn with_id(self, id: i64) -> Cargo {
        Cargo {
            id,
            name: self.name,
            weight: self.weight,
            destination: self.destination,
        }
    }
}
