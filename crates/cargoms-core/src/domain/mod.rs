//! 도메인 모델.
//!
//! - [`Role`]: 사용자 역할
//! - [`User`]: 사용자 계정
//! - [`Cargo`]: 화물
//! - [`Order`]: 화물 주문과 상태 라이프사이클

mod cargo;
mod order;
mod role;
mod user;

pub use cargo::{Cargo, NewCargo};
pub use order::{NewOrder, Order, OrderStatus};
pub use role::Role;
pub use user::{NewUser, User};
