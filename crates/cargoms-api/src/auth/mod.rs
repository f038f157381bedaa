//! 인증/인가 모듈.
//!
//! - [`password`]: Argon2 기반 자격 증명 검증
//! - [`jwt`]: 서명된 신원 토큰 발급/검증
//! - [`policy`]: (신원, 접근 등급, 소유자) → 허용/거부
//! - [`middleware`]: Axum용 인증 추출기

pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;

pub use identity::Identity;
pub use jwt::{Claims, IssuedToken, TokenError, TokenService};
pub use middleware::Authenticated;
pub use password::{
    hash_password, hash_password_with_salt, spawn_hash_password, spawn_verify_against_dummy,
    spawn_verify_password, verify_against_dummy, verify_password, PasswordError,
    PasswordVerification,
};
pub use policy::{authorize, require, AccessClass};
