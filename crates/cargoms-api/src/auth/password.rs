//! 비밀번호 해싱 유틸리티.
//!
//! Argon2id 기반 해싱 및 검증. 순수 함수이며 I/O가 없습니다.
//!
//! 해싱은 CPU를 오래 점유하므로 async 코드에서는 blocking thread pool에서
//! 실행하는 `spawn_*` 함수를 사용합니다.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;

/// 비밀번호 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패")]
    HashingFailed,
    #[error("잘못된 솔트 형식")]
    InvalidSalt,
    #[error("잘못된 해시 형식")]
    InvalidHashFormat,
    #[error("해싱 태스크 실행 실패: {0}")]
    TaskFailed(String),
}

/// 검증 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordVerification {
    Match,
    Mismatch,
}

impl PasswordVerification {
    pub fn is_match(&self) -> bool {
        matches!(self, PasswordVerification::Match)
    }
}

/// 존재하지 않는 사용자 로그인 시 검증에 사용하는 해시.
///
/// 실제 해시와 같은 파라미터로 만들어 두 경로의 소요 시간을 맞춥니다.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("cargoms-timing-equalizer").ok());

/// 비밀번호 해싱. 솔트는 자동으로 생성됩니다.
///
/// PHC 형식 문자열을 반환합니다 (`$argon2id$v=19$...`).
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    hash_with(password, &salt)
}

/// 주어진 솔트(B64, 패딩 없음)로 해싱합니다.
pub fn hash_password_with_salt(password: &str, salt: &str) -> Result<String, PasswordError> {
    let salt = SaltString::from_b64(salt).map_err(|_| PasswordError::InvalidSalt)?;
    hash_with(password, &salt)
}

fn hash_with(password: &str, salt: &SaltString) -> Result<String, PasswordError> {
    Argon2::default()
        .hash_password(password.as_bytes(), salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::HashingFailed)
}

/// 저장된 해시와 비밀번호를 비교합니다.
///
/// 해시 문자열이 PHC 형식이 아니면 에러입니다.
pub fn verify_password(hash: &str, password: &str) -> Result<PasswordVerification, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    Ok(
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => PasswordVerification::Match,
            Err(_) => PasswordVerification::Mismatch,
        },
    )
}

/// 더미 해시로 검증을 수행합니다. 결과는 항상 버려집니다.
pub fn verify_against_dummy(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(hash, password);
    }
}

/// blocking thread pool에서 실행하고 결과를 기다립니다.
async fn run_blocking<T, F>(work: F) -> Result<T, PasswordError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PasswordError::TaskFailed(e.to_string()))
}

/// [`hash_password`]를 blocking thread pool에서 실행합니다.
pub async fn spawn_hash_password(password: String) -> Result<String, PasswordError> {
    run_blocking(move || hash_password(&password)).await?
}

/// [`verify_password`]를 blocking thread pool에서 실행합니다.
pub async fn spawn_verify_password(
    hash: String,
    password: String,
) -> Result<PasswordVerification, PasswordError> {
    run_blocking(move || verify_password(&hash, &password)).await?
}

/// [`verify_against_dummy`]를 blocking thread pool에서 실행합니다.
pub async fn spawn_verify_against_dummy(password: String) -> Result<(), PasswordError> {
    run_blocking(move || verify_against_dummy(&password)).await
}
