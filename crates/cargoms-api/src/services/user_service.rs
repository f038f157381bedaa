//! 사용자 서비스.

use std::sync::Arc;

use cargoms_core::{NewUser, Role, User};
use cargoms_data::{keys, CacheAside, CacheTag, UserStore};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::auth::{
    require, spawn_hash_password, spawn_verify_against_dummy, spawn_verify_password, AccessClass,
    Identity, PasswordError, TokenService,
};
use crate::error::{ServiceError, ServiceResult};

use super::ensure_same_id;

const INVALID_CREDENTIALS: &str = "Invalid credentials.";

/// 회원 가입 입력.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters."))]
    pub username: String,
    #[validate(
        email(message = "Email must be a valid address."),
        length(max = 100, message = "Email must be at most 100 characters.")
    )]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    pub password: String,
}

/// 로그인 입력.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1, message = "Username is required."))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

/// 로그인 결과.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// 사용자 수정 입력. 비밀번호는 선택이며 역할은 바꿀 수 없습니다.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserInput {
    pub id: i64,
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters."))]
    pub username: String,
    #[validate(
        email(message = "Email must be a valid address."),
        length(max = 100, message = "Email must be at most 100 characters.")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    pub password: Option<String>,
}

/// 사용자 서비스.
pub struct UserService {
    store: Arc<dyn UserStore>,
    cache: Arc<CacheAside>,
    tokens: Arc<TokenService>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, cache: Arc<CacheAside>, tokens: Arc<TokenService>) -> Self {
        Self {
            store,
            cache,
            tokens,
        }
    }

    /// 전체 사용자 (관리자).
    #[instrument(skip(self, identity), fields(caller = identity.subject_id))]
    pub async fn get_all_users(&self, identity: &Identity) -> ServiceResult<Vec<User>> {
        require(identity, AccessClass::AdminOnly, None)?;
        self.cached_users().await
    }

    /// 단일 사용자 (본인 또는 관리자).
    ///
    /// 캐시된 목록에서 먼저 찾고, 없으면 저장소를 조회합니다.
    #[instrument(skip(self, identity), fields(caller = identity.subject_id))]
    pub async fn get_user_by_id(&self, identity: &Identity, id: i64) -> ServiceResult<User> {
        require(identity, AccessClass::OwnerOrAdmin, Some(id))?;

        if let Some(users) = self.cache.get::<Vec<User>>(keys::ALL_USERS).await {
            if let Some(user) = users.into_iter().find(|u| u.id == id) {
                return Ok(user);
            }
        }

        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("User {} not found.", id)))
    }

    /// 사용자 이름으로 조회 (내부용, 캐시 우회).
    pub async fn get_user_by_username(&self, username: &str) -> ServiceResult<Option<User>> {
        Ok(self.store.get_by_username(username).await?)
    }

    /// 회원 가입. 역할은 항상 `User`입니다.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register_user(&self, input: RegisterInput) -> ServiceResult<User> {
        input.validate()?;

        if self.store.get_by_username(&input.username).await?.is_some() {
            return Err(ServiceError::conflict("Username already exists."));
        }

        let password_hash = spawn_hash_password(input.password).await?;
        let user = self
            .store
            .add(NewUser {
                username: input.username,
                email: input.email,
                password_hash,
                role: Role::User,
            })
            .await?;

        self.cache.invalidate_tag(CacheTag::Users, Some(user.id)).await;
        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// 로그인.
    ///
    /// 알 수 없는 사용자와 잘못된 비밀번호는 같은 에러를 반환하며,
    /// 알 수 없는 사용자도 더미 해시로 검증을 수행합니다.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: LoginInput) -> ServiceResult<LoginResult> {
        input.validate()?;

        let Some(user) = self.store.get_by_username(&input.username).await? else {
            spawn_verify_against_dummy(input.password).await?;
            warn!("Login failed");
            return Err(ServiceError::unauthorized(INVALID_CREDENTIALS));
        };

        let verification = spawn_verify_password(user.password_hash.clone(), input.password).await;
        let verified = match verification {
            Ok(result) => result.is_match(),
            Err(e @ PasswordError::TaskFailed(_)) => return Err(e.into()),
            Err(e) => {
                warn!(user_id = user.id, error = %e, "Stored password hash is unreadable");
                false
            }
        };
        if !verified {
            warn!("Login failed");
            return Err(ServiceError::unauthorized(INVALID_CREDENTIALS));
        }

        let issued = self.tokens.issue_for(&user)?;
        info!(user_id = user.id, "User logged in");
        Ok(LoginResult {
            token: issued.token,
            expires_at: issued.expires_at,
            user,
        })
    }

    /// 사용자 수정 (본인 또는 관리자).
    #[instrument(skip(self, identity, input), fields(caller = identity.subject_id))]
    pub async fn update_user(
        &self,
        identity: &Identity,
        id: i64,
        input: UpdateUserInput,
    ) -> ServiceResult<User> {
        ensure_same_id(id, input.id)?;
        input.validate()?;
        require(identity, AccessClass::OwnerOrAdmin, Some(id))?;

        let mut user = self.load(id).await?;

        if user.username != input.username {
            if let Some(existing) = self.store.get_by_username(&input.username).await? {
                if existing.id != id {
                    return Err(ServiceError::conflict("Username already exists."));
                }
            }
        }

        user.username = input.username;
        user.email = input.email;
        if let Some(password) = input.password {
            user.password_hash = spawn_hash_password(password).await?;
        }

        self.store.update(&user).await?;
        self.cache.invalidate_tag(CacheTag::Users, Some(id)).await;
        info!(user_id = id, "User updated");
        Ok(user)
    }

    /// 역할 변경 (관리자).
    #[instrument(skip(self, identity), fields(caller = identity.subject_id))]
    pub async fn change_user_role(
        &self,
        identity: &Identity,
        id: i64,
        role: Role,
    ) -> ServiceResult<User> {
        require(identity, AccessClass::AdminOnly, None)?;

        let mut user = self.load(id).await?;
        user.role = role;

        self.store.update(&user).await?;
        self.cache.invalidate_tag(CacheTag::Users, Some(id)).await;
        info!(user_id = id, role = %role, "User role changed");
        Ok(user)
    }

    /// 사용자 삭제 (관리자). 해당 사용자의 주문도 함께 삭제됩니다.
    #[instrument(skip(self, identity), fields(caller = identity.subject_id))]
    pub async fn delete_user(&self, identity: &Identity, id: i64) -> ServiceResult<()> {
        require(identity, AccessClass::AdminOnly, None)?;

        self.store.delete(id).await?;
        self.cache.invalidate_tag(CacheTag::Users, Some(id)).await;
        self.cache.invalidate_tag(CacheTag::Orders, None).await;
        info!(user_id = id, "User deleted");
        Ok(())
    }

    async fn cached_users(&self) -> ServiceResult<Vec<User>> {
        let store = &self.store;
        Ok(self
            .cache
            .get_or_fetch(keys::ALL_USERS, || async { store.get_all().await })
            .await?)
    }

    async fn load(&self, id: i64) -> ServiceResult<User> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("User {} not found.", id)))
    }
}
