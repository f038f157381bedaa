//! 서비스 계층 통합 테스트.
//!
//! 인메모리 저장소/캐시로 인증, 인가, 캐시 일관성, 주문 라이프사이클을 검증합니다.

use std::sync::Arc;

use cargoms_api::auth::{verify_password, Identity, PasswordVerification};
use cargoms_api::services::{
    CargoInput, CreateOrderInput, LoginInput, RegisterInput, UpdateOrderStatusInput,
    UpdateUserInput,
};
use cargoms_api::{AppState, ServiceError, Stores, TokenService};
use cargoms_core::{Cargo, JwtConfig, NewCargo, NewUser, OrderStatus, Role, User};
use cargoms_data::{CacheAside, CacheBackend, CacheTtl, CargoStore, MemoryCache, MemoryStore, UserStore};
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

struct Harness {
    store: Arc<MemoryStore>,
    backend: Arc<MemoryCache>,
    cache: Arc<CacheAside>,
    state: AppState,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let backend = Arc::new(MemoryCache::new());
    let dyn_backend: Arc<dyn CacheBackend> = backend.clone();
    let cache = Arc::new(CacheAside::new(
        dyn_backend,
        CacheTtl::new(
            Some(std::time::Duration::from_secs(1800)),
            Some(std::time::Duration::from_secs(300)),
        ),
    ));
    let tokens = Arc::new(TokenService::new(&JwtConfig::new(
        "integration-test-secret",
        "cargoms",
        "cargoms-clients",
        60,
    )));
    let state = AppState::new(Stores::shared(store.clone()), cache.clone(), tokens);

    Harness {
        store,
        backend,
        cache,
        state,
    }
}

fn identity_of(user: &User) -> Identity {
    Identity::new(user.id, user.username.clone(), user.role, Utc::now() + Duration::hours(1))
}

impl Harness {
    async fn seed_user(&self, username: &str, role: Role) -> User {
        UserStore::add(
            &*self.store,
            NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password_hash: "not-a-real-hash".to_string(),
                role,
            },
        )
        .await
        .unwrap()
    }

    async fn seed_cargo(&self, name: &str) -> Cargo {
        CargoStore::add(
            &*self.store,
            NewCargo {
                name: name.to_string(),
                weight: dec!(12.5),
                destination: "Busan".to_string(),
            },
        )
        .await
        .unwrap()
    }

    async fn register(&self, username: &str, password: &str) -> User {
        self.state
            .users
            .register_user(RegisterInput {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password: password.to_string(),
            })
            .await
            .unwrap()
    }
}

// ==================== 인증 ====================

#[tokio::test]
async fn test_register_stores_verifiable_hash() {
    let h = harness();
    let alice = h.register("alice", "secret1").await;

    assert_eq!(alice.role, Role::User);
    let stored = h.state.users.get_user_by_username("alice").await.unwrap().unwrap();
    assert_eq!(
        verify_password(&stored.password_hash, "secret1").unwrap(),
        PasswordVerification::Match
    );
    assert_eq!(
        verify_password(&stored.password_hash, "wrong").unwrap(),
        PasswordVerification::Mismatch
    );
}

#[tokio::test]
async fn test_register_duplicate_username_conflicts() {
    let h = harness();
    h.register("alice", "secret1").await;

    let err = h
        .state
        .users
        .register_user(RegisterInput {
            username: "alice".to_string(),
            email: "other@example.com".to_string(),
            password: "secret2".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn test_register_validation() {
    let h = harness();
    let err = h
        .state
        .users
        .register_user(RegisterInput {
            username: "bob".to_string(),
            email: "not-an-email".to_string(),
            password: "123".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "BAD_REQUEST");
}

#[tokio::test]
async fn test_login_issues_valid_token() {
    let h = harness();
    let alice = h.register("alice", "secret1").await;

    let result = h
        .state
        .users
        .login(LoginInput {
            username: "alice".to_string(),
            password: "secret1".to_string(),
        })
        .await
        .unwrap();

    let identity = h.state.tokens.validate(&result.token).unwrap();
    assert_eq!(identity.subject_id, alice.id);
    assert_eq!(identity.username, "alice");
    assert_eq!(identity.role, Role::User);
    assert_eq!(identity.expires_at, result.expires_at);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let h = harness();
    h.register("alice", "secret1").await;

    let wrong_password = h
        .state
        .users
        .login(LoginInput {
            username: "alice".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();
    let unknown_user = h
        .state
        .users
        .login(LoginInput {
            username: "nobody".to_string(),
            password: "secret1".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(wrong_password.kind(), "UNAUTHORIZED");
    assert_eq!(wrong_password.kind(), unknown_user.kind());
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
}

// ==================== 사용자 / 캐시 ====================

#[tokio::test]
async fn test_admin_get_all_users_served_from_cache() {
    let h = harness();
    let admin = h.seed_user("admin", Role::Admin).await;
    h.seed_user("alice", Role::User).await;
    let caller = identity_of(&admin);
    h.cache.reset_stats();

    let first = h.state.users.get_all_users(&caller).await.unwrap();
    let hits_after_first = h.cache.stats().hits;
    let second = h.state.users.get_all_users(&caller).await.unwrap();

    assert_eq!(h.cache.stats().hits, hits_after_first + 1);
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn test_non_admin_cannot_list_users() {
    let h = harness();
    let alice = h.seed_user("alice", Role::User).await;

    let err = h.state.users.get_all_users(&identity_of(&alice)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn test_update_user_then_listing_reflects_update() {
    let h = harness();
    let admin = h.seed_user("admin", Role::Admin).await;
    let alice = h.seed_user("alice", Role::User).await;

    // 목록을 캐시에 올려 둔 상태에서 수정
    let before = h.state.users.get_all_users(&identity_of(&admin)).await.unwrap();
    assert!(before.iter().any(|u| u.username == "alice"));

    h.state
        .users
        .update_user(
            &identity_of(&alice),
            alice.id,
            UpdateUserInput {
                id: alice.id,
                username: "alice2".to_string(),
                email: "alice2@example.com".to_string(),
                password: None,
            },
        )
        .await
        .unwrap();

    let after = h.state.users.get_all_users(&identity_of(&admin)).await.unwrap();
    assert!(after.iter().any(|u| u.username == "alice2"));
    assert!(!after.iter().any(|u| u.username == "alice"));

    let fetched = h
        .state
        .users
        .get_user_by_id(&identity_of(&alice), alice.id)
        .await
        .unwrap();
    assert_eq!(fetched.email, "alice2@example.com");
}

#[tokio::test]
async fn test_update_user_rules() {
    let h = harness();
    let alice = h.seed_user("alice", Role::User).await;
    let bob = h.seed_user("bob", Role::User).await;

    let input = |id: i64, username: &str| UpdateUserInput {
        id,
        username: username.to_string(),
        email: "x@example.com".to_string(),
        password: None,
    };

    // 경로/본문 ID 불일치
    let err = h
        .state
        .users
        .update_user(&identity_of(&alice), alice.id, input(bob.id, "alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(_)));

    // 다른 사용자 수정
    let err = h
        .state
        .users
        .update_user(&identity_of(&alice), bob.id, input(bob.id, "bobby"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // 이미 사용 중인 이름
    let err = h
        .state
        .users
        .update_user(&identity_of(&alice), alice.id, input(alice.id, "bob"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn test_get_user_by_id_owner_or_admin() {
    let h = harness();
    let admin = h.seed_user("admin", Role::Admin).await;
    let alice = h.seed_user("alice", Role::User).await;
    let bob = h.seed_user("bob", Role::User).await;

    assert!(h.state.users.get_user_by_id(&identity_of(&alice), alice.id).await.is_ok());
    assert!(h.state.users.get_user_by_id(&identity_of(&admin), alice.id).await.is_ok());
    assert!(matches!(
        h.state.users.get_user_by_id(&identity_of(&bob), alice.id).await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        h.state.users.get_user_by_id(&identity_of(&admin), 9999).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_change_role_is_admin_only() {
    let h = harness();
    let admin = h.seed_user("admin", Role::Admin).await;
    let alice = h.seed_user("alice", Role::User).await;

    let err = h
        .state
        .users
        .change_user_role(&identity_of(&alice), alice.id, Role::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let promoted = h
        .state
        .users
        .change_user_role(&identity_of(&admin), alice.id, Role::Admin)
        .await
        .unwrap();
    assert_eq!(promoted.role, Role::Admin);
}

#[tokio::test]
async fn test_store_unavailable_is_internal_error() {
    let h = harness();
    let admin = h.seed_user("admin", Role::Admin).await;
    h.store.set_available(false);

    let err = h.state.users.get_all_users(&identity_of(&admin)).await.unwrap_err();
    assert_eq!(err.kind(), "INTERNAL_ERROR");
    assert!(!err.public_message().contains("unavailable"));
}

#[tokio::test]
async fn test_cache_outage_does_not_fail_requests() {
    let h = harness();
    let admin = h.seed_user("admin", Role::Admin).await;
    h.backend.set_failing(true);

    let users = h.state.users.get_all_users(&identity_of(&admin)).await.unwrap();
    assert_eq!(users.len(), 1);

    // 변경 후 무효화 실패도 작업을 실패시키지 않음
    let cargo = h
        .state
        .cargos
        .add_cargo(
            &identity_of(&admin),
            CargoInput {
                id: None,
                name: "Steel".to_string(),
                weight: dec!(100),
                destination: "Incheon".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(cargo.name, "Steel");
}

// ==================== 화물 ====================

#[tokio::test]
async fn test_cargo_admin_rules_and_validation() {
    let h = harness();
    let admin = h.seed_user("admin", Role::Admin).await;
    let alice = h.seed_user("alice", Role::User).await;

    let input = |weight| CargoInput {
        id: None,
        name: "Rice".to_string(),
        weight,
        destination: "Tokyo".to_string(),
    };

    assert!(matches!(
        h.state.cargos.add_cargo(&identity_of(&alice), input(dec!(1))).await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        h.state.cargos.add_cargo(&identity_of(&admin), input(dec!(0))).await,
        Err(ServiceError::BadRequest(_))
    ));

    let cargo = h.state.cargos.add_cargo(&identity_of(&admin), input(dec!(3.5))).await.unwrap();
    let listed = h.state.cargos.get_all_cargos(&identity_of(&alice)).await.unwrap();
    assert!(listed.iter().any(|c| c.id == cargo.id));
}

#[tokio::test]
async fn test_cargo_update_visible_through_cached_lookup() {
    let h = harness();
    let admin = h.seed_user("admin", Role::Admin).await;
    let cargo = h.seed_cargo("Rice").await;
    let caller = identity_of(&admin);

    // 컬렉션 캐시 적재
    h.state.cargos.get_all_cargos(&caller).await.unwrap();

    h.state
        .cargos
        .update_cargo(
            &caller,
            cargo.id,
            CargoInput {
                id: Some(cargo.id),
                name: "Brown rice".to_string(),
                weight: dec!(20),
                destination: "Osaka".to_string(),
            },
        )
        .await
        .unwrap();

    let fetched = h.state.cargos.get_cargo_by_id(&caller, cargo.id).await.unwrap();
    assert_eq!(fetched.name, "Brown rice");
    assert_eq!(fetched.weight, dec!(20));

    let err = h
        .state
        .cargos
        .update_cargo(
            &caller,
            cargo.id,
            CargoInput {
                id: Some(cargo.id + 1),
                name: "x".to_string(),
                weight: dec!(1),
                destination: "y".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(_)));
}

#[tokio::test]
async fn test_cargo_lookup_falls_back_to_store_on_scan_miss() {
    let h = harness();
    let alice = h.seed_user("alice", Role::User).await;
    let caller = identity_of(&alice);

    h.state.cargos.get_all_cargos(&caller).await.unwrap();
    // 캐시를 거치지 않고 저장소에만 추가
    let cargo = h.seed_cargo("Coal").await;

    let fetched = h.state.cargos.get_cargo_by_id(&caller, cargo.id).await.unwrap();
    assert_eq!(fetched.name, "Coal");
    assert!(matches!(
        h.state.cargos.get_cargo_by_id(&caller, 9999).await,
        Err(ServiceError::NotFound(_))
    ));
}

// ==================== 주문 ====================

#[tokio::test]
async fn test_order_creation_forces_pending_and_owner() {
    let h = harness();
    let alice = h.seed_user("alice", Role::User).await;
    let bob = h.seed_user("bob", Role::User).await;
    let cargo = h.seed_cargo("Rice").await;

    let order = h
        .state
        .orders
        .create_order(
            &identity_of(&alice),
            CreateOrderInput {
                cargo_id: cargo.id,
                user_id: Some(bob.id),
                status: Some(OrderStatus::Delivered),
            },
        )
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.user_id, alice.id);
    assert!(order.created_at <= order.updated_at);
}

#[tokio::test]
async fn test_order_creation_requires_existing_cargo() {
    let h = harness();
    let admin = h.seed_user("admin", Role::Admin).await;

    let err = h
        .state
        .orders
        .create_order(
            &identity_of(&admin),
            CreateOrderInput {
                cargo_id: 9999,
                user_id: None,
                status: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let orders = h.state.orders.get_all_orders(&identity_of(&admin)).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_order_creation_requires_existing_user() {
    let h = harness();
    let admin = h.seed_user("admin", Role::Admin).await;
    let alice = h.seed_user("alice", Role::User).await;
    let cargo = h.seed_cargo("Rice").await;

    // 토큰은 아직 유효하지만 사용자는 삭제됨
    let alice_identity = identity_of(&alice);
    h.state
        .users
        .delete_user(&identity_of(&admin), alice.id)
        .await
        .unwrap();

    let err = h
        .state
        .orders
        .create_order(
            &alice_identity,
            CreateOrderInput {
                cargo_id: cargo.id,
                user_id: None,
                status: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(err.public_message(), format!("User {} not found.", alice.id));

    let orders = h.state.orders.get_all_orders(&identity_of(&admin)).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_order_details_join_user_and_cargo() {
    let h = harness();
    let alice = h.seed_user("alice", Role::User).await;
    let cargo = h.seed_cargo("Rice").await;
    let caller = identity_of(&alice);

    h.state
        .orders
        .create_order(
            &caller,
            CreateOrderInput {
                cargo_id: cargo.id,
                user_id: None,
                status: None,
            },
        )
        .await
        .unwrap();

    let mine = h.state.orders.get_my_orders(&caller).await.unwrap();
    let details = h.state.orders.with_details(mine).await.unwrap();

    assert_eq!(details.len(), 1);
    assert_eq!(details[0].user.as_ref().map(|u| u.email.as_str()), Some("alice@example.com"));
    assert_eq!(details[0].cargo.as_ref().map(|c| c.weight), Some(dec!(12.5)));
    assert_eq!(details[0].order.user_id, alice.id);
}

#[tokio::test]
async fn test_order_visibility() {
    let h = harness();
    let admin = h.seed_user("admin", Role::Admin).await;
    let alice = h.seed_user("alice", Role::User).await;
    let bob = h.seed_user("bob", Role::User).await;
    let cargo = h.seed_cargo("Rice").await;

    let order = h
        .state
        .orders
        .create_order(
            &identity_of(&alice),
            CreateOrderInput {
                cargo_id: cargo.id,
                user_id: None,
                status: None,
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        h.state.orders.get_order_by_id(&identity_of(&bob), order.id).await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        h.state.orders.get_order_by_id(&identity_of(&bob), 9999).await,
        Err(ServiceError::NotFound(_))
    ));
    assert_eq!(
        h.state.orders.get_order_by_id(&identity_of(&alice), order.id).await.unwrap(),
        order
    );
    assert!(h.state.orders.get_order_by_id(&identity_of(&admin), order.id).await.is_ok());

    assert_eq!(h.state.orders.get_my_orders(&identity_of(&alice)).await.unwrap().len(), 1);
    assert!(h.state.orders.get_my_orders(&identity_of(&bob)).await.unwrap().is_empty());
    assert!(matches!(
        h.state.orders.get_all_orders(&identity_of(&bob)).await,
        Err(ServiceError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_order_lifecycle() {
    let h = harness();
    let admin = h.seed_user("admin", Role::Admin).await;
    let alice = h.seed_user("alice", Role::User).await;
    let cargo = h.seed_cargo("Rice").await;
    let caller = identity_of(&admin);

    let order = h
        .state
        .orders
        .create_order(
            &identity_of(&alice),
            CreateOrderInput {
                cargo_id: cargo.id,
                user_id: None,
                status: None,
            },
        )
        .await
        .unwrap();

    let status = |status| UpdateOrderStatusInput {
        id: Some(order.id),
        status,
    };

    // 일반 사용자는 상태 변경 불가
    assert!(matches!(
        h.state
            .orders
            .update_order_status(&identity_of(&alice), order.id, status(OrderStatus::Processing))
            .await,
        Err(ServiceError::Forbidden(_))
    ));

    let processing = h
        .state
        .orders
        .update_order_status(&caller, order.id, status(OrderStatus::Processing))
        .await
        .unwrap();
    assert_eq!(processing.status, OrderStatus::Processing);
    assert_eq!(processing.created_at, order.created_at);
    assert!(processing.updated_at >= processing.created_at);
    assert!(processing.updated_at >= order.updated_at);

    // 되돌리기 불가
    assert!(matches!(
        h.state
            .orders
            .update_order_status(&caller, order.id, status(OrderStatus::Pending))
            .await,
        Err(ServiceError::Conflict(_))
    ));

    let cancelled = h
        .state
        .orders
        .update_order_status(&caller, order.id, status(OrderStatus::Cancelled))
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    // 종료 상태
    assert!(matches!(
        h.state
            .orders
            .update_order_status(&caller, order.id, status(OrderStatus::Shipped))
            .await,
        Err(ServiceError::Conflict(_))
    ));

    let stored = h.state.orders.get_order_by_id(&caller, order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_deleting_user_invalidates_cached_orders() {
    let h = harness();
    let admin = h.seed_user("admin", Role::Admin).await;
    let alice = h.seed_user("alice", Role::User).await;
    let cargo = h.seed_cargo("Rice").await;
    let caller = identity_of(&admin);

    h.state
        .orders
        .create_order(
            &identity_of(&alice),
            CreateOrderInput {
                cargo_id: cargo.id,
                user_id: None,
                status: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(h.state.orders.get_all_orders(&caller).await.unwrap().len(), 1);

    h.state.users.delete_user(&caller, alice.id).await.unwrap();

    assert!(h.state.orders.get_all_orders(&caller).await.unwrap().is_empty());
    assert!(matches!(
        h.state.users.get_user_by_id(&caller, alice.id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_deleting_cargo_invalidates_cached_orders() {
    let h = harness();
    let admin = h.seed_user("admin", Role::Admin).await;
    let cargo = h.seed_cargo("Rice").await;
    let caller = identity_of(&admin);

    let order = h
        .state
        .orders
        .create_order(
            &caller,
            CreateOrderInput {
                cargo_id: cargo.id,
                user_id: None,
                status: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(h.state.orders.get_all_orders(&caller).await.unwrap().len(), 1);

    h.state.cargos.delete_cargo(&caller, cargo.id).await.unwrap();

    assert!(h.state.orders.get_all_orders(&caller).await.unwrap().is_empty());
    assert!(matches!(
        h.state.orders.delete_order(&caller, order.id).await,
        Err(ServiceError::NotFound(_))
    ));
}
