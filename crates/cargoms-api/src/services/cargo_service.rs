//! 화물 서비스.

use std::sync::Arc;

use cargoms_core::{Cargo, NewCargo};
use cargoms_data::{keys, CacheAside, CacheTag, CargoStore};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};
use validator::{Validate, ValidationError};

use crate::auth::{require, AccessClass, Identity};
use crate::error::{ServiceError, ServiceResult};

use super::ensure_same_id;

/// 화물 생성/수정 입력.
///
/// 수정 시 `id`는 경로의 ID와 같아야 합니다.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CargoInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters."))]
    pub name: String,
    #[validate(custom(function = "validate_weight"))]
    pub weight: Decimal,
    #[validate(length(min = 1, max = 200, message = "Destination must be 1-200 characters."))]
    pub destination: String,
}

fn validate_weight(weight: &Decimal) -> Result<(), ValidationError> {
    if *weight > Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("weight");
        err.message = Some("Weight must be greater than zero.".into());
        Err(err)
    }
}

impl CargoInput {
    fn into_new_cargo(self) -> NewCargo {
        NewCargo {
            name: self.name.trim().to_string(),
            weight: self.weight,
            destination: self.destination.trim().to_string(),
        }
    }

    fn check(&self) -> ServiceResult<()> {
        self.validate()?;
        if self.name.trim().is_empty() || self.destination.trim().is_empty() {
            return Err(ServiceError::bad_request(
                "Name and destination must not be blank.",
            ));
        }
        Ok(())
    }
}

/// 화물 서비스.
pub struct CargoService {
    store: Arc<dyn CargoStore>,
    cache: Arc<CacheAside>,
}

impl CargoService {
    pub fn new(store: Arc<dyn CargoStore>, cache: Arc<CacheAside>) -> Self {
        Self { store, cache }
    }

    /// 전체 화물 (인증된 호출자).
    #[instrument(skip(self, identity), fields(caller = identity.subject_id))]
    pub async fn get_all_cargos(&self, identity: &Identity) -> ServiceResult<Vec<Cargo>> {
        require(identity, AccessClass::Authenticated, None)?;
        let store = &self.store;
        Ok(self
            .cache
            .get_or_fetch(keys::ALL_CARGOS, || async { store.get_all().await })
            .await?)
    }

    /// 단일 화물 (인증된 호출자).
    #[instrument(skip(self, identity), fields(caller = identity.subject_id))]
    pub async fn get_cargo_by_id(&self, identity: &Identity, id: i64) -> ServiceResult<Cargo> {
        require(identity, AccessClass::Authenticated, None)?;

        if let Some(cargos) = self.cache.get::<Vec<Cargo>>(keys::ALL_CARGOS).await {
            if let Some(cargo) = cargos.into_iter().find(|c| c.id == id) {
                return Ok(cargo);
            }
        }

        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Cargo {} not found.", id)))
    }

    /// 화물 등록 (관리자).
    #[instrument(skip(self, identity, input), fields(caller = identity.subject_id))]
    pub async fn add_cargo(&self, identity: &Identity, input: CargoInput) -> ServiceResult<Cargo> {
        require(identity, AccessClass::AdminOnly, None)?;
        input.check()?;

        let cargo = self.store.add(input.into_new_cargo()).await?;
        self.cache.invalidate_tag(CacheTag::Cargos, Some(cargo.id)).await;
        info!(cargo_id = cargo.id, "Cargo added");
        Ok(cargo)
    }

    /// 화물 수정 (관리자).
    #[instrument(skip(self, identity, input), fields(caller = identity.subject_id))]
    pub async fn update_cargo(
        &self,
        identity: &Identity,
        id: i64,
        input: CargoInput,
    ) -> ServiceResult<Cargo> {
        if let Some(body_id) = input.id {
            ensure_same_id(id, body_id)?;
        }
        require(identity, AccessClass::AdminOnly, None)?;
        input.check()?;

        let cargo = input.into_new_cargo().with_id(id);
        self.store.update(&cargo).await?;
        self.cache.invalidate_tag(CacheTag::Cargos, Some(id)).await;
        info!(cargo_id = id, "Cargo updated");
        Ok(cargo)
    }

    /// 화물 삭제 (관리자). 이 화물을 참조하는 주문도 함께 삭제됩니다.
    #[instrument(skip(self, identity), fields(caller = identity.subject_id))]
    pub async fn delete_cargo(&self, identity: &Identity, id: i64) -> ServiceResult<()> {
        require(identity, AccessClass::AdminOnly, None)?;

        self.store.delete(id).await?;
        self.cache.invalidate_tag(CacheTag::Cargos, Some(id)).await;
        self.cache.invalidate_tag(CacheTag::Orders, None).await;
        info!(cargo_id = id, "Cargo deleted");
        Ok(())
    }
}
