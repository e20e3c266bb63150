// Property writes and the plan-limit guard

use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::models::{CreatePropertyRequest, Property, PropertyChanges, UpdatePropertyRequest};
use crate::store::{QuotaOutcome, Store};
use crate::utils::ServiceError;


pub struct PropertyService {
    store: Arc<dyn Store>,
}

impl PropertyService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, realtor_id: &str) -> Result<Vec<Property>, ServiceError> {
        Ok(self.store.list_properties(realtor_id).await?)
    }

    pub async fn get(&self, realtor_id: &str, id: Uuid) -> Result<Property, ServiceError> {
        self.store
            .get_property(realtor_id, id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// The only path that creates properties
    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        realtor_id: &str,
        request: CreatePropertyRequest,
    ) -> Result<Property, ServiceError> {
        request.validate()?;

        match self
            .store
            .insert_property_within_quota(request.into_new_property(realtor_id))
            .await?
        {
            QuotaOutcome::Inserted(property) => {
                info!("Created property {} for {}", property.id, realtor_id);
                Ok(property)
            },
            QuotaOutcome::Denied { denied, held } => {
                info!("Property create refused for {} holding {}: {:?}", realtor_id, held, denied);
                Err(denied.into())
            },
        }
    }

    pub async fn update(
        &self,
        realtor_id: &str,
        id: Uuid,
        request: UpdatePropertyRequest,
    ) -> Result<Property, ServiceError> {
        request.validate()?;
        self.store
            .update_property(realtor_id, id, PropertyChanges::from(request))
            .await?
            .ok_or(ServiceError::NotFound)
    }

    pub async fn delete(&self, realtor_id: &str, id: Uuid) -> Result<(), ServiceError> {
        if self.store.delete_property(realtor_id, id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound)
        }
    }
}
