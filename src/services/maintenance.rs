// Maintenance requests for realtors and the tenant portal

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    CreateMaintenanceRequest, MaintenanceChanges, MaintenanceRequest, MaintenanceStatus,
    NewMaintenanceRequest, UpdateMaintenanceRequest,
};
use crate::services::ownership::ensure_owned;
use crate::services::triage::{backfill_priorities, triage, PriorityClassifier};
use crate::store::Store;
use crate::utils::{trim_and_validate_field, ServiceError};

pub struct MaintenanceService {
    store: Arc<dyn Store>,
    classifier: Arc<dyn PriorityClassifier>,
}

impl MaintenanceService {
    pub fn new(store: Arc<dyn Store>, classifier: Arc<dyn PriorityClassifier>) -> Self {
        Self { store, classifier }
    }

    pub async fn list(&self, realtor_id: &str) -> Result<Vec<MaintenanceRequest>, ServiceError> {
        Ok(self.store.list_maintenance(realtor_id).await?)
    }

    /// Requests filed for the tenant under the realtor they are linked to
    pub async fn list_for_tenant(
        &self,
        realtor_id: &str,
        tenant_id: &str,
    ) -> Result<Vec<MaintenanceRequest>, ServiceError> {
        Ok(self
            .store
            .list_maintenance_for_tenant(realtor_id, tenant_id)
            .await?)
    }

    /// Create a request owned by `realtor_id`; triages when no priority is given.
    /// The tenant and property, when named, must belong to the realtor.
    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        realtor_id: &str,
        request: CreateMaintenanceRequest,
    ) -> Result<MaintenanceRequest, ServiceError> {
        request.validate()?;
        let title = trim_and_validate_field(&request.title, true)
            .map_err(ServiceError::ValidationError)?;
        ensure_owned(
            self.store.as_ref(),
            realtor_id,
            request.tenant_id.as_deref(),
            request.property_id,
        )
        .await?;

        let priority = match request.priority {
            Some(priority) => priority,
            None => triage(self.classifier.as_ref(), &request.description).await,
        };

        let now = Utc::now();
        let created = self
            .store
            .insert_maintenance(NewMaintenanceRequest {
                id: Uuid::new_v4(),
                realtor_id: realtor_id.to_string(),
                tenant_id: request.tenant_id,
                property_id: request.property_id,
                title,
                description: request.description,
                status: MaintenanceStatus::Pending,
                priority: Some(priority),
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!("Created maintenance request {} ({})", created.id, priority);
        Ok(created)
    }

    pub async fn update(
        &self,
        realtor_id: &str,
        id: Uuid,
        request: UpdateMaintenanceRequest,
    ) -> Result<MaintenanceRequest, ServiceError> {
        request.validate()?;
        self.store
            .update_maintenance(realtor_id, id, MaintenanceChanges::from(request))
            .await?
            .ok_or(ServiceError::NotFound)
    }

    pub async fn delete(&self, realtor_id: &str, id: Uuid) -> Result<(), ServiceError> {
        if self.store.delete_maintenance(realtor_id, id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound)
        }
    }

    /// Backfill priorities for every unprioritised request of the realtor
    pub async fn classify_pending(&self, realtor_id: &str) -> Result<usize, ServiceError> {
        Ok(backfill_priorities(self.store.as_ref(), self.classifier.as_ref(), realtor_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use crate::models::CreateTenantRequest;
    use crate::services::triage::{DisabledClassifier, TriageError};
    use crate::store::{MemoryStore, TenantStore};
    use async_trait::async_trait;

    struct AlwaysHigh;

    #[async_trait]
    impl PriorityClassifier for AlwaysHigh {
        async fn classify(&self, _description: &str) -> Result<Priority, TriageError> {
            Ok(Priority::High)
        }
    }

    fn create_request(priority: Option<Priority>) -> CreateMaintenanceRequest {
        CreateMaintenanceRequest {
            title: " Broken heater ".to_string(),
            description: "No heat since last night".to_string(),
            tenant_id: None,
            property_id: None,
            priority,
        }
    }

    async fn tenant_of(store: &MemoryStore, realtor_id: &str) -> String {
        store
            .insert_tenant(
                CreateTenantRequest {
                    name: "Pat".to_string(),
                    email: "pat@example.com".to_string(),
                    phone: None,
                    property_id: None,
                }
                .into_new_tenant(realtor_id),
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_triages_missing_priority() {
        let service = MaintenanceService::new(Arc::new(MemoryStore::new()), Arc::new(AlwaysHigh));

        let triaged = service.create("realtor_1", create_request(None)).await.unwrap();
        assert_eq!(triaged.priority, Some(Priority::High));
        assert_eq!(triaged.title, "Broken heater");
        assert_eq!(triaged.status, MaintenanceStatus::Pending);

        let explicit = service
            .create("realtor_1", create_request(Some(Priority::Low)))
            .await
            .unwrap();
        assert_eq!(explicit.priority, Some(Priority::Low));
    }

    #[tokio::test]
    async fn test_create_survives_classifier_failure() {
        let store = Arc::new(MemoryStore::new());
        let tenant_id = tenant_of(&store, "realtor_1").await;
        let service = MaintenanceService::new(store, Arc::new(DisabledClassifier));

        let mut request = create_request(None);
        request.tenant_id = Some(tenant_id.clone());
        let created = service.create("realtor_1", request).await.unwrap();
        assert_eq!(created.priority, Some(Priority::Medium));

        let for_tenant = service.list_for_tenant("realtor_1", &tenant_id).await.unwrap();
        assert_eq!(for_tenant.len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_another_realtors_tenant() {
        let store = Arc::new(MemoryStore::new());
        let tenant_id = tenant_of(&store, "realtor_b").await;
        let service = MaintenanceService::new(store, Arc::new(AlwaysHigh));

        let mut request = create_request(None);
        request.tenant_id = Some(tenant_id.clone());
        assert!(matches!(
            service.create("realtor_a", request.clone()).await,
            Err(ServiceError::ValidationError(_))
        ));

        request.tenant_id = None;
        request.property_id = Some(Uuid::new_v4());
        assert!(matches!(
            service.create("realtor_a", request).await,
            Err(ServiceError::ValidationError(_))
        ));

        assert!(service.list_for_tenant("realtor_b", &tenant_id).await.unwrap().is_empty());
        assert!(service.list("realtor_a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_is_scoped() {
        let service = MaintenanceService::new(Arc::new(MemoryStore::new()), Arc::new(AlwaysHigh));
        let created = service.create("realtor_1", create_request(None)).await.unwrap();

        let update = UpdateMaintenanceRequest {
            status: Some(MaintenanceStatus::InProgress),
            ..Default::default()
        };
        assert!(matches!(
            service.update("realtor_2", created.id, update.clone()).await,
            Err(ServiceError::NotFound)
        ));
        let updated = service.update("realtor_1", created.id, update).await.unwrap();
        assert_eq!(updated.status, MaintenanceStatus::InProgress);
    }
}
