// Tenant records kept by realtors, and the tenant's claim on them
// A realtor creates a record under a generated id; the tenant links it to
// their own account by claiming it with the email the realtor recorded.

use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::models::{
    ClaimTenantRequest, CreateTenantRequest, Role, Tenant, TenantChanges, UpdateTenantRequest,
};
use crate::services::ownership::ensure_owned;
use crate::services::role::RoleResolver;
use crate::store::Store;
use crate::utils::ServiceError;

pub struct TenantService {
    store: Arc<dyn Store>,
}

impl TenantService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        realtor_id: &str,
        request: CreateTenantRequest,
    ) -> Result<Tenant, ServiceError> {
        request.validate()?;
        ensure_owned(self.store.as_ref(), realtor_id, None, request.property_id).await?;

        let tenant = self
            .store
            .insert_tenant(request.into_new_tenant(realtor_id))
            .await?;
        info!("Created tenant record {}", tenant.id);
        Ok(tenant)
    }

    pub async fn update(
        &self,
        realtor_id: &str,
        id: &str,
        request: UpdateTenantRequest,
    ) -> Result<Tenant, ServiceError> {
        request.validate()?;
        ensure_owned(
            self.store.as_ref(),
            realtor_id,
            None,
            request.property_id.flatten(),
        )
        .await?;

        self.store
            .update_tenant(realtor_id, id, TenantChanges::from(request))
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Link the caller to the record a realtor created for them. The record's
    /// email must match the caller's token email; a mismatch reads as 404.
    #[instrument(skip(self, email, request))]
    pub async fn claim(
        &self,
        identity_id: &str,
        email: Option<&str>,
        request: ClaimTenantRequest,
    ) -> Result<Tenant, ServiceError> {
        request.validate()?;
        let email = email.ok_or_else(|| {
            ServiceError::Forbidden("Your account has no email address to match".to_string())
        })?;

        let current = RoleResolver::new(self.store.clone())
            .resolve_strict(identity_id)
            .await?;
        if let Some(role) = current.role.filter(|role| *role != Role::Tenant) {
            return Err(ServiceError::Conflict(format!(
                "Account is already registered as {}",
                role
            )));
        }

        let record = self
            .store
            .find_tenant(&request.tenant_id)
            .await?
            .filter(|record| record.invites(email))
            .ok_or(ServiceError::NotFound)?;

        let claimed = self
            .store
            .claim_tenant(&record.id, identity_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        info!("Identity {} claimed tenant record {}", identity_id, record.id);
        Ok(claimed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MaintenanceStatus, NewMaintenanceRequest, SelectRoleRequest, SelectableRole};
    use crate::store::{MaintenanceStore, MemoryStore, OwnerStore, TenantStore};
    use chrono::Utc;
    use uuid::Uuid;

    fn invite(email: &str) -> CreateTenantRequest {
        CreateTenantRequest {
            name: "Pat Tenant".to_string(),
            email: email.to_string(),
            phone: None,
            property_id: None,
        }
    }

    fn claim(tenant_id: &str) -> ClaimTenantRequest {
        ClaimTenantRequest {
            tenant_id: tenant_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_claim_rekeys_record_and_its_requests() {
        let store = Arc::new(MemoryStore::new());
        let service = TenantService::new(store.clone());
        let record = service
            .create("realtor_1", invite("pat@example.com"))
            .await
            .unwrap();

        let now = Utc::now();
        store
            .insert_maintenance(NewMaintenanceRequest {
                id: Uuid::new_v4(),
                realtor_id: "realtor_1".to_string(),
                tenant_id: Some(record.id.clone()),
                property_id: None,
                title: "Leak".to_string(),
                description: "Kitchen tap".to_string(),
                status: MaintenanceStatus::Pending,
                priority: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let claimed = service
            .claim("user_pat", Some("PAT@example.com"), claim(&record.id))
            .await
            .unwrap();
        assert_eq!(claimed.id, "user_pat");
        assert_eq!(claimed.realtor_id.as_deref(), Some("realtor_1"));

        assert!(store.find_tenant(&record.id).await.unwrap().is_none());
        assert!(store.get_tenant("realtor_1", "user_pat").await.unwrap().is_some());
        let moved = store
            .list_maintenance_for_tenant("realtor_1", "user_pat")
            .await
            .unwrap();
        assert_eq!(moved.len(), 1);
    }

    #[tokio::test]
    async fn test_claim_requires_matching_email() {
        let store = Arc::new(MemoryStore::new());
        let service = TenantService::new(store.clone());
        let record = service
            .create("realtor_1", invite("pat@example.com"))
            .await
            .unwrap();

        assert!(matches!(
            service
                .claim("user_eve", Some("eve@example.com"), claim(&record.id))
                .await,
            Err(ServiceError::NotFound)
        ));
        assert!(matches!(
            service.claim("user_eve", None, claim(&record.id)).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(store.find_tenant("user_eve").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claim_links_a_self_registered_tenant() {
        let store = Arc::new(MemoryStore::new());
        let service = TenantService::new(store.clone());
        RoleResolver::new(store.clone())
            .select(
                "user_pat",
                SelectRoleRequest {
                    role: SelectableRole::Tenant,
                    name: "Pat".to_string(),
                    email: "pat@example.com".to_string(),
                    company_name: None,
                    phone: None,
                },
            )
            .await
            .unwrap();

        let first = service
            .create("realtor_1", invite("pat@example.com"))
            .await
            .unwrap();
        let linked = service
            .claim("user_pat", Some("pat@example.com"), claim(&first.id))
            .await
            .unwrap();
        assert_eq!(linked.realtor_id.as_deref(), Some("realtor_1"));

        // A second realtor cannot pull an already linked tenant over
        let second = service
            .create("realtor_2", invite("pat@example.com"))
            .await
            .unwrap();
        assert!(matches!(
            service
                .claim("user_pat", Some("pat@example.com"), claim(&second.id))
                .await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_realtors_cannot_claim_tenant_records() {
        let store = Arc::new(MemoryStore::new());
        let service = TenantService::new(store.clone());
        RoleResolver::new(store.clone())
            .select(
                "realtor_2",
                SelectRoleRequest {
                    role: SelectableRole::Realtor,
                    name: "Rae".to_string(),
                    email: "realtor_2@example.com".to_string(),
                    company_name: None,
                    phone: None,
                },
            )
            .await
            .unwrap();

        let record = service
            .create("realtor_1", invite("realtor_2@example.com"))
            .await
            .unwrap();
        assert!(matches!(
            service
                .claim("realtor_2", Some("realtor_2@example.com"), claim(&record.id))
                .await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(store.find_tenant("realtor_2").await.unwrap().is_none());
    }
}
