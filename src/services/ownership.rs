// Foreign ids named in a realtor's write must belong to that realtor

use uuid::Uuid;

use crate::store::Store;
use crate::utils::ServiceError;

/// 400 for any tenant or property id the realtor does not own
pub async fn ensure_owned(
    store: &dyn Store,
    realtor_id: &str,
    tenant_id: Option<&str>,
    property_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    if let Some(tenant_id) = tenant_id {
        if store.get_tenant(realtor_id, tenant_id).await?.is_none() {
            return Err(ServiceError::ValidationError(format!(
                "Unknown tenant {}",
                tenant_id
            )));
        }
    }

    if let Some(property_id) = property_id {
        if store.get_property(realtor_id, property_id).await?.is_none() {
            return Err(ServiceError::ValidationError(format!(
                "Unknown property {}",
                property_id
            )));
        }
    }

    Ok(())
}
