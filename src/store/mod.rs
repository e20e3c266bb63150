// Persistence seam for the realty back office
// Every query that touches owned rows takes the owner id and filters on it

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentChanges, Company, Lead, LeadChanges, MaintenanceChanges,
    MaintenanceRequest, NewAppointment, NewLead, NewMaintenanceRequest, NewNotification,
    NewProperty, NewRealtor, NewRentPayment, NewTenant, Notification, Property, PropertyChanges,
    QuotaDenied, Realtor, RentPayment, RentPaymentChanges, Subscription, SubscriptionRecord,
    Tenant, TenantChanges,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Duplicate key: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(error: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match error {
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Conflict(info.message().to_string())
            },
            other => StoreError::Database(other),
        }
    }
}

/// Result of an insert that is allowed to hit an existing key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// Result of a plan-limited property insert
#[derive(Debug, Clone, PartialEq)]
pub enum QuotaOutcome {
    Inserted(Property),
    Denied { denied: QuotaDenied, held: i64 },
}

// =============================================================================
// STORE TRAITS
// =============================================================================

#[async_trait]
pub trait OwnerStore: Send + Sync {
    async fn find_realtor(&self, id: &str) -> Result<Option<Realtor>, StoreError>;

    /// Tenant owner lookup by identity id
    async fn find_tenant(&self, id: &str) -> Result<Option<Tenant>, StoreError>;

    /// Company owned by the user, or the first company they are a member of
    async fn find_company_for_user(&self, user_id: &str) -> Result<Option<Company>, StoreError>;

    async fn insert_realtor(&self, realtor: NewRealtor) -> Result<InsertOutcome, StoreError>;
}

#[async_trait]
pub trait PropertyStore: Send + Sync {
    async fn list_properties(&self, realtor_id: &str) -> Result<Vec<Property>, StoreError>;
    async fn count_properties(&self, realtor_id: &str) -> Result<i64, StoreError>;
    async fn get_property(&self, realtor_id: &str, id: Uuid)
        -> Result<Option<Property>, StoreError>;
    async fn insert_property(&self, property: NewProperty) -> Result<Property, StoreError>;

    /// Count, plan check and insert as one unit, so concurrent creates
    /// cannot overshoot the owner's limit
    async fn insert_property_within_quota(
        &self,
        property: NewProperty,
    ) -> Result<QuotaOutcome, StoreError>;
    async fn update_property(
        &self,
        realtor_id: &str,
        id: Uuid,
        changes: PropertyChanges,
    ) -> Result<Option<Property>, StoreError>;
    async fn delete_property(&self, realtor_id: &str, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn list_tenants(&self, realtor_id: &str) -> Result<Vec<Tenant>, StoreError>;
    async fn get_tenant(&self, realtor_id: &str, id: &str) -> Result<Option<Tenant>, StoreError>;

    /// Fails with `StoreError::Conflict` when the id is taken
    async fn insert_tenant(&self, tenant: NewTenant) -> Result<Tenant, StoreError>;
    async fn update_tenant(
        &self,
        realtor_id: &str,
        id: &str,
        changes: TenantChanges,
    ) -> Result<Option<Tenant>, StoreError>;
    async fn delete_tenant(&self, realtor_id: &str, id: &str) -> Result<bool, StoreError>;

    /// Re-key a realtor's tenant record onto the tenant's identity id and
    /// move its maintenance requests and rent payments along. `None` when
    /// no linked record has that id; `Conflict` when the identity is
    /// already linked to a realtor.
    async fn claim_tenant(
        &self,
        record_id: &str,
        identity_id: &str,
    ) -> Result<Option<Tenant>, StoreError>;
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn list_appointments(&self, realtor_id: &str) -> Result<Vec<Appointment>, StoreError>;
    async fn insert_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<Appointment, StoreError>;
    async fn update_appointment(
        &self,
        realtor_id: &str,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> Result<Option<Appointment>, StoreError>;
    async fn delete_appointment(&self, realtor_id: &str, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait MaintenanceStore: Send + Sync {
    async fn list_maintenance(
        &self,
        realtor_id: &str,
    ) -> Result<Vec<MaintenanceRequest>, StoreError>;
    async fn list_maintenance_for_tenant(
        &self,
        realtor_id: &str,
        tenant_id: &str,
    ) -> Result<Vec<MaintenanceRequest>, StoreError>;

    /// Requests of the realtor that have no priority yet
    async fn list_unclassified_maintenance(
        &self,
        realtor_id: &str,
    ) -> Result<Vec<MaintenanceRequest>, StoreError>;
    async fn insert_maintenance(
        &self,
        request: NewMaintenanceRequest,
    ) -> Result<MaintenanceRequest, StoreError>;
    async fn update_maintenance(
        &self,
        realtor_id: &str,
        id: Uuid,
        changes: MaintenanceChanges,
    ) -> Result<Option<MaintenanceRequest>, StoreError>;
    async fn delete_maintenance(&self, realtor_id: &str, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait RentPaymentStore: Send + Sync {
    async fn list_rent_payments(&self, realtor_id: &str) -> Result<Vec<RentPayment>, StoreError>;
    async fn list_rent_payments_for_tenant(
        &self,
        realtor_id: &str,
        tenant_id: &str,
    ) -> Result<Vec<RentPayment>, StoreError>;
    async fn insert_rent_payment(&self, payment: NewRentPayment)
        -> Result<RentPayment, StoreError>;
    async fn update_rent_payment(
        &self,
        realtor_id: &str,
        id: Uuid,
        changes: RentPaymentChanges,
    ) -> Result<Option<RentPayment>, StoreError>;
    async fn delete_rent_payment(&self, realtor_id: &str, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn list_leads(&self, owner_id: &str) -> Result<Vec<Lead>, StoreError>;
    async fn insert_lead(&self, lead: NewLead) -> Result<Lead, StoreError>;
    async fn update_lead(
        &self,
        owner_id: &str,
        id: Uuid,
        changes: LeadChanges,
    ) -> Result<Option<Lead>, StoreError>;
    async fn delete_lead(&self, owner_id: &str, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Insert unless a notification with the same (realtor_id, message) exists
    async fn insert_notification_if_absent(
        &self,
        notification: NewNotification,
    ) -> Result<InsertOutcome, StoreError>;
    async fn list_notifications(&self, realtor_id: &str) -> Result<Vec<Notification>, StoreError>;
    async fn mark_notification_read(
        &self,
        realtor_id: &str,
        id: Uuid,
    ) -> Result<Option<Notification>, StoreError>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn find_subscription(
        &self,
        customer_id: &str,
    ) -> Result<Option<Subscription>, StoreError>;

    /// Subscription governing the owner: a live one before a canceled one,
    /// newest first within each group
    async fn find_subscription_for_owner(
        &self,
        owner_id: &str,
    ) -> Result<Option<Subscription>, StoreError>;

    /// Insert or fully overwrite the row keyed by customer id
    async fn upsert_subscription(
        &self,
        record: SubscriptionRecord,
    ) -> Result<Subscription, StoreError>;
}

/// Everything the HTTP layer needs from persistence
#[async_trait]
pub trait Store:
    OwnerStore
    + PropertyStore
    + TenantStore
    + AppointmentStore
    + MaintenanceStore
    + RentPaymentStore
    + LeadStore
    + NotificationStore
    + SubscriptionStore
{
    async fn health_check(&self) -> Result<(), StoreError>;
}
