// Process-local store used by the test suite and STORE_BACKEND=memory
// Mirrors the Postgres semantics the services rely on: owner scoping,
// unique keys and upserts.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{
    AppointmentStore, InsertOutcome, LeadStore, MaintenanceStore, NotificationStore, OwnerStore,
    PropertyStore, QuotaOutcome, RentPaymentStore, Store, StoreError, SubscriptionStore,
    TenantStore,
};
use crate::models::{
    check_property_quota, governing_subscription, Appointment, AppointmentChanges, Company, Lead,
    LeadChanges, MaintenanceChanges,
    MaintenanceRequest, NewAppointment, NewLead, NewMaintenanceRequest, NewNotification,
    NewProperty, NewRealtor, NewRentPayment, NewTenant, Notification, Property, PropertyChanges,
    Realtor, RentPayment, RentPaymentChanges, Subscription, SubscriptionRecord, TeamMember,
    Tenant, TenantChanges,
};

#[derive(Default)]
struct Tables {
    realtors: HashMap<String, Realtor>,
    tenants: Vec<Tenant>,
    companies: HashMap<String, Company>,
    team_members: Vec<TeamMember>,
    properties: Vec<Property>,
    subscriptions: HashMap<String, Subscription>,
    notifications: Vec<Notification>,
    maintenance: Vec<MaintenanceRequest>,
    rent_payments: Vec<RentPayment>,
    appointments: Vec<Appointment>,
    leads: Vec<Lead>,
}

impl Tables {
    fn owner_subscription(&self, owner_id: &str) -> Option<&Subscription> {
        governing_subscription(
            self.subscriptions
                .values()
                .filter(|s| s.owner_id.as_deref() == Some(owner_id)),
        )
    }

    fn property_count(&self, realtor_id: &str) -> i64 {
        let count = self
            .properties
            .iter()
            .filter(|p| p.realtor_id == realtor_id)
            .count();
        i64::try_from(count).unwrap_or(i64::MAX)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation on `table` fail until `heal_table` is called
    pub fn fail_table(&self, table: &str) {
        lock(&self.failing).insert(table.to_string());
    }

    pub fn heal_table(&self, table: &str) {
        lock(&self.failing).remove(table);
    }

    /// Companies have no API write path, they are provisioned out of band
    pub fn seed_company(&self, id: &str, name: &str) {
        let company = Company {
            id: id.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        lock(&self.tables)
            .companies
            .insert(company.id.clone(), company);
    }

    pub fn seed_team_member(&self, company_id: &str, user_id: &str, role: &str) {
        lock(&self.tables).team_members.push(TeamMember {
            id: Uuid::new_v4(),
            company_id: company_id.to_string(),
            user_id: user_id.to_string(),
            role: role.to_string(),
            created_at: Utc::now(),
        });
    }

    fn check(&self, table: &str) -> Result<(), StoreError> {
        if lock(&self.failing).contains(table) {
            return Err(StoreError::Unavailable(format!("{} is failing", table)));
        }
        Ok(())
    }

    fn tables(&self, table: &str) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.check(table)?;
        Ok(lock(&self.tables))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn newest_first<T, F>(rows: &mut [T], created_at: F)
where
    F: Fn(&T) -> chrono::DateTime<Utc>,
{
    rows.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
}

#[async_trait]
impl OwnerStore for MemoryStore {
    async fn find_realtor(&self, id: &str) -> Result<Option<Realtor>, StoreError> {
        Ok(self.tables("realtors")?.realtors.get(id).cloned())
    }

    async fn find_tenant(&self, id: &str) -> Result<Option<Tenant>, StoreError> {
        let tables = self.tables("tenants")?;
        Ok(tables.tenants.iter().find(|t| t.id == id).cloned())
    }

    async fn find_company_for_user(&self, user_id: &str) -> Result<Option<Company>, StoreError> {
        let tables = self.tables("companies")?;
        if let Some(company) = tables.companies.get(user_id) {
            return Ok(Some(company.clone()));
        }

        let mut memberships: Vec<&TeamMember> = tables
            .team_members
            .iter()
            .filter(|m| m.user_id == user_id)
            .collect();
        memberships.sort_by_key(|m| m.created_at);

        Ok(memberships
            .into_iter()
            .find_map(|m| tables.companies.get(&m.company_id).cloned()))
    }

    async fn insert_realtor(&self, realtor: NewRealtor) -> Result<InsertOutcome, StoreError> {
        let mut tables = self.tables("realtors")?;
        if tables.realtors.contains_key(&realtor.id) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        tables.realtors.insert(realtor.id.clone(), realtor.into());
        Ok(InsertOutcome::Inserted)
    }
}

#[async_trait]
impl PropertyStore for MemoryStore {
    async fn list_properties(&self, realtor_id: &str) -> Result<Vec<Property>, StoreError> {
        let tables = self.tables("properties")?;
        let mut rows: Vec<Property> = tables
            .properties
            .iter()
            .filter(|p| p.realtor_id == realtor_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |p| p.created_at);
        Ok(rows)
    }

    async fn count_properties(&self, realtor_id: &str) -> Result<i64, StoreError> {
        Ok(self.tables("properties")?.property_count(realtor_id))
    }

    async fn get_property(
        &self,
        realtor_id: &str,
        id: Uuid,
    ) -> Result<Option<Property>, StoreError> {
        let tables = self.tables("properties")?;
        Ok(tables
            .properties
            .iter()
            .find(|p| p.id == id && p.realtor_id == realtor_id)
            .cloned())
    }

    async fn insert_property(&self, property: NewProperty) -> Result<Property, StoreError> {
        let mut tables = self.tables("properties")?;
        let row: Property = property.into();
        tables.properties.push(row.clone());
        Ok(row)
    }

    async fn insert_property_within_quota(
        &self,
        property: NewProperty,
    ) -> Result<QuotaOutcome, StoreError> {
        self.check("subscriptions")?;
        let mut tables = self.tables("properties")?;

        let held = tables.property_count(&property.realtor_id);
        let subscription = tables.owner_subscription(&property.realtor_id);
        if let Err(denied) = check_property_quota(subscription, held) {
            return Ok(QuotaOutcome::Denied { denied, held });
        }

        let row: Property = property.into();
        tables.properties.push(row.clone());
        Ok(QuotaOutcome::Inserted(row))
    }

    async fn update_property(
        &self,
        realtor_id: &str,
        id: Uuid,
        changes: PropertyChanges,
    ) -> Result<Option<Property>, StoreError> {
        let mut tables = self.tables("properties")?;
        Ok(tables
            .properties
            .iter_mut()
            .find(|p| p.id == id && p.realtor_id == realtor_id)
            .map(|p| {
                p.apply(&changes);
                p.clone()
            }))
    }

    async fn delete_property(&self, realtor_id: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables("properties")?;
        let before = tables.properties.len();
        tables
            .properties
            .retain(|p| !(p.id == id && p.realtor_id == realtor_id));
        Ok(tables.properties.len() < before)
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn list_tenants(&self, realtor_id: &str) -> Result<Vec<Tenant>, StoreError> {
        let tables = self.tables("tenants")?;
        let mut rows: Vec<Tenant> = tables
            .tenants
            .iter()
            .filter(|t| t.realtor_id.as_deref() == Some(realtor_id))
            .cloned()
            .collect();
        newest_first(&mut rows, |t| t.created_at);
        Ok(rows)
    }

    async fn get_tenant(&self, realtor_id: &str, id: &str) -> Result<Option<Tenant>, StoreError> {
        let tables = self.tables("tenants")?;
        Ok(tables
            .tenants
            .iter()
            .find(|t| t.id == id && t.realtor_id.as_deref() == Some(realtor_id))
            .cloned())
    }

    async fn insert_tenant(&self, tenant: NewTenant) -> Result<Tenant, StoreError> {
        let mut tables = self.tables("tenants")?;
        if tables.tenants.iter().any(|t| t.id == tenant.id) {
            return Err(StoreError::Conflict(format!(
                "tenants.id {} already exists",
                tenant.id
            )));
        }
        let row: Tenant = tenant.into();
        tables.tenants.push(row.clone());
        Ok(row)
    }

    async fn update_tenant(
        &self,
        realtor_id: &str,
        id: &str,
        changes: TenantChanges,
    ) -> Result<Option<Tenant>, StoreError> {
        let mut tables = self.tables("tenants")?;
        Ok(tables
            .tenants
            .iter_mut()
            .find(|t| t.id == id && t.realtor_id.as_deref() == Some(realtor_id))
            .map(|t| {
                t.apply(&changes);
                t.clone()
            }))
    }

    async fn delete_tenant(&self, realtor_id: &str, id: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables("tenants")?;
        let before = tables.tenants.len();
        tables
            .tenants
            .retain(|t| !(t.id == id && t.realtor_id.as_deref() == Some(realtor_id)));
        Ok(tables.tenants.len() < before)
    }

    async fn claim_tenant(
        &self,
        record_id: &str,
        identity_id: &str,
    ) -> Result<Option<Tenant>, StoreError> {
        self.check("maintenance_requests")?;
        self.check("rent_payments")?;
        let mut tables = self.tables("tenants")?;

        let Some(record) = tables
            .tenants
            .iter()
            .find(|t| t.id == record_id && t.realtor_id.is_some())
            .cloned()
        else {
            return Ok(None);
        };
        if record.id == identity_id {
            return Ok(Some(record));
        }

        let claimed = match tables.tenants.iter_mut().find(|t| t.id == identity_id) {
            Some(owner) if owner.realtor_id.is_some() => {
                return Err(StoreError::Conflict(format!(
                    "tenant {} is already linked to a realtor",
                    identity_id
                )))
            },
            Some(owner) => {
                owner.realtor_id = record.realtor_id.clone();
                owner.property_id = record.property_id;
                owner.clone()
            },
            None => {
                let owner: Tenant = record.claimed_by(identity_id).into();
                tables.tenants.push(owner.clone());
                owner
            },
        };

        for request in tables
            .maintenance
            .iter_mut()
            .filter(|m| m.tenant_id.as_deref() == Some(record_id))
        {
            request.tenant_id = Some(identity_id.to_string());
        }
        for payment in tables
            .rent_payments
            .iter_mut()
            .filter(|p| p.tenant_id == record_id)
        {
            payment.tenant_id = identity_id.to_string();
        }
        tables.tenants.retain(|t| t.id != record_id);

        Ok(Some(claimed))
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn list_appointments(&self, realtor_id: &str) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.tables("appointments")?;
        let mut rows: Vec<Appointment> = tables
            .appointments
            .iter()
            .filter(|a| a.realtor_id == realtor_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.starts_at);
        Ok(rows)
    }

    async fn insert_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<Appointment, StoreError> {
        let mut tables = self.tables("appointments")?;
        let row: Appointment = appointment.into();
        tables.appointments.push(row.clone());
        Ok(row)
    }

    async fn update_appointment(
        &self,
        realtor_id: &str,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> Result<Option<Appointment>, StoreError> {
        let mut tables = self.tables("appointments")?;
        Ok(tables
            .appointments
            .iter_mut()
            .find(|a| a.id == id && a.realtor_id == realtor_id)
            .map(|a| {
                a.apply(&changes);
                a.clone()
            }))
    }

    async fn delete_appointment(&self, realtor_id: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables("appointments")?;
        let before = tables.appointments.len();
        tables
            .appointments
            .retain(|a| !(a.id == id && a.realtor_id == realtor_id));
        Ok(tables.appointments.len() < before)
    }
}

#[async_trait]
impl MaintenanceStore for MemoryStore {
    async fn list_maintenance(
        &self,
        realtor_id: &str,
    ) -> Result<Vec<MaintenanceRequest>, StoreError> {
        let tables = self.tables("maintenance_requests")?;
        let mut rows: Vec<MaintenanceRequest> = tables
            .maintenance
            .iter()
            .filter(|m| m.realtor_id == realtor_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |m| m.created_at);
        Ok(rows)
    }

    async fn list_maintenance_for_tenant(
        &self,
        realtor_id: &str,
        tenant_id: &str,
    ) -> Result<Vec<MaintenanceRequest>, StoreError> {
        let tables = self.tables("maintenance_requests")?;
        let mut rows: Vec<MaintenanceRequest> = tables
            .maintenance
            .iter()
            .filter(|m| m.realtor_id == realtor_id && m.tenant_id.as_deref() == Some(tenant_id))
            .cloned()
            .collect();
        newest_first(&mut rows, |m| m.created_at);
        Ok(rows)
    }

    async fn list_unclassified_maintenance(
        &self,
        realtor_id: &str,
    ) -> Result<Vec<MaintenanceRequest>, StoreError> {
        let tables = self.tables("maintenance_requests")?;
        let mut rows: Vec<MaintenanceRequest> = tables
            .maintenance
            .iter()
            .filter(|m| m.realtor_id == realtor_id && m.priority.is_none())
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.created_at);
        Ok(rows)
    }

    async fn insert_maintenance(
        &self,
        request: NewMaintenanceRequest,
    ) -> Result<MaintenanceRequest, StoreError> {
        let mut tables = self.tables("maintenance_requests")?;
        let row: MaintenanceRequest = request.into();
        tables.maintenance.push(row.clone());
        Ok(row)
    }

    async fn update_maintenance(
        &self,
        realtor_id: &str,
        id: Uuid,
        changes: MaintenanceChanges,
    ) -> Result<Option<MaintenanceRequest>, StoreError> {
        let mut tables = self.tables("maintenance_requests")?;
        Ok(tables
            .maintenance
            .iter_mut()
            .find(|m| m.id == id && m.realtor_id == realtor_id)
            .map(|m| {
                m.apply(&changes);
                m.clone()
            }))
    }

    async fn delete_maintenance(&self, realtor_id: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables("maintenance_requests")?;
        let before = tables.maintenance.len();
        tables
            .maintenance
            .retain(|m| !(m.id == id && m.realtor_id == realtor_id));
        Ok(tables.maintenance.len() < before)
    }
}

#[async_trait]
impl RentPaymentStore for MemoryStore {
    async fn list_rent_payments(&self, realtor_id: &str) -> Result<Vec<RentPayment>, StoreError> {
        let tables = self.tables("rent_payments")?;
        let mut rows: Vec<RentPayment> = tables
            .rent_payments
            .iter()
            .filter(|p| p.realtor_id == realtor_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| std::cmp::Reverse(p.due_date));
        Ok(rows)
    }

    async fn list_rent_payments_for_tenant(
        &self,
        realtor_id: &str,
        tenant_id: &str,
    ) -> Result<Vec<RentPayment>, StoreError> {
        let tables = self.tables("rent_payments")?;
        let mut rows: Vec<RentPayment> = tables
            .rent_payments
            .iter()
            .filter(|p| p.realtor_id == realtor_id && p.tenant_id == tenant_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| std::cmp::Reverse(p.due_date));
        Ok(rows)
    }

    async fn insert_rent_payment(
        &self,
        payment: NewRentPayment,
    ) -> Result<RentPayment, StoreError> {
        let mut tables = self.tables("rent_payments")?;
        let row: RentPayment = payment.into();
        tables.rent_payments.push(row.clone());
        Ok(row)
    }

    async fn update_rent_payment(
        &self,
        realtor_id: &str,
        id: Uuid,
        changes: RentPaymentChanges,
    ) -> Result<Option<RentPayment>, StoreError> {
        let mut tables = self.tables("rent_payments")?;
        Ok(tables
            .rent_payments
            .iter_mut()
            .find(|p| p.id == id && p.realtor_id == realtor_id)
            .map(|p| {
                p.apply(&changes);
                p.clone()
            }))
    }

    async fn delete_rent_payment(&self, realtor_id: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables("rent_payments")?;
        let before = tables.rent_payments.len();
        tables
            .rent_payments
            .retain(|p| !(p.id == id && p.realtor_id == realtor_id));
        Ok(tables.rent_payments.len() < before)
    }
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn list_leads(&self, owner_id: &str) -> Result<Vec<Lead>, StoreError> {
        let tables = self.tables("leads")?;
        let mut rows: Vec<Lead> = tables
            .leads
            .iter()
            .filter(|l| l.owner_id == owner_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |l| l.created_at);
        Ok(rows)
    }

    async fn insert_lead(&self, lead: NewLead) -> Result<Lead, StoreError> {
        let mut tables = self.tables("leads")?;
        let row: Lead = lead.into();
        tables.leads.push(row.clone());
        Ok(row)
    }

    async fn update_lead(
        &self,
        owner_id: &str,
        id: Uuid,
        changes: LeadChanges,
    ) -> Result<Option<Lead>, StoreError> {
        let mut tables = self.tables("leads")?;
        Ok(tables
            .leads
            .iter_mut()
            .find(|l| l.id == id && l.owner_id == owner_id)
            .map(|l| {
                l.apply(&changes);
                l.clone()
            }))
    }

    async fn delete_lead(&self, owner_id: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables("leads")?;
        let before = tables.leads.len();
        tables
            .leads
            .retain(|l| !(l.id == id && l.owner_id == owner_id));
        Ok(tables.leads.len() < before)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification_if_absent(
        &self,
        notification: NewNotification,
    ) -> Result<InsertOutcome, StoreError> {
        let mut tables = self.tables("notifications")?;
        let exists = tables.notifications.iter().any(|n| {
            n.realtor_id == notification.realtor_id && n.message == notification.message
        });
        if exists {
            return Ok(InsertOutcome::AlreadyExists);
        }
        tables.notifications.push(notification.into());
        Ok(InsertOutcome::Inserted)
    }

    async fn list_notifications(&self, realtor_id: &str) -> Result<Vec<Notification>, StoreError> {
        let tables = self.tables("notifications")?;
        let mut rows: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|n| n.realtor_id == realtor_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |n| n.created_at);
        Ok(rows)
    }

    async fn mark_notification_read(
        &self,
        realtor_id: &str,
        id: Uuid,
    ) -> Result<Option<Notification>, StoreError> {
        let mut tables = self.tables("notifications")?;
        Ok(tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.realtor_id == realtor_id)
            .map(|n| {
                n.read = true;
                n.clone()
            }))
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn find_subscription(
        &self,
        customer_id: &str,
    ) -> Result<Option<Subscription>, StoreError> {
        Ok(self
            .tables("subscriptions")?
            .subscriptions
            .get(customer_id)
            .cloned())
    }

    async fn find_subscription_for_owner(
        &self,
        owner_id: &str,
    ) -> Result<Option<Subscription>, StoreError> {
        let tables = self.tables("subscriptions")?;
        Ok(tables.owner_subscription(owner_id).cloned())
    }

    async fn upsert_subscription(
        &self,
        record: SubscriptionRecord,
    ) -> Result<Subscription, StoreError> {
        let mut tables = self.tables("subscriptions")?;
        let row: Subscription = record.into();
        tables
            .subscriptions
            .insert(row.customer_id.clone(), row.clone());
        Ok(row)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.check("health")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlanTier, SubscriptionStatus};

    fn notification(realtor_id: &str, message: &str) -> NewNotification {
        NewNotification::unread(realtor_id, message.to_string(), Utc::now())
    }

    #[tokio::test]
    async fn test_notification_insert_is_idempotent_per_realtor() {
        let store = MemoryStore::new();

        let first = store
            .insert_notification_if_absent(notification("r1", "hello"))
            .await
            .unwrap();
        let second = store
            .insert_notification_if_absent(notification("r1", "hello"))
            .await
            .unwrap();
        let other_realtor = store
            .insert_notification_if_absent(notification("r2", "hello"))
            .await
            .unwrap();

        assert_eq!(first, InsertOutcome::Inserted);
        assert_eq!(second, InsertOutcome::AlreadyExists);
        assert_eq!(other_realtor, InsertOutcome::Inserted);
        assert_eq!(store.list_notifications("r1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_customer() {
        let store = MemoryStore::new();
        let record = |status| SubscriptionRecord {
            customer_id: "cus_1".to_string(),
            owner_id: Some("r1".to_string()),
            plan: PlanTier::Pro,
            property_limit: Some(10),
            status,
            trial_end: None,
            updated_at: Utc::now(),
        };

        store
            .upsert_subscription(record(SubscriptionStatus::Active))
            .await
            .unwrap();
        store
            .upsert_subscription(record(SubscriptionStatus::PastDue))
            .await
            .unwrap();

        let found = store.find_subscription_for_owner("r1").await.unwrap().unwrap();
        assert_eq!(found.status, SubscriptionStatus::PastDue);
        assert_eq!(found.property_limit, Some(10));
    }

    #[tokio::test]
    async fn test_failing_table_reports_unavailable() {
        let store = MemoryStore::new();
        store.fail_table("realtors");
        assert!(matches!(
            store.find_realtor("r1").await,
            Err(StoreError::Unavailable(_))
        ));

        store.heal_table("realtors");
        assert!(store.find_realtor("r1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_company_lookup_by_membership() {
        let store = MemoryStore::new();
        store.seed_company("co_1", "Acme Realty");
        store.seed_team_member("co_1", "user_9", "agent");

        let company = store.find_company_for_user("user_9").await.unwrap();
        assert_eq!(company.map(|c| c.id), Some("co_1".to_string()));
        assert!(store.find_company_for_user("user_8").await.unwrap().is_none());
    }
}
