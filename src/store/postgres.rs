// Diesel-backed store
// Partial updates with nothing to change fall back to a scoped SELECT,
// diesel rejects empty changesets.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use super::{
    AppointmentStore, InsertOutcome, LeadStore, MaintenanceStore, NotificationStore, OwnerStore,
    PropertyStore, QuotaOutcome, RentPaymentStore, Store, StoreError, SubscriptionStore,
    TenantStore,
};
use crate::db::{DieselConnection, DieselPool};
use crate::models::{
    check_property_quota, Appointment, AppointmentChanges, Company, Lead, LeadChanges,
    MaintenanceChanges, MaintenanceRequest, NewAppointment, NewLead, NewMaintenanceRequest,
    NewNotification, NewProperty, NewRealtor, NewRentPayment, NewTenant, Notification, Property,
    PropertyChanges, Realtor, RentPayment, RentPaymentChanges, Subscription, SubscriptionRecord,
    SubscriptionStatus, Tenant, TenantChanges,
};
use crate::schema::{
    appointments, companies, leads, maintenance_requests, notifications, properties, realtors,
    rent_payments, subscriptions, team_members, tenants,
};

#[derive(Clone)]
pub struct PgStore {
    pool: DieselPool,
}

impl PgStore {
    pub fn new(pool: DieselPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<DieselConnection<'_>, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))
    }
}

#[async_trait]
impl OwnerStore for PgStore {
    async fn find_realtor(&self, id: &str) -> Result<Option<Realtor>, StoreError> {
        let mut conn = self.conn().await?;
        let realtor = realtors::table
            .find(id)
            .select(Realtor::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(realtor)
    }

    async fn find_tenant(&self, id: &str) -> Result<Option<Tenant>, StoreError> {
        let mut conn = self.conn().await?;
        let tenant = tenants::table
            .find(id)
            .select(Tenant::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(tenant)
    }

    async fn find_company_for_user(&self, user_id: &str) -> Result<Option<Company>, StoreError> {
        let mut conn = self.conn().await?;

        let owned = companies::table
            .find(user_id)
            .select(Company::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        if owned.is_some() {
            return Ok(owned);
        }

        let membership = team_members::table
            .inner_join(companies::table)
            .filter(team_members::user_id.eq(user_id))
            .order(team_members::created_at.asc())
            .select(Company::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(membership)
    }

    async fn insert_realtor(&self, realtor: NewRealtor) -> Result<InsertOutcome, StoreError> {
        let mut conn = self.conn().await?;
        let inserted = diesel::insert_into(realtors::table)
            .values(&realtor)
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await?;

        Ok(if inserted == 0 {
            InsertOutcome::AlreadyExists
        } else {
            InsertOutcome::Inserted
        })
    }
}

#[async_trait]
impl PropertyStore for PgStore {
    async fn list_properties(&self, realtor_id: &str) -> Result<Vec<Property>, StoreError> {
        let mut conn = self.conn().await?;
        let rows = properties::table
            .filter(properties::realtor_id.eq(realtor_id))
            .order(properties::created_at.desc())
            .select(Property::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows)
    }

    async fn count_properties(&self, realtor_id: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn().await?;
        let count = properties::table
            .filter(properties::realtor_id.eq(realtor_id))
            .count()
            .get_result::<i64>(&mut conn)
            .await?;
        Ok(count)
    }

    async fn get_property(
        &self,
        realtor_id: &str,
        id: Uuid,
    ) -> Result<Option<Property>, StoreError> {
        let mut conn = self.conn().await?;
        let row = properties::table
            .filter(properties::id.eq(id))
            .filter(properties::realtor_id.eq(realtor_id))
            .select(Property::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(row)
    }

    async fn insert_property(&self, property: NewProperty) -> Result<Property, StoreError> {
        let mut conn = self.conn().await?;
        let row = diesel::insert_into(properties::table)
            .values(&property)
            .returning(Property::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(row)
    }

    async fn insert_property_within_quota(
        &self,
        property: NewProperty,
    ) -> Result<QuotaOutcome, StoreError> {
        let mut conn = self.conn().await?;
        conn.transaction::<_, StoreError, _>(|tx| {
            Box::pin(async move {
                // Locking the governing subscription row serialises creates per owner
                let subscription = subscriptions::table
                    .filter(subscriptions::owner_id.eq(&property.realtor_id))
                    .order((
                        subscriptions::status.eq(SubscriptionStatus::Canceled).asc(),
                        subscriptions::updated_at.desc(),
                    ))
                    .select(Subscription::as_select())
                    .for_update()
                    .first(tx)
                    .await
                    .optional()?;

                let held = properties::table
                    .filter(properties::realtor_id.eq(&property.realtor_id))
                    .count()
                    .get_result::<i64>(tx)
                    .await?;
                if let Err(denied) = check_property_quota(subscription.as_ref(), held) {
                    return Ok(QuotaOutcome::Denied { denied, held });
                }

                let row = diesel::insert_into(properties::table)
                    .values(&property)
                    .returning(Property::as_returning())
                    .get_result(tx)
                    .await?;
                Ok(QuotaOutcome::Inserted(row))
            })
        })
        .await
    }

    async fn update_property(
        &self,
        realtor_id: &str,
        id: Uuid,
        changes: PropertyChanges,
    ) -> Result<Option<Property>, StoreError> {
        let mut conn = self.conn().await?;
        let row = diesel::update(
            properties::table
                .filter(properties::id.eq(id))
                .filter(properties::realtor_id.eq(realtor_id)),
        )
        .set(&changes)
        .returning(Property::as_returning())
        .get_result(&mut conn)
        .await
        .optional()?;
        Ok(row)
    }

    async fn delete_property(&self, realtor_id: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(
            properties::table
                .filter(properties::id.eq(id))
                .filter(properties::realtor_id.eq(realtor_id)),
        )
        .execute(&mut conn)
        .await?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl TenantStore for PgStore {
    async fn list_tenants(&self, realtor_id: &str) -> Result<Vec<Tenant>, StoreError> {
        let mut conn = self.conn().await?;
        let rows = tenants::table
            .filter(tenants::realtor_id.eq(realtor_id))
            .order(tenants::created_at.desc())
            .select(Tenant::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows)
    }

    async fn get_tenant(&self, realtor_id: &str, id: &str) -> Result<Option<Tenant>, StoreError> {
        let mut conn = self.conn().await?;
        let row = tenants::table
            .filter(tenants::id.eq(id))
            .filter(tenants::realtor_id.eq(realtor_id))
            .select(Tenant::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(row)
    }

    async fn insert_tenant(&self, tenant: NewTenant) -> Result<Tenant, StoreError> {
        let mut conn = self.conn().await?;
        let row = diesel::insert_into(tenants::table)
            .values(&tenant)
            .returning(Tenant::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(row)
    }

    async fn update_tenant(
        &self,
        realtor_id: &str,
        id: &str,
        changes: TenantChanges,
    ) -> Result<Option<Tenant>, StoreError> {
        if changes.is_empty() {
            return self.get_tenant(realtor_id, id).await;
        }

        let mut conn = self.conn().await?;
        let row = diesel::update(
            tenants::table
                .filter(tenants::id.eq(id))
                .filter(tenants::realtor_id.eq(realtor_id)),
        )
        .set(&changes)
        .returning(Tenant::as_returning())
        .get_result(&mut conn)
        .await
        .optional()?;
        Ok(row)
    }

    async fn delete_tenant(&self, realtor_id: &str, id: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(
            tenants::table
                .filter(tenants::id.eq(id))
                .filter(tenants::realtor_id.eq(realtor_id)),
        )
        .execute(&mut conn)
        .await?;
        Ok(deleted > 0)
    }

    async fn claim_tenant(
        &self,
        record_id: &str,
        identity_id: &str,
    ) -> Result<Option<Tenant>, StoreError> {
        let mut conn = self.conn().await?;
        conn.transaction::<_, StoreError, _>(|tx| {
            Box::pin(async move {
                let record = tenants::table
                    .filter(tenants::id.eq(record_id))
                    .filter(tenants::realtor_id.is_not_null())
                    .select(Tenant::as_select())
                    .for_update()
                    .first(tx)
                    .await
                    .optional()?;
                let Some(record) = record else {
                    return Ok(None);
                };
                if record.id == identity_id {
                    return Ok(Some(record));
                }

                let owner = tenants::table
                    .find(identity_id)
                    .select(Tenant::as_select())
                    .for_update()
                    .first(tx)
                    .await
                    .optional()?;
                let claimed = match owner {
                    Some(owner) if owner.realtor_id.is_some() => {
                        return Err(StoreError::Conflict(format!(
                            "tenant {} is already linked to a realtor",
                            identity_id
                        )))
                    },
                    Some(_) => {
                        diesel::update(tenants::table.find(identity_id))
                            .set((
                                tenants::realtor_id.eq(&record.realtor_id),
                                tenants::property_id.eq(record.property_id),
                            ))
                            .returning(Tenant::as_returning())
                            .get_result(tx)
                            .await?
                    },
                    None => {
                        diesel::insert_into(tenants::table)
                            .values(&record.claimed_by(identity_id))
                            .returning(Tenant::as_returning())
                            .get_result(tx)
                            .await?
                    },
                };

                diesel::update(
                    maintenance_requests::table
                        .filter(maintenance_requests::tenant_id.eq(record_id)),
                )
                .set(maintenance_requests::tenant_id.eq(identity_id))
                .execute(tx)
                .await?;
                diesel::update(rent_payments::table.filter(rent_payments::tenant_id.eq(record_id)))
                    .set(rent_payments::tenant_id.eq(identity_id))
                    .execute(tx)
                    .await?;
                diesel::delete(tenants::table.find(record_id))
                    .execute(tx)
                    .await?;

                Ok(Some(claimed))
            })
        })
        .await
    }
}

#[async_trait]
impl AppointmentStore for PgStore {
    async fn list_appointments(&self, realtor_id: &str) -> Result<Vec<Appointment>, StoreError> {
        let mut conn = self.conn().await?;
        let rows = appointments::table
            .filter(appointments::realtor_id.eq(realtor_id))
            .order(appointments::starts_at.asc())
            .select(Appointment::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows)
    }

    async fn insert_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<Appointment, StoreError> {
        let mut conn = self.conn().await?;
        let row = diesel::insert_into(appointments::table)
            .values(&appointment)
            .returning(Appointment::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(row)
    }

    async fn update_appointment(
        &self,
        realtor_id: &str,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> Result<Option<Appointment>, StoreError> {
        let mut conn = self.conn().await?;
        let scoped = appointments::table
            .filter(appointments::id.eq(id))
            .filter(appointments::realtor_id.eq(realtor_id));

        if changes.is_empty() {
            let row = scoped
                .select(Appointment::as_select())
                .first(&mut conn)
                .await
                .optional()?;
            return Ok(row);
        }

        let row = diesel::update(scoped)
            .set(&changes)
            .returning(Appointment::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?;
        Ok(row)
    }

    async fn delete_appointment(&self, realtor_id: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(
            appointments::table
                .filter(appointments::id.eq(id))
                .filter(appointments::realtor_id.eq(realtor_id)),
        )
        .execute(&mut conn)
        .await?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl MaintenanceStore for PgStore {
    async fn list_maintenance(
        &self,
        realtor_id: &str,
    ) -> Result<Vec<MaintenanceRequest>, StoreError> {
        let mut conn = self.conn().await?;
        let rows = maintenance_requests::table
            .filter(maintenance_requests::realtor_id.eq(realtor_id))
            .order(maintenance_requests::created_at.desc())
            .select(MaintenanceRequest::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows)
    }

    async fn list_maintenance_for_tenant(
        &self,
        realtor_id: &str,
        tenant_id: &str,
    ) -> Result<Vec<MaintenanceRequest>, StoreError> {
        let mut conn = self.conn().await?;
        let rows = maintenance_requests::table
            .filter(maintenance_requests::realtor_id.eq(realtor_id))
            .filter(maintenance_requests::tenant_id.eq(tenant_id))
            .order(maintenance_requests::created_at.desc())
            .select(MaintenanceRequest::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows)
    }

    async fn list_unclassified_maintenance(
        &self,
        realtor_id: &str,
    ) -> Result<Vec<MaintenanceRequest>, StoreError> {
        let mut conn = self.conn().await?;
        let rows = maintenance_requests::table
            .filter(maintenance_requests::realtor_id.eq(realtor_id))
            .filter(maintenance_requests::priority.is_null())
            .order(maintenance_requests::created_at.asc())
            .select(MaintenanceRequest::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows)
    }

    async fn insert_maintenance(
        &self,
        request: NewMaintenanceRequest,
    ) -> Result<MaintenanceRequest, StoreError> {
        let mut conn = self.conn().await?;
        let row = diesel::insert_into(maintenance_requests::table)
            .values(&request)
            .returning(MaintenanceRequest::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(row)
    }

    async fn update_maintenance(
        &self,
        realtor_id: &str,
        id: Uuid,
        changes: MaintenanceChanges,
    ) -> Result<Option<MaintenanceRequest>, StoreError> {
        let mut conn = self.conn().await?;
        let row = diesel::update(
            maintenance_requests::table
                .filter(maintenance_requests::id.eq(id))
                .filter(maintenance_requests::realtor_id.eq(realtor_id)),
        )
        .set(&changes)
        .returning(MaintenanceRequest::as_returning())
        .get_result(&mut conn)
        .await
        .optional()?;
        Ok(row)
    }

    async fn delete_maintenance(&self, realtor_id: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(
            maintenance_requests::table
                .filter(maintenance_requests::id.eq(id))
                .filter(maintenance_requests::realtor_id.eq(realtor_id)),
        )
        .execute(&mut conn)
        .await?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl RentPaymentStore for PgStore {
    async fn list_rent_payments(&self, realtor_id: &str) -> Result<Vec<RentPayment>, StoreError> {
        let mut conn = self.conn().await?;
        let rows = rent_payments::table
            .filter(rent_payments::realtor_id.eq(realtor_id))
            .order(rent_payments::due_date.desc())
            .select(RentPayment::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows)
    }

    async fn list_rent_payments_for_tenant(
        &self,
        realtor_id: &str,
        tenant_id: &str,
    ) -> Result<Vec<RentPayment>, StoreError> {
        let mut conn = self.conn().await?;
        let rows = rent_payments::table
            .filter(rent_payments::realtor_id.eq(realtor_id))
            .filter(rent_payments::tenant_id.eq(tenant_id))
            .order(rent_payments::due_date.desc())
            .select(RentPayment::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows)
    }

    async fn insert_rent_payment(
        &self,
        payment: NewRentPayment,
    ) -> Result<RentPayment, StoreError> {
        let mut conn = self.conn().await?;
        let row = diesel::insert_into(rent_payments::table)
            .values(&payment)
            .returning(RentPayment::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(row)
    }

    async fn update_rent_payment(
        &self,
        realtor_id: &str,
        id: Uuid,
        changes: RentPaymentChanges,
    ) -> Result<Option<RentPayment>, StoreError> {
        let mut conn = self.conn().await?;
        let scoped = rent_payments::table
            .filter(rent_payments::id.eq(id))
            .filter(rent_payments::realtor_id.eq(realtor_id));

        if changes.is_empty() {
            let row = scoped
                .select(RentPayment::as_select())
                .first(&mut conn)
                .await
                .optional()?;
            return Ok(row);
        }

        let row = diesel::update(scoped)
            .set(&changes)
            .returning(RentPayment::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?;
        Ok(row)
    }

    async fn delete_rent_payment(&self, realtor_id: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(
            rent_payments::table
                .filter(rent_payments::id.eq(id))
                .filter(rent_payments::realtor_id.eq(realtor_id)),
        )
        .execute(&mut conn)
        .await?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl LeadStore for PgStore {
    async fn list_leads(&self, owner_id: &str) -> Result<Vec<Lead>, StoreError> {
        let mut conn = self.conn().await?;
        let rows = leads::table
            .filter(leads::owner_id.eq(owner_id))
            .order(leads::created_at.desc())
            .select(Lead::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows)
    }

    async fn insert_lead(&self, lead: NewLead) -> Result<Lead, StoreError> {
        let mut conn = self.conn().await?;
        let row = diesel::insert_into(leads::table)
            .values(&lead)
            .returning(Lead::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(row)
    }

    async fn update_lead(
        &self,
        owner_id: &str,
        id: Uuid,
        changes: LeadChanges,
    ) -> Result<Option<Lead>, StoreError> {
        let mut conn = self.conn().await?;
        let scoped = leads::table
            .filter(leads::id.eq(id))
            .filter(leads::owner_id.eq(owner_id));

        if changes.is_empty() {
            let row = scoped
                .select(Lead::as_select())
                .first(&mut conn)
                .await
                .optional()?;
            return Ok(row);
        }

        let row = diesel::update(scoped)
            .set(&changes)
            .returning(Lead::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?;
        Ok(row)
    }

    async fn delete_lead(&self, owner_id: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(
            leads::table
                .filter(leads::id.eq(id))
                .filter(leads::owner_id.eq(owner_id)),
        )
        .execute(&mut conn)
        .await?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert_notification_if_absent(
        &self,
        notification: NewNotification,
    ) -> Result<InsertOutcome, StoreError> {
        let mut conn = self.conn().await?;
        let inserted = diesel::insert_into(notifications::table)
            .values(&notification)
            .on_conflict((notifications::realtor_id, notifications::message))
            .do_nothing()
            .execute(&mut conn)
            .await?;

        Ok(if inserted == 0 {
            InsertOutcome::AlreadyExists
        } else {
            InsertOutcome::Inserted
        })
    }

    async fn list_notifications(&self, realtor_id: &str) -> Result<Vec<Notification>, StoreError> {
        let mut conn = self.conn().await?;
        let rows = notifications::table
            .filter(notifications::realtor_id.eq(realtor_id))
            .order(notifications::created_at.desc())
            .select(Notification::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows)
    }

    async fn mark_notification_read(
        &self,
        realtor_id: &str,
        id: Uuid,
    ) -> Result<Option<Notification>, StoreError> {
        let mut conn = self.conn().await?;
        let row = diesel::update(
            notifications::table
                .filter(notifications::id.eq(id))
                .filter(notifications::realtor_id.eq(realtor_id)),
        )
        .set(notifications::read.eq(true))
        .returning(Notification::as_returning())
        .get_result(&mut conn)
        .await
        .optional()?;
        Ok(row)
    }
}

#[async_trait]
impl SubscriptionStore for PgStore {
    async fn find_subscription(
        &self,
        customer_id: &str,
    ) -> Result<Option<Subscription>, StoreError> {
        let mut conn = self.conn().await?;
        let row = subscriptions::table
            .find(customer_id)
            .select(Subscription::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(row)
    }

    async fn find_subscription_for_owner(
        &self,
        owner_id: &str,
    ) -> Result<Option<Subscription>, StoreError> {
        let mut conn = self.conn().await?;
        let row = subscriptions::table
            .filter(subscriptions::owner_id.eq(owner_id))
            .order((
                subscriptions::status.eq(SubscriptionStatus::Canceled).asc(),
                subscriptions::updated_at.desc(),
            ))
            .select(Subscription::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(row)
    }

    async fn upsert_subscription(
        &self,
        record: SubscriptionRecord,
    ) -> Result<Subscription, StoreError> {
        let mut conn = self.conn().await?;
        let row = diesel::insert_into(subscriptions::table)
            .values(&record)
            .on_conflict(subscriptions::customer_id)
            .do_update()
            .set(&record)
            .returning(Subscription::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(row)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        diesel::sql_query("SELECT 1").execute(&mut conn).await?;
        Ok(())
    }
}
