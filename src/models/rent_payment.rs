// Rent payment model

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::schema::rent_payments;
use crate::utils::validation::double_option;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    diesel::AsExpression,
    diesel::FromSqlRow,
)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "lowercase")]
pub enum RentPaymentStatus {
    Pending,
    Paid,
    Late,
}

impl RentPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentPaymentStatus::Pending => "pending",
            RentPaymentStatus::Paid => "paid",
            RentPaymentStatus::Late => "late",
        }
    }
}

impl FromStr for RentPaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RentPaymentStatus::Pending),
            "paid" => Ok(RentPaymentStatus::Paid),
            "late" => Ok(RentPaymentStatus::Late),
            _ => Err(format!("Invalid rent payment status: {}", s)),
        }
    }
}

super::text_column_enum!(RentPaymentStatus);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = rent_payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RentPayment {
    pub id: Uuid,
    pub realtor_id: String,
    pub tenant_id: String,
    pub property_id: Option<Uuid>,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    pub status: RentPaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = rent_payments)]
pub struct NewRentPayment {
    pub id: Uuid,
    pub realtor_id: String,
    pub tenant_id: String,
    pub property_id: Option<Uuid>,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    pub status: RentPaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<NewRentPayment> for RentPayment {
    fn from(new: NewRentPayment) -> Self {
        Self {
            id: new.id,
            realtor_id: new.realtor_id,
            tenant_id: new.tenant_id,
            property_id: new.property_id,
            amount_cents: new.amount_cents,
            due_date: new.due_date,
            status: new.status,
            paid_at: new.paid_at,
            created_at: new.created_at,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = rent_payments)]
pub struct RentPaymentChanges {
    pub amount_cents: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<RentPaymentStatus>,
    pub paid_at: Option<Option<DateTime<Utc>>>,
}

impl RentPaymentChanges {
    pub fn is_empty(&self) -> bool {
        self.amount_cents.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
            && self.paid_at.is_none()
    }
}

impl RentPayment {
    pub fn apply(&mut self, changes: &RentPaymentChanges) {
        if let Some(amount) = changes.amount_cents {
            self.amount_cents = amount;
        }
        if let Some(due_date) = changes.due_date {
            self.due_date = due_date;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(paid_at) = changes.paid_at {
            self.paid_at = paid_at;
        }
    }
}

// =============================================================================
// REQUEST DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateRentPaymentRequest {
    #[validate(length(min = 1, max = 255))]
    pub tenant_id: String,
    pub property_id: Option<Uuid>,
    #[validate(range(min = 0))]
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    pub status: Option<RentPaymentStatus>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl CreateRentPaymentRequest {
    pub fn into_new_payment(self, realtor_id: &str) -> NewRentPayment {
        let status = self.status.unwrap_or(if self.paid_at.is_some() {
            RentPaymentStatus::Paid
        } else {
            RentPaymentStatus::Pending
        });

        NewRentPayment {
            id: Uuid::new_v4(),
            realtor_id: realtor_id.to_string(),
            tenant_id: self.tenant_id,
            property_id: self.property_id,
            amount_cents: self.amount_cents,
            due_date: self.due_date,
            status,
            paid_at: self.paid_at,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateRentPaymentRequest {
    #[validate(range(min = 0))]
    pub amount_cents: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<RentPaymentStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub paid_at: Option<Option<DateTime<Utc>>>,
}

impl From<UpdateRentPaymentRequest> for RentPaymentChanges {
    fn from(req: UpdateRentPaymentRequest) -> Self {
        // Marking a payment paid without a timestamp stamps it now
        let paid_at = match (req.status, req.paid_at) {
            (Some(RentPaymentStatus::Paid), None) => Some(Some(Utc::now())),
            (_, paid_at) => paid_at,
        };

        Self {
            amount_cents: req.amount_cents,
            due_date: req.due_date,
            status: req.status,
            paid_at,
        }
    }
}
