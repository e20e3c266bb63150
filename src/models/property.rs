// Property model
// Properties belong to exactly one realtor and are always queried by realtor_id

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::schema::properties;
use crate::utils::validation::double_option;

/// Occupancy status of a property
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
pub enum PropertyStatus {
    Vacant,
    Occupied,
    Pending,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Vacant => "Vacant",
            PropertyStatus::Occupied => "Occupied",
            PropertyStatus::Pending => "Pending",
        }
    }
}

impl FromStr for PropertyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Vacant" => Ok(PropertyStatus::Vacant),
            "Occupied" => Ok(PropertyStatus::Occupied),
            "Pending" => Ok(PropertyStatus::Pending),
            _ => Err(format!("Invalid property status: {}", s)),
        }
    }
}

super::text_column_enum!(PropertyStatus);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = properties)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Property {
    pub id: Uuid,
    pub realtor_id: String,
    pub title: String,
    pub address: String,
    pub price_cents: i64,
    pub status: PropertyStatus,
    pub lease_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = properties)]
pub struct NewProperty {
    pub id: Uuid,
    pub realtor_id: String,
    pub title: String,
    pub address: String,
    pub price_cents: i64,
    pub status: PropertyStatus,
    pub lease_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NewProperty> for Property {
    fn from(new: NewProperty) -> Self {
        Self {
            id: new.id,
            realtor_id: new.realtor_id,
            title: new.title,
            address: new.address,
            price_cents: new.price_cents,
            status: new.status,
            lease_end: new.lease_end,
            created_at: new.created_at,
            updated_at: new.updated_at,
        }
    }
}

/// Partial update; `updated_at` is always written so the changeset is never empty
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = properties)]
pub struct PropertyChanges {
    pub title: Option<String>,
    pub address: Option<String>,
    pub price_cents: Option<i64>,
    pub status: Option<PropertyStatus>,
    pub lease_end: Option<Option<NaiveDate>>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    /// Apply a changeset in memory, mirroring what the UPDATE statement does
    pub fn apply(&mut self, changes: &PropertyChanges) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(address) = &changes.address {
            self.address = address.clone();
        }
        if let Some(price) = changes.price_cents {
            self.price_cents = price;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(lease_end) = changes.lease_end {
            self.lease_end = lease_end;
        }
        self.updated_at = changes.updated_at;
    }
}

// =============================================================================
// REQUEST DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreatePropertyRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    #[validate(range(min = 0))]
    pub price_cents: i64,
    pub status: Option<PropertyStatus>,
    pub lease_end: Option<NaiveDate>,
}

impl CreatePropertyRequest {
    pub fn into_new_property(self, realtor_id: &str) -> NewProperty {
        let now = Utc::now();
        NewProperty {
            id: Uuid::new_v4(),
            realtor_id: realtor_id.to_string(),
            title: self.title.trim().to_string(),
            address: self.address.trim().to_string(),
            price_cents: self.price_cents,
            status: self.status.unwrap_or(PropertyStatus::Vacant),
            lease_end: self.lease_end,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdatePropertyRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub address: Option<String>,
    #[validate(range(min = 0))]
    pub price_cents: Option<i64>,
    pub status: Option<PropertyStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub lease_end: Option<Option<NaiveDate>>,
}

impl From<UpdatePropertyRequest> for PropertyChanges {
    fn from(req: UpdatePropertyRequest) -> Self {
        Self {
            title: req.title.map(|t| t.trim().to_string()),
            address: req.address.map(|a| a.trim().to_string()),
            price_cents: req.price_cents,
            status: req.status,
            lease_end: req.lease_end,
            updated_at: Utc::now(),
        }
    }
}
