// Lead model: prospects captured from the public contact form

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::schema::leads;

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
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Lost,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::Qualified => "Qualified",
            LeadStatus::Lost => "Lost",
        }
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(LeadStatus::New),
            "Contacted" => Ok(LeadStatus::Contacted),
            "Qualified" => Ok(LeadStatus::Qualified),
            "Lost" => Ok(LeadStatus::Lost),
            _ => Err(format!("Invalid lead status: {}", s)),
        }
    }
}

super::text_column_enum!(LeadStatus);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = leads)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Lead {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = leads)]
pub struct NewLead {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
}

impl From<NewLead> for Lead {
    fn from(new: NewLead) -> Self {
        Self {
            id: new.id,
            owner_id: new.owner_id,
            name: new.name,
            email: new.email,
            phone: new.phone,
            message: new.message,
            status: new.status,
            created_at: new.created_at,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = leads)]
pub struct LeadChanges {
    pub status: Option<LeadStatus>,
    pub phone: Option<Option<String>>,
}

impl LeadChanges {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.phone.is_none()
    }
}

impl Lead {
    pub fn apply(&mut self, changes: &LeadChanges) {
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(phone) = &changes.phone {
            self.phone = phone.clone();
        }
    }
}

// =============================================================================
// REQUEST DTOs
// =============================================================================

/// Public contact form submission
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CaptureLeadRequest {
    #[validate(length(min = 1, max = 255))]
    pub owner_id: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(length(max = 5000))]
    pub message: Option<String>,
}

impl CaptureLeadRequest {
    pub fn into_new_lead(self) -> NewLead {
        NewLead {
            id: Uuid::new_v4(),
            owner_id: self.owner_id,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: self.phone,
            message: self.message,
            status: LeadStatus::New,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateLeadRequest {
    pub status: Option<LeadStatus>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
}

impl From<UpdateLeadRequest> for LeadChanges {
    fn from(req: UpdateLeadRequest) -> Self {
        Self {
            status: req.status,
            phone: req.phone.map(Some),
        }
    }
}
