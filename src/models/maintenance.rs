// Maintenance request model
// Priority is optional on the row and filled in by triage when absent

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::schema::maintenance_requests;

/// Canonical triage priority. Every call site serializes it lowercase.
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
pub enum Priority {
    #[serde(alias = "Low", alias = "LOW")]
    Low,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "High", alias = "HIGH")]
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Lenient parse used for model output: case-insensitive, ignores
    /// surrounding punctuation and accepts a single-word answer in a sentence.
    pub fn parse_loose(text: &str) -> Option<Self> {
        let words: Vec<String> = text
            .split(|c: char| !c.is_ascii_alphabetic())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_ascii_lowercase())
            .collect();

        let found: Vec<Priority> = words
            .iter()
            .filter_map(|w| w.parse::<Priority>().ok())
            .collect();

        match found.as_slice() {
            [only] => Some(*only),
            [first, rest @ ..] if rest.iter().all(|p| p == first) => Some(*first),
            _ => None,
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

super::text_column_enum!(Priority);

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
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Pending,
    InProgress,
    Completed,
}

impl MaintenanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceStatus::Pending => "pending",
            MaintenanceStatus::InProgress => "in_progress",
            MaintenanceStatus::Completed => "completed",
        }
    }
}

impl FromStr for MaintenanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MaintenanceStatus::Pending),
            "in_progress" => Ok(MaintenanceStatus::InProgress),
            "completed" => Ok(MaintenanceStatus::Completed),
            _ => Err(format!("Invalid maintenance status: {}", s)),
        }
    }
}

super::text_column_enum!(MaintenanceStatus);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = maintenance_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MaintenanceRequest {
    pub id: Uuid,
    pub realtor_id: String,
    pub tenant_id: Option<String>,
    pub property_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub status: MaintenanceStatus,
    pub priority: Option<Priority>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = maintenance_requests)]
pub struct NewMaintenanceRequest {
    pub id: Uuid,
    pub realtor_id: String,
    pub tenant_id: Option<String>,
    pub property_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub status: MaintenanceStatus,
    pub priority: Option<Priority>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NewMaintenanceRequest> for MaintenanceRequest {
    fn from(new: NewMaintenanceRequest) -> Self {
        Self {
            id: new.id,
            realtor_id: new.realtor_id,
            tenant_id: new.tenant_id,
            property_id: new.property_id,
            title: new.title,
            description: new.description,
            status: new.status,
            priority: new.priority,
            created_at: new.created_at,
            updated_at: new.updated_at,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = maintenance_requests)]
pub struct MaintenanceChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<MaintenanceStatus>,
    pub priority: Option<Option<Priority>>,
    pub updated_at: DateTime<Utc>,
}

impl MaintenanceChanges {
    pub fn priority_only(priority: Priority) -> Self {
        Self {
            title: None,
            description: None,
            status: None,
            priority: Some(Some(priority)),
            updated_at: Utc::now(),
        }
    }
}

impl MaintenanceRequest {
    pub fn apply(&mut self, changes: &MaintenanceChanges) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(description) = &changes.description {
            self.description = description.clone();
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(priority) = changes.priority {
            self.priority = priority;
        }
        self.updated_at = changes.updated_at;
    }
}

// =============================================================================
// REQUEST DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateMaintenanceRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    pub tenant_id: Option<String>,
    pub property_id: Option<Uuid>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateMaintenanceRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub description: Option<String>,
    pub status: Option<MaintenanceStatus>,
    pub priority: Option<Priority>,
}

impl From<UpdateMaintenanceRequest> for MaintenanceChanges {
    fn from(req: UpdateMaintenanceRequest) -> Self {
        Self {
            title: req.title.map(|t| t.trim().to_string()),
            description: req.description,
            status: req.status,
            priority: req.priority.map(Some),
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct TriageRequest {
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TriageResponse {
    pub priority: Priority,
}
