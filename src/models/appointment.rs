// Appointment model (showings, inspections, move-ins)

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::schema::appointments;
use crate::utils::validation::double_option;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = appointments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Appointment {
    pub id: Uuid,
    pub realtor_id: String,
    pub property_id: Option<Uuid>,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = appointments)]
pub struct NewAppointment {
    pub id: Uuid,
    pub realtor_id: String,
    pub property_id: Option<Uuid>,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<NewAppointment> for Appointment {
    fn from(new: NewAppointment) -> Self {
        Self {
            id: new.id,
            realtor_id: new.realtor_id,
            property_id: new.property_id,
            title: new.title,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            notes: new.notes,
            created_at: new.created_at,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = appointments)]
pub struct AppointmentChanges {
    pub property_id: Option<Option<Uuid>>,
    pub title: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<Option<DateTime<Utc>>>,
    pub notes: Option<Option<String>>,
}

impl AppointmentChanges {
    pub fn is_empty(&self) -> bool {
        self.property_id.is_none()
            && self.title.is_none()
            && self.starts_at.is_none()
            && self.ends_at.is_none()
            && self.notes.is_none()
    }
}

impl Appointment {
    pub fn apply(&mut self, changes: &AppointmentChanges) {
        if let Some(property_id) = changes.property_id {
            self.property_id = property_id;
        }
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(starts_at) = changes.starts_at {
            self.starts_at = starts_at;
        }
        if let Some(ends_at) = changes.ends_at {
            self.ends_at = ends_at;
        }
        if let Some(notes) = &changes.notes {
            self.notes = notes.clone();
        }
    }
}

/// Appointments must not end before they start
pub fn check_time_range(
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
) -> Result<(), String> {
    match ends_at {
        Some(end) if end < starts_at => Err("ends_at must not be before starts_at".to_string()),
        _ => Ok(()),
    }
}

// =============================================================================
// REQUEST DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateAppointmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub property_id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

impl CreateAppointmentRequest {
    pub fn into_new_appointment(self, realtor_id: &str) -> NewAppointment {
        NewAppointment {
            id: Uuid::new_v4(),
            realtor_id: realtor_id.to_string(),
            property_id: self.property_id,
            title: self.title.trim().to_string(),
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            notes: self.notes,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateAppointmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub property_id: Option<Option<Uuid>>,
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    pub ends_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl From<UpdateAppointmentRequest> for AppointmentChanges {
    fn from(req: UpdateAppointmentRequest) -> Self {
        Self {
            property_id: req.property_id,
            title: req.title.map(|t| t.trim().to_string()),
            starts_at: req.starts_at,
            ends_at: req.ends_at,
            notes: req.notes,
        }
    }
}
