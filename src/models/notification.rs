// Notification model
// (realtor_id, message) is unique; inserts are idempotent on that key

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::notifications;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Notification {
    pub id: Uuid,
    pub realtor_id: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub id: Uuid,
    pub realtor_id: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl NewNotification {
    pub fn unread(realtor_id: &str, message: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            realtor_id: realtor_id.to_string(),
            message,
            read: false,
            created_at: now,
        }
    }
}

impl From<NewNotification> for Notification {
    fn from(new: NewNotification) -> Self {
        Self {
            id: new.id,
            realtor_id: new.realtor_id,
            message: new.message,
            read: new.read,
            created_at: new.created_at,
        }
    }
}
