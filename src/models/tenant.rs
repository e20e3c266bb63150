// Tenant model
// A row is a tenant owner when its id is an identity id, and a realtor's
// tenant record when realtor_id is set. Records a realtor creates carry a
// generated id until the tenant claims them, which re-keys the row onto
// the tenant's identity id.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::schema::tenants;
use crate::utils::validation::double_option;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = tenants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Tenant {
    pub id: String,
    pub realtor_id: Option<String>,
    pub property_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tenants)]
pub struct NewTenant {
    pub id: String,
    pub realtor_id: Option<String>,
    pub property_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<NewTenant> for Tenant {
    fn from(new: NewTenant) -> Self {
        Self {
            id: new.id,
            realtor_id: new.realtor_id,
            property_id: new.property_id,
            name: new.name,
            email: new.email,
            phone: new.phone,
            created_at: new.created_at,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tenants)]
pub struct TenantChanges {
    pub property_id: Option<Option<Uuid>>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
}

impl TenantChanges {
    pub fn is_empty(&self) -> bool {
        self.property_id.is_none()
            && self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
    }
}

impl Tenant {
    pub fn apply(&mut self, changes: &TenantChanges) {
        if let Some(property_id) = changes.property_id {
            self.property_id = property_id;
        }
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(email) = &changes.email {
            self.email = email.clone();
        }
        if let Some(phone) = &changes.phone {
            self.phone = phone.clone();
        }
    }
}

/// Generated id for tenant records that have no identity yet
pub fn generate_tenant_id() -> String {
    format!("tenant_{}", Uuid::new_v4().simple())
}

impl Tenant {
    /// Whether an identity with `email` may claim this record
    pub fn invites(&self, email: &str) -> bool {
        self.realtor_id.is_some() && self.email.eq_ignore_ascii_case(email.trim())
    }

    /// Owner row for `identity_id` carrying this record's realtor link
    pub fn claimed_by(&self, identity_id: &str) -> NewTenant {
        NewTenant {
            id: identity_id.to_string(),
            realtor_id: self.realtor_id.clone(),
            property_id: self.property_id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            created_at: self.created_at,
        }
    }
}

// =============================================================================
// REQUEST DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateTenantRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub property_id: Option<Uuid>,
}

impl CreateTenantRequest {
    pub fn into_new_tenant(self, realtor_id: &str) -> NewTenant {
        NewTenant {
            id: generate_tenant_id(),
            realtor_id: Some(realtor_id.to_string()),
            property_id: self.property_id,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: self.phone,
            created_at: Utc::now(),
        }
    }
}

/// Body of POST /v1/portal/claim
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ClaimTenantRequest {
    #[validate(length(min = 1, max = 255))]
    pub tenant_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateTenantRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub property_id: Option<Option<Uuid>>,
}

impl From<UpdateTenantRequest> for TenantChanges {
    fn from(req: UpdateTenantRequest) -> Self {
        Self {
            property_id: req.property_id,
            name: req.name.map(|n| n.trim().to_string()),
            email: req.email.map(|e| e.trim().to_lowercase()),
            phone: req.phone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(email: &str) -> CreateTenantRequest {
        CreateTenantRequest {
            name: " Pat Tenant ".to_string(),
            email: email.to_string(),
            phone: None,
            property_id: None,
        }
    }

    #[test]
    fn test_records_always_get_generated_ids() {
        let first = create("pat@example.com").into_new_tenant("realtor_1");
        let second = create("pat@example.com").into_new_tenant("realtor_1");
        assert!(first.id.starts_with("tenant_"));
        assert_ne!(first.id, second.id);
        assert_eq!(first.realtor_id.as_deref(), Some("realtor_1"));
        assert_eq!(first.name, "Pat Tenant");
    }

    #[test]
    fn test_client_supplied_id_is_ignored() {
        let request: CreateTenantRequest = serde_json::from_value(serde_json::json!({
            "id": "realtor_2",
            "name": "Pat",
            "email": "pat@example.com"
        }))
        .unwrap();
        assert_ne!(request.into_new_tenant("realtor_1").id, "realtor_2");
    }

    #[test]
    fn test_invitation_matches_email_of_linked_records_only() {
        let record: Tenant = create("Pat@Example.com").into_new_tenant("realtor_1").into();
        assert!(record.invites("pat@example.com "));
        assert!(!record.invites("someone@example.com"));

        let unlinked = Tenant {
            realtor_id: None,
            ..record.clone()
        };
        assert!(!unlinked.invites("pat@example.com"));

        let claimed = record.claimed_by("user_9");
        assert_eq!(claimed.id, "user_9");
        assert_eq!(claimed.realtor_id.as_deref(), Some("realtor_1"));
    }
}
