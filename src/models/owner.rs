// Owner models: realtors, companies and their team members
// Tenant owners share the tenants table, see models::tenant

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::schema::{companies, realtors, team_members};

/// Dashboard role an identity maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Realtor,
    Tenant,
    Company,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Realtor => "realtor",
            Role::Tenant => "tenant",
            Role::Company => "company",
        }
    }

    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Realtor => "/dashboard/realtor",
            Role::Tenant => "/dashboard/tenant",
            Role::Company => "/dashboard/company",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "realtor" => Ok(Role::Realtor),
            "tenant" => Ok(Role::Tenant),
            "company" => Ok(Role::Company),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Path for identities that have not picked a role yet
impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const SELECT_ROLE_PATH: &str = "/select-role";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = realtors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Realtor {
    pub id: String,
    pub name: String,
    pub email: String,
    pub company_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = realtors)]
pub struct NewRealtor {
    pub id: String,
    pub name: String,
    pub email: String,
    pub company_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<NewRealtor> for Realtor {
    fn from(new: NewRealtor) -> Self {
        Self {
            id: new.id,
            name: new.name,
            email: new.email,
            company_name: new.company_name,
            created_at: new.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = companies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Company {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = team_members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TeamMember {
    pub id: Uuid,
    pub company_id: String,
    pub user_id: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// REQUEST/RESPONSE DTOs
// =============================================================================

/// Role a user may pick for themselves; company roles come from invitations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectableRole {
    Realtor,
    Tenant,
}

impl From<SelectableRole> for Role {
    fn from(role: SelectableRole) -> Self {
        match role {
            SelectableRole::Realtor => Role::Realtor,
            SelectableRole::Tenant => Role::Tenant,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SelectRoleRequest {
    pub role: SelectableRole,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 200))]
    pub company_name: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
}

/// Outcome of role resolution for one identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleResolution {
    pub role: Option<Role>,
    pub dashboard_path: String,
    /// Lower-precedence roles that also matched. Non-empty means the owner
    /// tables disagree about this identity.
    pub conflicting_roles: Vec<Role>,
}

impl RoleResolution {
    pub fn needs_onboarding(&self) -> bool {
        self.role.is_none()
    }
}
