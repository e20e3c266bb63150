// Role resolution and onboarding role selection
// Precedence when an identity matches more than one owner table:
// realtor, then tenant, then company.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::models::{
    NewRealtor, NewTenant, Role, RoleResolution, SelectRoleRequest, SelectableRole,
    SELECT_ROLE_PATH,
};
use crate::store::{InsertOutcome, Store, StoreError};
use crate::utils::{trim_and_validate_field, trim_optional_field, ServiceError};

const PRECEDENCE: [Role; 3] = [Role::Realtor, Role::Tenant, Role::Company];

/// Resolution from the set of roles whose owner row exists
pub fn resolve_from_matches(matched: &[Role]) -> RoleResolution {
    let mut ordered = PRECEDENCE.iter().copied().filter(|role| matched.contains(role));

    match ordered.next() {
        Some(role) => RoleResolution {
            role: Some(role),
            dashboard_path: role.dashboard_path().to_string(),
            conflicting_roles: ordered.collect(),
        },
        None => RoleResolution {
            role: None,
            dashboard_path: SELECT_ROLE_PATH.to_string(),
            conflicting_roles: Vec::new(),
        },
    }
}

fn found_or_warn<T>(role: Role, identity_id: &str, lookup: Result<Option<T>, StoreError>) -> bool {
    match lookup {
        Ok(row) => row.is_some(),
        Err(e) => {
            warn!("{} lookup failed for {}, treating as absent: {}", role, identity_id, e);
            false
        },
    }
}

pub struct RoleResolver {
    store: Arc<dyn Store>,
}

impl RoleResolver {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, identity_id: &str) -> RoleResolution {
        let (realtor, tenant, company) = tokio::join!(
            self.store.find_realtor(identity_id),
            self.store.find_tenant(identity_id),
            self.store.find_company_for_user(identity_id),
        );

        let matched: Vec<Role> = [
            (Role::Realtor, found_or_warn(Role::Realtor, identity_id, realtor)),
            (Role::Tenant, found_or_warn(Role::Tenant, identity_id, tenant)),
            (Role::Company, found_or_warn(Role::Company, identity_id, company)),
        ]
        .into_iter()
        .filter_map(|(role, found)| found.then_some(role))
        .collect();

        let resolution = resolve_from_matches(&matched);
        if !resolution.conflicting_roles.is_empty() {
            warn!(
                "Identity {} has several owner rows: {:?}, using {:?}",
                identity_id, matched, resolution.role
            );
        }
        resolution
    }

    /// Like `resolve`, but a failed lookup is an error rather than an absent row.
    /// Used before writes, where a missed row would let a second role in.
    pub async fn resolve_strict(&self, identity_id: &str) -> Result<RoleResolution, StoreError> {
        let (realtor, tenant, company) = tokio::try_join!(
            self.store.find_realtor(identity_id),
            self.store.find_tenant(identity_id),
            self.store.find_company_for_user(identity_id),
        )?;

        let matched: Vec<Role> = [
            (Role::Realtor, realtor.is_some()),
            (Role::Tenant, tenant.is_some()),
            (Role::Company, company.is_some()),
        ]
        .into_iter()
        .filter_map(|(role, found)| found.then_some(role))
        .collect();
        Ok(resolve_from_matches(&matched))
    }

    /// Create the owner row for a first-time user
    #[instrument(skip(self, request), fields(role = ?request.role))]
    pub async fn select(
        &self,
        identity_id: &str,
        request: SelectRoleRequest,
    ) -> Result<RoleResolution, ServiceError> {
        request.validate()?;
        let wanted = Role::from(request.role);

        let current = self.resolve_strict(identity_id).await?;
        match current.role {
            Some(role) if role == wanted => return Ok(current),
            Some(role) => {
                return Err(ServiceError::Conflict(format!(
                    "Account is already registered as {}",
                    role
                )))
            },
            None => {},
        }

        let name =
            trim_and_validate_field(&request.name, true).map_err(ServiceError::ValidationError)?;
        let email = request.email.trim().to_lowercase();
        let now = Utc::now();

        match request.role {
            SelectableRole::Realtor => {
                let outcome = self
                    .store
                    .insert_realtor(NewRealtor {
                        id: identity_id.to_string(),
                        name,
                        email,
                        company_name: trim_optional_field(request.company_name.as_ref()),
                        created_at: now,
                    })
                    .await?;
                if outcome == InsertOutcome::AlreadyExists {
                    info!("Realtor row for {} already existed", identity_id);
                }
            },
            SelectableRole::Tenant => {
                let inserted = self
                    .store
                    .insert_tenant(NewTenant {
                        id: identity_id.to_string(),
                        realtor_id: None,
                        property_id: None,
                        name,
                        email,
                        phone: trim_optional_field(request.phone.as_ref()),
                        created_at: now,
                    })
                    .await;
                match inserted {
                    Ok(_) => {},
                    Err(StoreError::Conflict(_)) => {
                        info!("Tenant row for {} already existed", identity_id)
                    },
                    Err(e) => return Err(e.into()),
                }
            },
        }

        Ok(resolve_from_matches(&[wanted]))
    }
}
