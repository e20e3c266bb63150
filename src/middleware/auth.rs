// Caller identity attached to authenticated requests

use serde::{Deserialize, Serialize};

use crate::services::IdentityClaims;

/// Authenticated user information extracted from the identity token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Identity provider user id
    pub user_id: String,
    pub session_id: Option<String>,
    pub email: Option<String>,
}

impl From<IdentityClaims> for AuthenticatedUser {
    fn from(claims: IdentityClaims) -> Self {
        Self {
            user_id: claims.sub,
            session_id: claims.sid,
            email: claims.email,
        }
    }
}
