use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Account role. Admins may moderate other accounts; everything else is
/// gated by ownership of the individual resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Role {
        match s {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }
}

/// The acting user, as resolved by the external `Authenticator`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_owner(&self, owner_id: i64) -> bool {
        self.id == owner_id
    }
}

/// Fails with `Unauthenticated` where an operation requires a principal and
/// none was supplied.
pub fn require_principal(principal: Option<&Principal>) -> Result<&Principal> {
    principal.ok_or(AppError::Unauthenticated)
}

pub fn ensure_owner(principal: &Principal, owner_id: i64) -> Result<()> {
    if principal.is_owner(owner_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "you do not own this resource".to_string(),
        ))
    }
}

pub fn ensure_admin(principal: &Principal) -> Result<()> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("admin access required".to_string()))
    }
}
