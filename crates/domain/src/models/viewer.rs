//! The authenticated caller a report is generated for.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Application role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Citizen,
    Authority,
    Admin,
    Ngo,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Citizen => "citizen",
            UserRole::Authority => "authority",
            UserRole::Admin => "admin",
            UserRole::Ngo => "ngo",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "citizen" => Ok(UserRole::Citizen),
            "authority" => Ok(UserRole::Authority),
            "admin" => Ok(UserRole::Admin),
            "ngo" => Ok(UserRole::Ngo),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Caller identity used for row scoping and cache-key context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Uuid,
    pub role: UserRole,
    pub department: Option<String>,
}

impl Viewer {
    pub fn new(user_id: Uuid, role: UserRole, department: Option<String>) -> Self {
        Self {
            user_id,
            role,
            department: department.filter(|d| !d.is_empty()),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Authorities and admins may change complaint status.
    pub fn can_update_status(&self) -> bool {
        matches!(self.role, UserRole::Authority | UserRole::Admin)
    }

    /// Department an authority is confined to, if any.
    pub fn department_scope(&self) -> Option<&str> {
        match self.role {
            UserRole::Authority => self.department.as_deref(),
            _ => None,
        }
    }

    pub fn user_key(&self) -> String {
        self.user_id.to_string()
    }
}
