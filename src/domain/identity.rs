use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated caller as asserted by the upstream identity service.
/// The core trusts this and performs no credential logic of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    Host,
    Admin,
}

impl Role {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "guest" => Some(Role::Guest),
            "host" => Some(Role::Host),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Host | Role::Admin)
    }
}

impl Identity {
    /// Guests may only act on their own resources; hosts and admins
    /// may act on anyone's.
    pub fn can_act_for(&self, owner: Uuid) -> bool {
        self.user_id == owner || self.role.is_staff()
    }
}
