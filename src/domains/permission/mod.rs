use serde::{Deserialize, Serialize};

/// UserRole enum for authorization in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Coordinator,
}

/// Permission enum representing individual permissions in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    // Workshop permissions
    ViewWorkshops,

    // Trainer and registration permissions
    ViewTrainers,
    ManageTrainers,
    ManageRegistrations,

    // Contract permissions
    ViewContracts,
    ManageContracts,
    RenderContracts,

    // System permissions
    DeleteRecords,
}

impl UserRole {
    /// Check whether this role grants a single permission
    pub fn has_permission(&self, permission: Permission) -> bool {
        match self {
            UserRole::Admin => true,
            UserRole::Coordinator => !matches!(permission, Permission::DeleteRecords),
        }
    }

    /// Check whether this role grants every permission in the slice
    pub fn has_permissions(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(*p))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Coordinator => "coordinator",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(UserRole::Admin),
            "coordinator" => Some(UserRole::Coordinator),
            _ => None,
        }
    }
}
