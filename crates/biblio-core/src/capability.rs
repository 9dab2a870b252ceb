//! Role-based capabilities

use serde::Serialize;

use crate::error::{LibraryError, LibraryResult};
use crate::models::{Role, User};

/// Something an authenticated user may be allowed to do
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Browse books, authors, categories, readers, loans and the dashboard
    ReadCatalog,
    /// Create, change and delete books, authors, categories and readers
    ManageCatalog,
    /// Issue, return and delete loans
    ManageLoans,
    /// List, change and delete user accounts
    ManageUsers,
    /// Persist overdue statuses on demand
    SweepOverdue,
}

const USER_CAPABILITIES: &[Capability] = &[Capability::ReadCatalog, Capability::ManageLoans];

const ADMIN_CAPABILITIES: &[Capability] = &[
    Capability::ReadCatalog,
    Capability::ManageCatalog,
    Capability::ManageLoans,
    Capability::ManageUsers,
    Capability::SweepOverdue,
];

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ReadCatalog => "read_catalog",
            Capability::ManageCatalog => "manage_catalog",
            Capability::ManageLoans => "manage_loans",
            Capability::ManageUsers => "manage_users",
            Capability::SweepOverdue => "sweep_overdue",
        }
    }
}

impl Role {
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::Admin => ADMIN_CAPABILITIES,
            Role::User => USER_CAPABILITIES,
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// Fail with `Forbidden` unless the user's role grants `capability`
pub fn authorize(user: &User, capability: Capability) -> LibraryResult<()> {
    if user.role.allows(capability) {
        Ok(())
    } else {
        Err(LibraryError::Forbidden(format!(
            "Role '{}' lacks the {} capability",
            user.role,
            capability.as_str()
        )))
    }
}
