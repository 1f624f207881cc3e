//! Caller identity, capability checks, and the access scope resolver.
//!
//! The resolver is the single row-level authorization boundary: every read,
//! update, delete, and aggregate goes through a resolved [`AccessScope`].
//! Capability checks gate whole operations and take the caller's role set as
//! an explicit parameter rather than ambient request context.

use serde::{Deserialize, Serialize};

use crate::models::Role;

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Caller {
    pub id: String,
    pub roles: Vec<Role>,
}

impl Caller {
    pub fn new(id: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            id: id.into(),
            roles,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_doctor(&self) -> bool {
        self.has_role(Role::Doctor)
    }

    pub fn is_patient(&self) -> bool {
        self.has_role(Role::Patient)
    }
}

/// The subset of treatment records a caller may see or act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
    /// Every active record (doctors by default)
    All,
    /// Active records created by this doctor (`mine_only`)
    DoctorOwn(String),
    /// Active records belonging to this patient, unconditionally
    PatientOwn(String),
    /// No records at all
    Deny,
}

impl AccessScope {
    pub fn is_deny(&self) -> bool {
        matches!(self, AccessScope::Deny)
    }
}

/// Resolve the row-level scope for a caller.
///
/// Doctors see everything unless they ask for `mine_only`; patients are
/// pinned to their own records no matter what they request; anyone else gets
/// the empty set. A caller holding both roles resolves as doctor - the role
/// branch order matches the original middleware chain.
pub fn resolve_scope(caller: &Caller, mine_only: bool) -> AccessScope {
    if caller.is_doctor() {
        if mine_only {
            AccessScope::DoctorOwn(caller.id.clone())
        } else {
            AccessScope::All
        }
    } else if caller.is_patient() {
        AccessScope::PatientOwn(caller.id.clone())
    } else {
        AccessScope::Deny
    }
}

/// Capability check for the read operations (list, show).
pub fn can_read(caller: &Caller) -> bool {
    caller.is_doctor() || caller.is_patient()
}

/// Capability check for the mutating operations (create, update, delete).
/// Patients are refused even inside their own scope.
pub fn can_write(caller: &Caller) -> bool {
    caller.is_doctor()
}
