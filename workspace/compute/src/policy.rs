//! Role-based access rules.
//!
//! One table lists what each role may do with each resource. [`authorize`]
//! is the only place it is consulted; it runs before any lookup so a role
//! denial reveals nothing about which rows exist.

use model::entities::user::Role;
use tracing::warn;
use uuid::Uuid;

use crate::error::{AccessError, Result};
use crate::identity::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Deal,
    Return,
    Plan,
    User,
    /// Dashboard metrics and the sales chart
    Dashboard,
    /// Every other analytics view
    Analytics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Deny,
    /// Every row
    All,
    /// Only rows owned by the caller
    Own,
}

/// Rows the caller may touch once authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Owner(Uuid),
}

impl Scope {
    /// The owner constraint to inject into queries, if any.
    pub fn owner(&self) -> Option<Uuid> {
        match self {
            Self::All => None,
            Self::Owner(id) => Some(*id),
        }
    }

    pub fn permits(&self, owner_id: Uuid) -> bool {
        match self {
            Self::All => true,
            Self::Owner(id) => *id == owner_id,
        }
    }
}

use Operation::{Create, Delete, Read, Update};
use Resource::{Analytics, Dashboard, Deal, Plan, Return, User};
use Role::{Admin, Financist, Manager};

/// Anything not listed is denied.
const POLICY: &[(Role, Resource, Operation, Rule)] = &[
    (Admin, Deal, Read, Rule::All),
    (Admin, Deal, Create, Rule::All),
    (Admin, Deal, Update, Rule::All),
    (Admin, Deal, Delete, Rule::All),
    (Admin, Return, Read, Rule::All),
    (Admin, Return, Create, Rule::All),
    (Admin, Return, Update, Rule::All),
    (Admin, Plan, Read, Rule::All),
    (Admin, Plan, Create, Rule::All),
    (Admin, Plan, Update, Rule::All),
    (Admin, User, Read, Rule::All),
    (Admin, User, Create, Rule::All),
    (Admin, User, Update, Rule::All),
    (Admin, User, Delete, Rule::All),
    (Admin, Dashboard, Read, Rule::All),
    (Admin, Analytics, Read, Rule::All),
    (Manager, Deal, Read, Rule::Own),
    (Manager, Deal, Create, Rule::Own),
    (Manager, Deal, Update, Rule::Own),
    (Manager, Return, Create, Rule::Own),
    (Manager, Plan, Read, Rule::Own),
    (Manager, User, Read, Rule::Own),
    (Manager, Dashboard, Read, Rule::Own),
    (Financist, Deal, Read, Rule::All),
    (Financist, Return, Read, Rule::All),
    (Financist, Plan, Read, Rule::All),
    (Financist, User, Read, Rule::Own),
    (Financist, Dashboard, Read, Rule::All),
    (Financist, Analytics, Read, Rule::All),
];

/// Looks up the rule for a role, resource and operation.
pub fn rule_for(role: Role, resource: Resource, operation: Operation) -> Rule {
    POLICY
        .iter()
        .find(|(r, res, op, _)| *r == role && *res == resource && *op == operation)
        .map(|(_, _, _, rule)| *rule)
        .unwrap_or(Rule::Deny)
}

/// Decides whether the caller may perform the operation and on which rows.
pub fn authorize(identity: &Identity, resource: Resource, operation: Operation) -> Result<Scope> {
    match rule_for(identity.role, resource, operation) {
        Rule::All => Ok(Scope::All),
        Rule::Own => Ok(Scope::Owner(identity.user_id)),
        Rule::Deny => {
            warn!(
                user_id = %identity.user_id,
                role = ?identity.role,
                ?resource,
                ?operation,
                "Access denied by policy"
            );
            Err(AccessError::Forbidden)
        }
    }
}
