//! Persistence for users, deals, returns and plans.
//!
//! The [`Store`] owns the pooled database connection and is the only place
//! that writes rows. It keeps `remaining_amount` consistent with `amount`
//! and `paid_amount` on every deal mutation; everything about who may see
//! or change what lives one layer up.

pub mod deals;
pub mod error;
pub mod filters;
pub mod money;
pub mod password;
pub mod plans;
pub mod returns;
pub mod users;

#[cfg(test)]
pub(crate) mod test_utils;

use sea_orm::DatabaseConnection;

pub use deals::{DealChanges, DealWithManager, NewDeal};
pub use error::{Result, StoreError};
pub use filters::{DealFilter, DealSearch, PageWindow, PlanFilter, ReturnFilter};
pub use plans::{NewPlan, PlanChanges, PlanWithManager};
pub use returns::{NewReturn, ReturnChanges, ReturnWithDeal};
pub use users::{NewUser, UserChanges};

/// Entity store backed by a SeaORM connection pool.
#[derive(Debug, Clone)]
pub struct Store {
    db: DatabaseConnection,
}

impl Store {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection, for callers that run their own queries.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
