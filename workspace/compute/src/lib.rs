//! The access-scoped query and analytics layer.
//!
//! Every entry point takes the caller's [`Identity`] explicitly, asks the
//! policy table what the caller may do and on which rows, parses the raw
//! request into typed filters, and only then talks to the [`store::Store`].

pub mod analytics;
pub mod convert;
pub mod deals;
pub mod error;
pub mod identity;
pub mod plans;
pub mod policy;
pub mod returns;
pub mod users;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{AccessError, Result};
pub use identity::Identity;
pub use policy::{Operation, Resource, Scope, authorize};
