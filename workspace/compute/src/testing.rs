//! Fixtures shared by the access-layer tests.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use migration::{Migrator, MigratorTrait};
use model::entities::{
    deal::{self, DealStatus, Project},
    sales_return::{self, ReturnStatus},
    user::{self, Role},
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Unchanged, Database, Set};
use store::{DealWithManager, NewDeal, NewReturn, NewUser, ReturnWithDeal, Store};
use uuid::Uuid;

use crate::identity::Identity;

/// Fresh in-memory store with all migrations applied.
pub async fn setup_store() -> Store {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    Store::new(db)
}

/// Initialize tracing for tests
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("compute=debug")
        .with_test_writer()
        .try_init();
}

pub fn dec(text: &str) -> Decimal {
    Decimal::from_str(text).expect("valid decimal literal")
}

pub async fn create_user(
    store: &Store,
    username: &str,
    role: Role,
    project: Option<Project>,
) -> user::Model {
    store
        .create_user(NewUser {
            username: username.to_string(),
            password: "password123".to_string(),
            full_name: format!("{username} user"),
            email: None,
            role,
            project,
        })
        .await
        .expect("Failed to create user")
}

pub fn identity_of(user: &user::Model) -> Identity {
    Identity::new(user.id, user.role)
}

pub struct DealSpec<'a> {
    pub project: Project,
    pub status: DealStatus,
    pub amount: &'a str,
    pub paid: &'a str,
}

impl Default for DealSpec<'_> {
    fn default() -> Self {
        Self {
            project: Project::Amazon,
            status: DealStatus::New,
            amount: "1000.00",
            paid: "0",
        }
    }
}

pub async fn create_deal(store: &Store, manager_id: Uuid, spec: DealSpec<'_>) -> DealWithManager {
    store
        .create_deal(NewDeal {
            client_name: "Acme Corp".to_string(),
            phone: "+1 555 0100".to_string(),
            email: None,
            project: spec.project,
            program: "Starter".to_string(),
            manager_id,
            status: spec.status,
            amount: dec(spec.amount),
            paid_amount: Some(dec(spec.paid)),
            source: None,
            marketing_channel: None,
            payment_method: None,
            gender: None,
            client_segment: None,
            comments: None,
            bank_order_number: None,
        })
        .await
        .expect("Failed to create deal")
}

pub async fn create_return(
    store: &Store,
    deal_id: Uuid,
    amount: &str,
    status: ReturnStatus,
    return_date: DateTime<Utc>,
) -> ReturnWithDeal {
    store
        .create_return(NewReturn {
            deal_id,
            return_date,
            return_amount: dec(amount),
            return_reason: "Changed mind".to_string(),
            status,
            processed_by: None,
        })
        .await
        .expect("Failed to create return")
}

/// Moves a deal's creation time, for date-window tests.
pub async fn backdate_deal(store: &Store, id: Uuid, created_at: DateTime<Utc>) {
    deal::ActiveModel {
        id: Unchanged(id),
        created_at: Set(created_at),
        ..Default::default()
    }
    .update(store.db())
    .await
    .expect("Failed to backdate deal");
}

/// Moves a return's date, for date-window tests.
pub async fn backdate_return(store: &Store, id: Uuid, return_date: DateTime<Utc>) {
    sales_return::ActiveModel {
        id: Unchanged(id),
        return_date: Set(return_date),
        ..Default::default()
    }
    .update(store.db())
    .await
    .expect("Failed to backdate return");
}
