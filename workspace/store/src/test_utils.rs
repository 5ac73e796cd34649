use std::str::FromStr;

use chrono::{DateTime, Utc};
use migration::{Migrator, MigratorTrait};
use model::entities::{
    deal::{self, DealStatus, Project},
    user::{self, Role},
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Unchanged, Database, Set};
use uuid::Uuid;

use crate::{NewDeal, NewUser, Store};

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

pub fn dec(text: &str) -> Decimal {
    Decimal::from_str(text).expect("valid decimal literal")
}

pub fn new_manager(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        password: "password123".to_string(),
        full_name: format!("{username} manager"),
        email: None,
        role: Role::Manager,
        project: Some(Project::Amazon),
    }
}

pub async fn create_manager(store: &Store, username: &str) -> user::Model {
    store
        .create_user(new_manager(username))
        .await
        .expect("Failed to create manager")
}

pub fn new_deal(manager_id: Uuid, amount: &str, paid: Option<&str>) -> NewDeal {
    NewDeal {
        client_name: "Acme Corp".to_string(),
        phone: "+1 555 0100".to_string(),
        email: None,
        project: Project::Amazon,
        program: "Amazon PRO".to_string(),
        manager_id,
        status: DealStatus::New,
        amount: dec(amount),
        paid_amount: paid.map(dec),
        source: None,
        marketing_channel: None,
        payment_method: None,
        gender: None,
        client_segment: None,
        comments: None,
        bank_order_number: None,
    }
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
