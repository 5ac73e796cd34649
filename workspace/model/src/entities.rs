//! Root for all SeaORM entity modules of the sales dashboard:
//! users, deals, returns and half-month sales plans.

pub mod deal;
pub mod plan;
pub mod sales_return;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::deal::Entity as Deal;
    pub use super::plan::Entity as Plan;
    pub use super::sales_return::Entity as SalesReturn;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, ModelTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    fn manager(username: &str, project: deal::Project) -> user::ActiveModel {
        user::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set("not-a-real-hash".to_string()),
            full_name: Set(format!("{username} Full")),
            email: Set(None),
            role: Set(user::Role::Manager),
            project: Set(Some(project)),
            is_active: Set(true),
            ..Default::default()
        }
    }

    fn deal_for(manager_id: uuid::Uuid, amount: Decimal, paid: Decimal) -> deal::ActiveModel {
        deal::ActiveModel {
            client_name: Set("Acme".to_string()),
            phone: Set("+10000000".to_string()),
            email: Set(None),
            project: Set(deal::Project::Amazon),
            program: Set("Amazon PRO".to_string()),
            manager_id: Set(manager_id),
            status: Set(deal::DealStatus::New),
            amount: Set(amount),
            paid_amount: Set(paid),
            remaining_amount: Set(amount - paid),
            source: Set(None),
            marketing_channel: Set(None),
            payment_method: Set(None),
            gender: Set(None),
            client_segment: Set(None),
            comments: Set(None),
            bank_order_number: Set(None),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let alice = manager("alice", deal::Project::Amazon).insert(&db).await?;
        let bob = manager("bob", deal::Project::Shopify).insert(&db).await?;
        assert_ne!(alice.id, bob.id);

        let first = deal_for(alice.id, Decimal::new(100000, 2), Decimal::new(40000, 2))
            .insert(&db)
            .await?;
        let second = deal_for(bob.id, Decimal::new(50000, 2), Decimal::ZERO)
            .insert(&db)
            .await?;

        let ret = sales_return::ActiveModel {
            deal_id: Set(first.id),
            return_date: Set(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
            return_amount: Set(Decimal::new(10000, 2)),
            return_reason: Set("Damaged".to_string()),
            status: Set(sales_return::ReturnStatus::Requested),
            processed_by: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let plan = plan::ActiveModel {
            project: Set(deal::Project::Amazon),
            manager_id: Set(alice.id),
            plan_type: Set(plan::PlanType::FirstHalf),
            year: Set(2024),
            month: Set(3),
            planned_amount: Set(Decimal::new(500000, 2)),
            planned_deals: Set(10),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Read back and verify data
        let users = User::find().all(&db).await?;
        assert_eq!(users.len(), 2);
        assert!(users.iter().any(|u| u.username == "alice"));

        let deals = Deal::find().all(&db).await?;
        assert_eq!(deals.len(), 2);
        let stored = Deal::find_by_id(first.id).one(&db).await?.unwrap();
        assert_eq!(stored.remaining_amount, Decimal::new(60000, 2));
        assert_eq!(stored.status, deal::DealStatus::New);

        // Relations
        let alice_deals = alice.find_related(Deal).all(&db).await?;
        assert_eq!(alice_deals.len(), 1);
        assert_eq!(alice_deals[0].id, first.id);

        let first_returns = first.find_related(SalesReturn).all(&db).await?;
        assert_eq!(first_returns.len(), 1);
        assert_eq!(first_returns[0].id, ret.id);

        let plans = Plan::find()
            .filter(plan::Column::ManagerId.eq(alice.id))
            .all(&db)
            .await?;
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].id, plan.id);
        assert!(second.find_related(SalesReturn).all(&db).await?.is_empty());

        // Deleting a deal cascades to its returns
        Deal::delete_by_id(first.id).exec(&db).await?;
        assert!(SalesReturn::find_by_id(ret.id).one(&db).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_return_requires_existing_deal() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let orphan = sales_return::ActiveModel {
            deal_id: Set(uuid::Uuid::new_v4()),
            return_date: Set(Utc::now()),
            return_amount: Set(Decimal::ONE),
            return_reason: Set("No deal".to_string()),
            status: Set(sales_return::ReturnStatus::Requested),
            processed_by: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await;
        assert!(orphan.is_err());

        Ok(())
    }

    #[test]
    fn test_enum_wire_values() {
        assert_eq!(
            deal::DealStatus::parse("in_progress"),
            Some(deal::DealStatus::InProgress)
        );
        assert_eq!(deal::DealStatus::parse("unknown"), None);
        assert_eq!(user::Role::parse("financist"), Some(user::Role::Financist));
        assert_eq!(deal::Project::parse("shopify"), Some(deal::Project::Shopify));
        assert!(sales_return::ReturnStatus::Rejected.is_terminal());
        assert!(!sales_return::ReturnStatus::Processing.is_terminal());
        assert!(deal::DealStatus::Partial.is_active());
        assert!(!deal::DealStatus::Frozen.is_active());
    }
}
