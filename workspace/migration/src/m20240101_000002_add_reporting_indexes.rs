use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_tables::{Deals, Plans, Returns};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Manager scoping and date windows drive almost every report query
        manager
            .create_index(
                Index::create()
                    .name("idx_deals_manager_id")
                    .table(Deals::Table)
                    .col(Deals::ManagerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_deals_created_at")
                    .table(Deals::Table)
                    .col(Deals::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_returns_deal_id")
                    .table(Returns::Table)
                    .col(Returns::DealId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_returns_return_date")
                    .table(Returns::Table)
                    .col(Returns::ReturnDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_plans_period")
                    .table(Plans::Table)
                    .col(Plans::Year)
                    .col(Plans::Month)
                    .col(Plans::ManagerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_plans_period",
            "idx_returns_return_date",
            "idx_returns_deal_id",
            "idx_deals_created_at",
            "idx_deals_manager_id",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        Ok(())
    }
}
