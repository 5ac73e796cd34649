use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(uuid(Users::Id).primary_key())
                    .col(string(Users::Username).unique_key())
                    .col(string(Users::PasswordHash))
                    .col(string(Users::FullName))
                    .col(string_null(Users::Email))
                    .col(string_len(Users::Role, 20))
                    .col(string_len_null(Users::Project, 20))
                    .col(boolean(Users::IsActive).default(true))
                    .col(timestamp_with_time_zone(Users::CreatedAt))
                    .col(timestamp_with_time_zone(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Create deals table
        manager
            .create_table(
                Table::create()
                    .table(Deals::Table)
                    .if_not_exists()
                    .col(uuid(Deals::Id).primary_key())
                    .col(string(Deals::ClientName))
                    .col(string(Deals::Phone))
                    .col(string_null(Deals::Email))
                    .col(string_len(Deals::Project, 20))
                    .col(string(Deals::Program))
                    .col(uuid(Deals::ManagerId))
                    .col(string_len(Deals::Status, 20))
                    .col(decimal_len(Deals::Amount, 12, 2))
                    .col(decimal_len(Deals::PaidAmount, 12, 2).default(0))
                    .col(decimal_len(Deals::RemainingAmount, 12, 2))
                    .col(string_null(Deals::Source))
                    .col(string_null(Deals::MarketingChannel))
                    .col(string_null(Deals::PaymentMethod))
                    .col(string_len_null(Deals::Gender, 10))
                    .col(string_null(Deals::ClientSegment))
                    .col(text_null(Deals::Comments))
                    .col(string_null(Deals::BankOrderNumber))
                    .col(timestamp_with_time_zone(Deals::CreatedAt))
                    .col(timestamp_with_time_zone(Deals::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deal_manager")
                            .from(Deals::Table, Deals::ManagerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create returns table
        manager
            .create_table(
                Table::create()
                    .table(Returns::Table)
                    .if_not_exists()
                    .col(uuid(Returns::Id).primary_key())
                    .col(uuid(Returns::DealId))
                    .col(timestamp_with_time_zone(Returns::ReturnDate))
                    .col(decimal_len(Returns::ReturnAmount, 12, 2))
                    .col(text(Returns::ReturnReason))
                    .col(string_len(Returns::Status, 20))
                    .col(uuid_null(Returns::ProcessedBy))
                    .col(timestamp_with_time_zone(Returns::CreatedAt))
                    .col(timestamp_with_time_zone(Returns::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_return_deal")
                            .from(Returns::Table, Returns::DealId)
                            .to(Deals::Table, Deals::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_return_processor")
                            .from(Returns::Table, Returns::ProcessedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create plans table
        manager
            .create_table(
                Table::create()
                    .table(Plans::Table)
                    .if_not_exists()
                    .col(uuid(Plans::Id).primary_key())
                    .col(string_len(Plans::Project, 20))
                    .col(uuid(Plans::ManagerId))
                    .col(string_len(Plans::PlanType, 20))
                    .col(integer(Plans::Year))
                    .col(integer(Plans::Month))
                    .col(decimal_len(Plans::PlannedAmount, 12, 2))
                    .col(integer(Plans::PlannedDeals).default(0))
                    .col(boolean(Plans::IsActive).default(true))
                    .col(timestamp_with_time_zone(Plans::CreatedAt))
                    .col(timestamp_with_time_zone(Plans::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_plan_manager")
                            .from(Plans::Table, Plans::ManagerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(Plans::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Returns::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Deals::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
    Username,
    PasswordHash,
    FullName,
    Email,
    Role,
    Project,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Deals {
    Table,
    Id,
    ClientName,
    Phone,
    Email,
    Project,
    Program,
    ManagerId,
    Status,
    Amount,
    PaidAmount,
    RemainingAmount,
    Source,
    MarketingChannel,
    PaymentMethod,
    Gender,
    ClientSegment,
    Comments,
    BankOrderNumber,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Returns {
    Table,
    Id,
    DealId,
    ReturnDate,
    ReturnAmount,
    ReturnReason,
    Status,
    ProcessedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Plans {
    Table,
    Id,
    Project,
    ManagerId,
    PlanType,
    Year,
    Month,
    PlannedAmount,
    PlannedDeals,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
