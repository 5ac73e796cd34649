use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, Iterable};

use super::{sales_return, user};

/// The storefront a deal (or a manager) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Project {
    #[sea_orm(string_value = "amazon")]
    Amazon,
    #[sea_orm(string_value = "shopify")]
    Shopify,
}

impl Project {
    pub fn parse(value: &str) -> Option<Self> {
        Self::iter().find(|project| project.to_value() == value)
    }
}

/// Where a deal is in the sales pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum DealStatus {
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "prepayment")]
    Prepayment,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "frozen")]
    Frozen,
}

impl DealStatus {
    pub fn parse(value: &str) -> Option<Self> {
        Self::iter().find(|status| status.to_value() == value)
    }

    /// Deals still being worked on.
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            Self::New | Self::InProgress | Self::Prepayment | Self::Partial
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Gender {
    #[sea_orm(string_value = "male")]
    Male,
    #[sea_orm(string_value = "female")]
    Female,
}

impl Gender {
    pub fn parse(value: &str) -> Option<Self> {
        Self::iter().find(|gender| gender.to_value() == value)
    }
}

/// A sales transaction tracked from lead to completion.
///
/// `remaining_amount` is derived: it always equals `amount - paid_amount`
/// and is written by the store whenever either side changes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "deals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub project: Project,
    /// Free text, conventionally scoped to the project (e.g. "Amazon PRO").
    pub program: String,
    pub manager_id: Uuid,
    pub status: DealStatus,
    /// Total deal value.
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    /// Cumulative payments received.
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub paid_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub remaining_amount: Decimal,
    /// Lead source.
    pub source: Option<String>,
    pub marketing_channel: Option<String>,
    pub payment_method: Option<String>,
    pub gender: Option<Gender>,
    pub client_segment: Option<String>,
    pub comments: Option<String>,
    pub bank_order_number: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The manager owning the deal.
    #[sea_orm(
        belongs_to = "user::Entity",
        from = "Column::ManagerId",
        to = "user::Column::Id"
    )]
    Manager,
    #[sea_orm(has_many = "sales_return::Entity")]
    Return,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Manager.def()
    }
}

impl Related<sales_return::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Return.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = chrono::Utc::now();
        if insert {
            if self.id.is_not_set() {
                self.id = Set(uuid::Uuid::new_v4());
            }
            if self.created_at.is_not_set() {
                self.created_at = Set(now);
            }
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}
