use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, Iterable};

use super::deal::Project;
use super::user;

/// Which half of the month a plan covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PlanType {
    /// Days 1 to 15.
    #[sea_orm(string_value = "first_half")]
    FirstHalf,
    /// Day 16 to the end of the month.
    #[sea_orm(string_value = "second_half")]
    SecondHalf,
}

impl PlanType {
    pub fn parse(value: &str) -> Option<Self> {
        Self::iter().find(|plan_type| plan_type.to_value() == value)
    }

    /// First and last calendar day covered in the given month, or `None`
    /// when the year/month pair is not a real month.
    pub fn date_range(self, year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let last = first
            .checked_add_months(chrono::Months::new(1))?
            .pred_opt()?;
        match self {
            Self::FirstHalf => Some((first, NaiveDate::from_ymd_opt(year, month, 15)?)),
            Self::SecondHalf => Some((NaiveDate::from_ymd_opt(year, month, 16)?, last)),
        }
    }
}

/// A manager's sales quota for one half-month period.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "plans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project: Project,
    pub manager_id: Uuid,
    pub plan_type: PlanType,
    pub year: i32,
    pub month: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub planned_amount: Decimal,
    /// Target number of completed deals.
    pub planned_deals: i32,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Calendar window the plan applies to.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let month = u32::try_from(self.month).ok()?;
        self.plan_type.date_range(self.year, month)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "user::Entity",
        from = "Column::ManagerId",
        to = "user::Column::Id"
    )]
    Manager,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Manager.def()
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_month_ranges() {
        let (start, end) = PlanType::FirstHalf.date_range(2024, 2).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());

        // Leap year February ends on the 29th
        let (start, end) = PlanType::SecondHalf.date_range(2024, 2).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 16).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, end) = PlanType::SecondHalf.date_range(2023, 12).unwrap();
        assert_eq!(end, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_invalid_month_has_no_range() {
        assert!(PlanType::FirstHalf.date_range(2024, 13).is_none());
        assert!(PlanType::SecondHalf.date_range(2024, 0).is_none());
    }
}
