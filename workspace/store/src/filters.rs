//! Typed filters translated into SeaORM conditions.
//!
//! Every constraint is ANDed. Callers build the filter (including any
//! ownership constraint) and the store only translates it.

use chrono::{DateTime, Utc};
use model::entities::{
    deal::{self, DealStatus, Project},
    plan::{self, PlanType},
    sales_return::{self, ReturnStatus},
    user,
};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{ColumnTrait, Condition};
use uuid::Uuid;

/// Text search over deals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DealSearch {
    /// Case-insensitive substring of the client name
    Client(String),
    /// Substring of the phone number
    Phone(String),
    /// Case-insensitive substring of the owning manager's full name
    Manager(String),
}

impl DealSearch {
    fn condition(&self) -> Condition {
        match self {
            Self::Client(term) => Condition::all().add(
                Expr::expr(Func::lower(Expr::col((deal::Entity, deal::Column::ClientName))))
                    .like(substring(&term.to_lowercase())),
            ),
            Self::Phone(term) => Condition::all()
                .add(Expr::col((deal::Entity, deal::Column::Phone)).like(substring(term))),
            Self::Manager(term) => Condition::all().add(
                Expr::expr(Func::lower(Expr::col((user::Entity, user::Column::FullName))))
                    .like(substring(&term.to_lowercase())),
            ),
        }
    }
}

const LIKE_ESCAPE: char = '!';

/// `%term%` with the term's own wildcards matched literally.
fn substring(term: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_') || c == LIKE_ESCAPE {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape(LIKE_ESCAPE)
}

/// Constraints on deals. Queries using it always join the owning manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealFilter {
    pub manager_id: Option<Uuid>,
    pub project: Option<Project>,
    pub statuses: Option<Vec<DealStatus>>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub search: Option<DealSearch>,
}

impl DealFilter {
    pub fn for_manager(manager_id: Uuid) -> Self {
        Self {
            manager_id: Some(manager_id),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: DealStatus) -> Self {
        self.statuses = Some(vec![status]);
        self
    }

    pub fn created_between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.created_from = Some(from);
        self.created_to = Some(to);
        self
    }

    pub(crate) fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        if let Some(manager_id) = self.manager_id {
            condition = condition.add(deal::Column::ManagerId.eq(manager_id));
        }
        if let Some(project) = self.project {
            condition = condition.add(deal::Column::Project.eq(project));
        }
        if let Some(statuses) = &self.statuses {
            condition = condition.add(deal::Column::Status.is_in(statuses.iter().copied()));
        }
        if let Some(from) = self.created_from {
            condition = condition.add(deal::Column::CreatedAt.gte(from));
        }
        if let Some(to) = self.created_to {
            condition = condition.add(deal::Column::CreatedAt.lte(to));
        }
        if let Some(search) = &self.search {
            condition = condition.add(search.condition());
        }

        condition
    }
}

/// Constraints on returns, optionally narrowed by the deal they belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnFilter {
    pub statuses: Option<Vec<ReturnStatus>>,
    pub deal_id: Option<Uuid>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub deal: DealFilter,
}

impl ReturnFilter {
    pub fn completed() -> Self {
        Self {
            statuses: Some(vec![ReturnStatus::Completed]),
            ..Default::default()
        }
    }

    pub fn with_deal(mut self, deal: DealFilter) -> Self {
        self.deal = deal;
        self
    }

    pub(crate) fn condition(&self) -> Condition {
        let mut condition = Condition::all().add(self.deal.condition());

        if let Some(statuses) = &self.statuses {
            condition =
                condition.add(sales_return::Column::Status.is_in(statuses.iter().copied()));
        }
        if let Some(deal_id) = self.deal_id {
            condition = condition.add(sales_return::Column::DealId.eq(deal_id));
        }
        if let Some(from) = self.date_from {
            condition = condition.add(sales_return::Column::ReturnDate.gte(from));
        }
        if let Some(to) = self.date_to {
            condition = condition.add(sales_return::Column::ReturnDate.lte(to));
        }

        condition
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanFilter {
    pub manager_id: Option<Uuid>,
    pub project: Option<Project>,
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub plan_type: Option<PlanType>,
    pub is_active: Option<bool>,
}

impl PlanFilter {
    /// Active plans of one calendar month.
    pub fn active_in_month(year: i32, month: u32) -> Self {
        Self {
            year: Some(year),
            month: i32::try_from(month).ok(),
            is_active: Some(true),
            ..Default::default()
        }
    }

    pub(crate) fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        if let Some(manager_id) = self.manager_id {
            condition = condition.add(plan::Column::ManagerId.eq(manager_id));
        }
        if let Some(project) = self.project {
            condition = condition.add(plan::Column::Project.eq(project));
        }
        if let Some(year) = self.year {
            condition = condition.add(plan::Column::Year.eq(year));
        }
        if let Some(month) = self.month {
            condition = condition.add(plan::Column::Month.eq(month));
        }
        if let Some(plan_type) = self.plan_type {
            condition = condition.add(plan::Column::PlanType.eq(plan_type));
        }
        if let Some(is_active) = self.is_active {
            condition = condition.add(plan::Column::IsActive.eq(is_active));
        }

        condition
    }
}

/// A validated page request: `page >= 1`, `limit >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
}

impl PageWindow {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Saturates instead of overflowing on absurd pages.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_offset() {
        assert_eq!(PageWindow::new(1, 10).offset(), 0);
        assert_eq!(PageWindow::new(3, 25).offset(), 50);
        // Out-of-range values are clamped rather than underflowing
        assert_eq!(PageWindow::new(0, 0).offset(), 0);
        assert_eq!(PageWindow::new(u64::MAX, 100).offset(), u64::MAX);
    }
}
