//! Actual sales measured against the half-month plans.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use model::entities::{deal::DealStatus, plan};
use rust_decimal::Decimal;
use store::{DealFilter, PlanFilter, Store, money::normalize};
use tracing::{debug, instrument};

use super::{count_status, paid, percent};
use crate::error::Result;
use crate::validation::{end_of_day, start_of_day};

/// What a manager actually achieved inside a plan's window.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanActual {
    pub period: Option<(NaiveDate, NaiveDate)>,
    /// Sum of paid amounts
    pub amount: Decimal,
    pub completed_deals: u64,
}

/// Deals of the plan's manager in the plan's project, created inside the
/// plan's half-month.
#[instrument(skip(store, plan), fields(plan_id = %plan.id))]
pub async fn plan_actual(store: &Store, plan: &plan::Model) -> Result<PlanActual> {
    let Some((start, end)) = plan.date_range() else {
        return Ok(PlanActual {
            period: None,
            amount: Decimal::ZERO,
            completed_deals: 0,
        });
    };

    let filter = DealFilter {
        project: Some(plan.project),
        ..DealFilter::for_manager(plan.manager_id)
    }
    .created_between(start_of_day(start), end_of_day(end));
    let deals = store.find_deals(&filter).await?;
    let deals: Vec<_> = deals.iter().collect();

    Ok(PlanActual {
        period: Some((start, end)),
        amount: paid(&deals),
        completed_deals: count_status(&deals, DealStatus::Completed),
    })
}

/// Σ actual / Σ planned over the active plans of `now`'s month that match
/// the filter, as a rounded percentage. Zero when no plan applies.
#[instrument(skip(store))]
pub async fn current_completion(
    store: &Store,
    mut filter: PlanFilter,
    now: DateTime<Utc>,
) -> Result<i64> {
    let month = PlanFilter::active_in_month(now.year(), now.month());
    filter.year = month.year;
    filter.month = month.month;
    filter.is_active = Some(true);

    let plans = store.list_plans(&filter).await?;
    let mut planned = Decimal::ZERO;
    let mut actual = Decimal::ZERO;
    for row in &plans {
        planned += normalize(row.plan.planned_amount);
        actual += plan_actual(store, &row.plan).await?.amount;
    }

    debug!(plans = plans.len(), %planned, %actual, "Computed plan completion");
    Ok(percent(actual, planned))
}
