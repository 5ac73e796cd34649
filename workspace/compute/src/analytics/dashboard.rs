use chrono::{DateTime, Utc};
use common::{AnalyticsQuery, DashboardMetrics, format_money};
use model::entities::deal::DealStatus;
use rust_decimal::Decimal;
use store::{DealFilter, PlanFilter, ReturnFilter, Store, money::normalize};
use tracing::{debug, instrument};

use super::plan_completion::current_completion;
use super::{count_status, mean, paid, rate};
use crate::error::Result;
use crate::identity::Identity;
use crate::policy::{Operation, Resource, authorize};
use crate::validation::{DayBound, FieldErrors, parse_date_bound, parse_project_filter};

/// Headline numbers over the deals the caller can see.
#[instrument(skip(store))]
pub async fn dashboard_metrics(
    store: &Store,
    identity: &Identity,
    query: &AnalyticsQuery,
    now: DateTime<Utc>,
) -> Result<DashboardMetrics> {
    let scope = authorize(identity, Resource::Dashboard, Operation::Read)?;

    let mut errors = FieldErrors::new();
    let project = errors
        .check_opt(query.project.as_deref(), |v| parse_project_filter("project", v))
        .flatten();
    let filter = DealFilter {
        manager_id: scope.owner(),
        project,
        created_from: errors.check_opt(query.date_from.as_deref(), |v| {
            parse_date_bound("dateFrom", v, DayBound::Start)
        }),
        created_to: errors.check_opt(query.date_to.as_deref(), |v| {
            parse_date_bound("dateTo", v, DayBound::End)
        }),
        ..Default::default()
    };
    errors.finish()?;

    let deals = store.find_deals(&filter).await?;
    let deals: Vec<_> = deals.iter().collect();
    let returns = store
        .find_returns(&ReturnFilter::completed().with_deal(filter))
        .await?;

    let total_deals = deals.len() as u64;
    let total_sales = paid(&deals);
    let completed_deals = count_status(&deals, DealStatus::Completed);
    let total_returns: Decimal = returns
        .iter()
        .map(|(ret, _)| normalize(ret.return_amount))
        .sum();

    let plan_completion = current_completion(
        store,
        PlanFilter {
            manager_id: scope.owner(),
            project,
            ..Default::default()
        },
        now,
    )
    .await?;

    debug!(total_deals, %total_sales, %total_returns, "Computed dashboard metrics");
    Ok(DashboardMetrics {
        total_sales: format_money(total_sales),
        total_deals,
        average_deal: format_money(mean(total_sales, total_deals)),
        completed_deals,
        total_returns: format_money(total_returns),
        returns_count: returns.len() as u64,
        net_revenue: format_money(total_sales - total_returns),
        conversion_rate: rate(completed_deals, total_deals),
        plan_completion,
    })
}
