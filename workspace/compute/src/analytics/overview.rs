use chrono::{DateTime, Duration, Utc};
use common::{AnalyticsOverview, AnalyticsQuery, format_money};
use model::entities::deal::{self, DealStatus, Project};
use rust_decimal::Decimal;
use store::{DealFilter, PlanFilter, ReturnFilter, Store, money::normalize};
use tracing::{debug, instrument};

use super::plan_completion::current_completion;
use super::{Period, amount, count_status, percent, rate};
use crate::error::Result;
use crate::identity::Identity;
use crate::policy::{Operation, Resource, authorize};
use crate::validation::{FieldErrors, parse_enum, parse_project_filter};

async fn completed_gross(
    store: &Store,
    project: Option<Project>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Decimal> {
    let filter = DealFilter {
        project,
        ..Default::default()
    }
    .with_status(DealStatus::Completed)
    .created_between(from, to);
    let deals = store.find_deals(&filter).await?;
    Ok(amount(&deals.iter().collect::<Vec<_>>()))
}

/// Headline figures for a window ending now, with growth measured against
/// the window of the same length just before it.
#[instrument(skip(store))]
pub async fn analytics_overview(
    store: &Store,
    identity: &Identity,
    query: &AnalyticsQuery,
    now: DateTime<Utc>,
) -> Result<AnalyticsOverview> {
    authorize(identity, Resource::Analytics, Operation::Read)?;

    let mut errors = FieldErrors::new();
    let period = errors
        .check_opt(query.period.as_deref(), |v| {
            parse_enum("period", v, Period::parse, "week, month, quarter, year")
        })
        .unwrap_or(Period::Month);
    let project = errors
        .check_opt(query.project.as_deref(), |v| parse_project_filter("project", v))
        .flatten();
    errors.finish()?;

    let length = Duration::days(period.days());
    let date_from = now - length;
    let filter = DealFilter {
        project,
        ..Default::default()
    }
    .created_between(date_from, now);

    let deals = store.find_deals(&filter).await?;
    let deals: Vec<&deal::Model> = deals.iter().collect();
    let completed: Vec<&deal::Model> = deals
        .iter()
        .copied()
        .filter(|d| d.status == DealStatus::Completed)
        .collect();
    let gross_revenue = amount(&completed);

    let returns = store
        .find_returns(&ReturnFilter {
            date_from: Some(date_from),
            date_to: Some(now),
            deal: DealFilter {
                project,
                ..Default::default()
            },
            ..ReturnFilter::completed()
        })
        .await?;
    let total_returns: Decimal = returns
        .iter()
        .map(|(ret, _)| normalize(ret.return_amount))
        .sum();

    let previous_to = date_from - Duration::nanoseconds(1);
    let previous_gross = completed_gross(store, project, previous_to - length, previous_to).await?;

    let total_deals = deals.len() as u64;
    let active_deals = deals.iter().filter(|d| d.status.is_active()).count() as u64;
    let plan_completion = current_completion(
        store,
        PlanFilter {
            project,
            ..Default::default()
        },
        now,
    )
    .await?;

    debug!(%gross_revenue, %previous_gross, total_deals, "Computed analytics overview");
    Ok(AnalyticsOverview {
        period: period.as_str().to_string(),
        date_from,
        date_to: now,
        gross_revenue: format_money(gross_revenue),
        total_returns: format_money(total_returns),
        net_revenue: format_money(gross_revenue - total_returns),
        active_deals,
        total_deals,
        conversion_rate: rate(count_status(&deals, DealStatus::Completed), total_deals),
        plan_completion,
        revenue_growth: percent(gross_revenue - previous_gross, previous_gross),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        DealSpec, backdate_deal, create_deal, create_return, create_user, identity_of,
        setup_store,
    };
    use model::entities::{sales_return::ReturnStatus, user::Role};

    #[tokio::test]
    async fn test_growth_against_previous_window() {
        let store = setup_store().await;
        let admin = create_user(&store, "admin", Role::Admin, None).await;
        let manager = create_user(&store, "m1", Role::Manager, Some(Project::Amazon)).await;
        let now = Utc::now();

        let earlier = create_deal(
            &store,
            manager.id,
            DealSpec {
                status: DealStatus::Completed,
                amount: "400",
                paid: "400",
                ..Default::default()
            },
        )
        .await;
        backdate_deal(&store, earlier.deal.id, now - Duration::days(10)).await;

        let current = create_deal(
            &store,
            manager.id,
            DealSpec {
                status: DealStatus::Completed,
                amount: "600",
                paid: "600",
                ..Default::default()
            },
        )
        .await;
        create_deal(
            &store,
            manager.id,
            DealSpec {
                status: DealStatus::InProgress,
                ..Default::default()
            },
        )
        .await;
        create_return(&store, current.deal.id, "100", ReturnStatus::Completed, now).await;

        let overview = analytics_overview(
            &store,
            &identity_of(&admin),
            &AnalyticsQuery {
                period: Some("week".to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(overview.period, "week");
        assert_eq!(overview.gross_revenue, "600.00");
        assert_eq!(overview.total_returns, "100.00");
        assert_eq!(overview.net_revenue, "500.00");
        assert_eq!(overview.total_deals, 2);
        assert_eq!(overview.active_deals, 1);
        assert_eq!(overview.conversion_rate, 50);
        assert_eq!(overview.revenue_growth, 50);
    }

    #[tokio::test]
    async fn test_empty_overview_and_bad_period() {
        let store = setup_store().await;
        let fin = create_user(&store, "fin", Role::Financist, None).await;

        let overview = analytics_overview(&store, &identity_of(&fin), &AnalyticsQuery::default(), Utc::now())
            .await
            .unwrap();
        assert_eq!(overview.period, "month");
        assert_eq!(overview.gross_revenue, "0.00");
        assert_eq!(overview.revenue_growth, 0);
        assert_eq!(overview.conversion_rate, 0);

        let bad = analytics_overview(
            &store,
            &identity_of(&fin),
            &AnalyticsQuery {
                period: Some("decade".to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
        .await;
        assert!(bad.is_err());
    }
}
