//! Per-day series. Every day of the window appears, empty days as zeros.

use chrono::{DateTime, Utc};
use common::{
    AnalyticsQuery, ReturnsAnalysisPoint, RevenueTrendPoint, SalesChartPoint, format_money,
};
use model::entities::deal::DealStatus;
use rust_decimal::Decimal;
use store::{DealFilter, ReturnFilter, Store, money::normalize};
use tracing::{debug, instrument};

use super::{MAX_DAYS, day_buckets, day_range, window_days};
use crate::error::Result;
use crate::identity::Identity;
use crate::policy::{Operation, Resource, authorize};
use crate::validation::{FieldErrors, parse_int_in, parse_project_filter, start_of_day};

const SALES_CHART_DAYS: i64 = 30;
const TREND_DAYS: i64 = 30;

/// Paid revenue and deal count per day of deal creation.
#[instrument(skip(store))]
pub async fn sales_chart(
    store: &Store,
    identity: &Identity,
    query: &AnalyticsQuery,
    now: DateTime<Utc>,
) -> Result<Vec<SalesChartPoint>> {
    let scope = authorize(identity, Resource::Dashboard, Operation::Read)?;

    let mut errors = FieldErrors::new();
    let days = errors
        .check_opt(query.days.as_deref(), |v| parse_int_in("days", v, 1, MAX_DAYS))
        .unwrap_or(SALES_CHART_DAYS);
    let project = errors
        .check_opt(query.project.as_deref(), |v| parse_project_filter("project", v))
        .flatten();
    errors.finish()?;

    let range = day_range(now, days);
    let filter = DealFilter {
        manager_id: scope.owner(),
        project,
        created_from: range.first().map(|day| start_of_day(*day)),
        created_to: Some(now),
        ..Default::default()
    };
    let deals = store.find_deals(&filter).await?;

    let mut buckets = day_buckets::<(Decimal, u64)>(&range);
    for deal in &deals {
        if let Some((revenue, count)) = buckets.get_mut(&deal.created_at.date_naive()) {
            *revenue += normalize(deal.paid_amount);
            *count += 1;
        }
    }

    debug!(days, deals = deals.len(), "Computed sales chart");
    Ok(buckets
        .into_iter()
        .map(|(date, (revenue, deals))| SalesChartPoint {
            date,
            revenue: format_money(revenue),
            deals,
        })
        .collect())
}

/// Gross revenue of completed deals per creation day, against the completed
/// returns booked on those same deals.
#[instrument(skip(store))]
pub async fn revenue_trend(
    store: &Store,
    identity: &Identity,
    query: &AnalyticsQuery,
    now: DateTime<Utc>,
) -> Result<Vec<RevenueTrendPoint>> {
    authorize(identity, Resource::Analytics, Operation::Read)?;

    let mut errors = FieldErrors::new();
    let days = window_days(
        &mut errors,
        query.period.as_deref(),
        query.days.as_deref(),
        TREND_DAYS,
    );
    let project = errors
        .check_opt(query.project.as_deref(), |v| parse_project_filter("project", v))
        .flatten();
    errors.finish()?;

    let range = day_range(now, days);
    let filter = DealFilter {
        project,
        created_from: range.first().map(|day| start_of_day(*day)),
        created_to: Some(now),
        ..Default::default()
    }
    .with_status(DealStatus::Completed);
    let deals = store.find_deals(&filter).await?;

    let return_filter = ReturnFilter::completed().with_deal(DealFilter {
        statuses: None,
        ..filter
    });
    let returns = store.find_returns(&return_filter).await?;

    let mut buckets = day_buckets::<(Decimal, Decimal)>(&range);
    for deal in &deals {
        if let Some((gross, _)) = buckets.get_mut(&deal.created_at.date_naive()) {
            *gross += normalize(deal.amount);
        }
    }
    for (ret, deal) in &returns {
        if let Some((_, returned)) = buckets.get_mut(&deal.created_at.date_naive()) {
            *returned += normalize(ret.return_amount);
        }
    }

    debug!(days, deals = deals.len(), returns = returns.len(), "Computed revenue trend");
    Ok(buckets
        .into_iter()
        .map(|(date, (gross, returned))| RevenueTrendPoint {
            date,
            gross_revenue: format_money(gross),
            returns: format_money(returned),
            net_revenue: format_money(gross - returned),
        })
        .collect())
}

/// Returns of every status per day of the return date.
#[instrument(skip(store))]
pub async fn returns_analysis(
    store: &Store,
    identity: &Identity,
    query: &AnalyticsQuery,
    now: DateTime<Utc>,
) -> Result<Vec<ReturnsAnalysisPoint>> {
    authorize(identity, Resource::Analytics, Operation::Read)?;

    let mut errors = FieldErrors::new();
    let days = window_days(
        &mut errors,
        query.period.as_deref(),
        query.days.as_deref(),
        TREND_DAYS,
    );
    let project = errors
        .check_opt(query.project.as_deref(), |v| parse_project_filter("project", v))
        .flatten();
    errors.finish()?;

    let range = day_range(now, days);
    let filter = ReturnFilter {
        date_from: range.first().map(|day| start_of_day(*day)),
        date_to: Some(now),
        deal: DealFilter {
            project,
            ..Default::default()
        },
        ..Default::default()
    };
    let returns = store.find_returns(&filter).await?;

    let mut buckets = day_buckets::<(Decimal, u64)>(&range);
    for (ret, _) in &returns {
        if let Some((total, count)) = buckets.get_mut(&ret.return_date.date_naive()) {
            *total += normalize(ret.return_amount);
            *count += 1;
        }
    }

    Ok(buckets
        .into_iter()
        .map(|(date, (total, count))| ReturnsAnalysisPoint {
            date,
            total_amount: format_money(total),
            count,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccessError;
    use crate::testing::{
        DealSpec, backdate_deal, backdate_return, create_deal, create_return, create_user,
        identity_of, setup_store,
    };
    use chrono::Duration;
    use model::entities::{deal::Project, sales_return::ReturnStatus, user::Role};

    #[tokio::test]
    async fn test_one_day_trend_nets_out_returns() {
        let store = setup_store().await;
        let fin = create_user(&store, "fin", Role::Financist, None).await;
        let manager = create_user(&store, "m1", Role::Manager, Some(Project::Amazon)).await;
        let now = Utc::now();

        let deal = create_deal(
            &store,
            manager.id,
            DealSpec {
                status: DealStatus::Completed,
                amount: "500",
                paid: "500",
                ..Default::default()
            },
        )
        .await;
        create_return(&store, deal.deal.id, "50", ReturnStatus::Completed, now).await;
        // Requested returns are not netted out
        create_return(&store, deal.deal.id, "20", ReturnStatus::Requested, now).await;

        let trend = revenue_trend(
            &store,
            &identity_of(&fin),
            &AnalyticsQuery {
                days: Some("1".to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(trend.len(), 1);
        assert_eq!(trend[0].gross_revenue, "500.00");
        assert_eq!(trend[0].returns, "50.00");
        assert_eq!(trend[0].net_revenue, "450.00");

        assert!(matches!(
            revenue_trend(&store, &identity_of(&manager), &AnalyticsQuery::default(), now).await,
            Err(AccessError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_sales_chart_fills_every_day() {
        let store = setup_store().await;
        let m1 = create_user(&store, "m1", Role::Manager, Some(Project::Amazon)).await;
        let m2 = create_user(&store, "m2", Role::Manager, Some(Project::Amazon)).await;
        let now = Utc::now();

        let older = create_deal(
            &store,
            m1.id,
            DealSpec {
                paid: "120.50",
                ..Default::default()
            },
        )
        .await;
        backdate_deal(&store, older.deal.id, now - Duration::days(2)).await;
        create_deal(
            &store,
            m1.id,
            DealSpec {
                paid: "80",
                ..Default::default()
            },
        )
        .await;
        create_deal(
            &store,
            m2.id,
            DealSpec {
                paid: "999",
                ..Default::default()
            },
        )
        .await;

        let chart = sales_chart(
            &store,
            &identity_of(&m1),
            &AnalyticsQuery {
                days: Some("7".to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(chart.len(), 7);
        assert_eq!(chart[6].revenue, "80.00");
        assert_eq!(chart[6].deals, 1);
        assert_eq!(chart[4].revenue, "120.50");
        assert_eq!(chart[5].deals, 0);
        assert_eq!(chart[5].revenue, "0.00");

        let bad = sales_chart(
            &store,
            &identity_of(&m1),
            &AnalyticsQuery {
                days: Some("0".to_string()),
                project: Some("ebay".to_string()),
                ..Default::default()
            },
            now,
        )
        .await;
        match bad {
            Err(AccessError::Validation(fields)) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["days", "project"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_returns_analysis_counts_all_statuses() {
        let store = setup_store().await;
        let admin = create_user(&store, "admin", Role::Admin, None).await;
        let manager = create_user(&store, "m1", Role::Manager, Some(Project::Amazon)).await;
        let now = Utc::now();
        let deal = create_deal(
            &store,
            manager.id,
            DealSpec {
                paid: "500",
                ..Default::default()
            },
        )
        .await;

        create_return(&store, deal.deal.id, "10", ReturnStatus::Requested, now).await;
        create_return(&store, deal.deal.id, "15", ReturnStatus::Rejected, now).await;
        let old = create_return(&store, deal.deal.id, "30", ReturnStatus::Completed, now).await;
        backdate_return(&store, old.ret.id, now - Duration::days(40)).await;

        let points = returns_analysis(
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
        assert_eq!(points.len(), 7);
        let today = points.last().unwrap();
        assert_eq!(today.total_amount, "25.00");
        assert_eq!(today.count, 2);
        let total: u64 = points.iter().map(|p| p.count).sum();
        assert_eq!(total, 2);
    }
}
