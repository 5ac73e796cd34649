//! Per-manager rollups: the leaderboard and the performance table.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{AnalyticsQuery, ManagerPerformanceRow, TopManagerRow, format_money};
use model::entities::{
    deal::{self, DealStatus},
    user,
};
use rust_decimal::Decimal;
use sea_orm::ActiveEnum;
use store::{DealFilter, PlanFilter, Store};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::plan_completion::current_completion;
use super::{amount, count_status, mean, paid, parse_limit, rate};
use crate::error::Result;
use crate::identity::Identity;
use crate::policy::{Operation, Resource, authorize};
use crate::validation::{FieldErrors, parse_project_filter};

const TOP_MANAGERS: u64 = 5;
const MAX_TOP_MANAGERS: u64 = 100;

/// Groups deal rows by owning manager.
fn by_manager(deals: &[deal::Model]) -> HashMap<Uuid, Vec<&deal::Model>> {
    let mut grouped: HashMap<Uuid, Vec<&deal::Model>> = HashMap::new();
    for deal in deals {
        grouped.entry(deal.manager_id).or_default().push(deal);
    }
    grouped
}

/// Higher totals first, ties broken by name.
fn ranking(a: (Decimal, &str), b: (Decimal, &str)) -> Ordering {
    b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

async fn manager_completion(
    store: &Store,
    manager: &user::Model,
    now: DateTime<Utc>,
) -> Result<i64> {
    current_completion(
        store,
        PlanFilter {
            manager_id: Some(manager.id),
            ..Default::default()
        },
        now,
    )
    .await
}

/// Active managers ranked by paid revenue, cut to `limit`.
#[instrument(skip(store))]
pub async fn top_managers(
    store: &Store,
    identity: &Identity,
    query: &AnalyticsQuery,
    now: DateTime<Utc>,
) -> Result<Vec<TopManagerRow>> {
    authorize(identity, Resource::Analytics, Operation::Read)?;

    let mut errors = FieldErrors::new();
    let limit = errors
        .check_opt(query.limit.as_deref(), |v| parse_limit(v, MAX_TOP_MANAGERS))
        .unwrap_or(TOP_MANAGERS);
    let project = errors
        .check_opt(query.project.as_deref(), |v| parse_project_filter("project", v))
        .flatten();
    errors.finish()?;

    let managers = store.list_active_managers().await?;
    let deals = store
        .find_deals(&DealFilter {
            project,
            ..Default::default()
        })
        .await?;
    let grouped = by_manager(&deals);

    let mut rows = Vec::with_capacity(managers.len());
    for manager in &managers {
        let own = grouped.get(&manager.id).map(Vec::as_slice).unwrap_or(&[]);
        let total_sales = paid(own);
        let deal_count = own.len() as u64;
        let completed_deals = count_status(own, DealStatus::Completed);
        rows.push((
            total_sales,
            TopManagerRow {
                manager_id: manager.id,
                full_name: manager.full_name.clone(),
                project: manager.project.map(|p| p.to_value()),
                total_sales: format_money(total_sales),
                deal_count,
                completed_deals,
                avg_deal_size: format_money(mean(total_sales, deal_count)),
                conversion_rate: rate(completed_deals, deal_count),
                plan_completion: manager_completion(store, manager, now).await?,
            },
        ));
    }

    rows.sort_by(|(a_total, a), (b_total, b)| {
        ranking((*a_total, &a.full_name), (*b_total, &b.full_name))
    });
    rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

    debug!(managers = managers.len(), limit, "Computed top managers");
    Ok(rows.into_iter().map(|(_, row)| row).collect())
}

/// Every active manager with booked revenue over all their deals.
#[instrument(skip(store))]
pub async fn managers_performance(
    store: &Store,
    identity: &Identity,
    query: &AnalyticsQuery,
    now: DateTime<Utc>,
) -> Result<Vec<ManagerPerformanceRow>> {
    authorize(identity, Resource::Analytics, Operation::Read)?;

    let mut errors = FieldErrors::new();
    let project = errors
        .check_opt(query.project.as_deref(), |v| parse_project_filter("project", v))
        .flatten();
    errors.finish()?;

    let managers: Vec<_> = store
        .list_active_managers()
        .await?
        .into_iter()
        .filter(|m| project.is_none() || m.project == project)
        .collect();
    let deals = store.find_deals(&DealFilter::default()).await?;
    let grouped = by_manager(&deals);

    let mut rows = Vec::with_capacity(managers.len());
    for manager in &managers {
        let own = grouped.get(&manager.id).map(Vec::as_slice).unwrap_or(&[]);
        let revenue = amount(own);
        let deals_count = own.len() as u64;
        let completed_deals = count_status(own, DealStatus::Completed);
        rows.push((
            revenue,
            ManagerPerformanceRow {
                manager_id: manager.id,
                full_name: manager.full_name.clone(),
                project: manager.project.map(|p| p.to_value()),
                revenue: format_money(revenue),
                deals_count,
                completed_deals,
                conversion_rate: rate(completed_deals, deals_count),
                plan_completion: manager_completion(store, manager, now).await?,
            },
        ));
    }

    rows.sort_by(|(a_total, a), (b_total, b)| {
        ranking((*a_total, &a.full_name), (*b_total, &b.full_name))
    });
    Ok(rows.into_iter().map(|(_, row)| row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccessError;
    use crate::testing::{DealSpec, create_deal, create_user, identity_of, setup_store};
    use model::entities::{deal::Project, user::Role};
    use store::UserChanges;

    #[tokio::test]
    async fn test_top_managers_respects_limit() {
        let store = setup_store().await;
        let admin = create_user(&store, "admin", Role::Admin, None).await;
        let small = create_user(&store, "small", Role::Manager, Some(Project::Amazon)).await;
        let big = create_user(&store, "big", Role::Manager, Some(Project::Shopify)).await;

        create_deal(
            &store,
            small.id,
            DealSpec {
                amount: "100",
                paid: "100",
                ..Default::default()
            },
        )
        .await;
        create_deal(
            &store,
            big.id,
            DealSpec {
                amount: "200",
                paid: "200",
                status: DealStatus::Completed,
                ..Default::default()
            },
        )
        .await;

        let top = top_managers(
            &store,
            &identity_of(&admin),
            &AnalyticsQuery {
                limit: Some("1".to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].manager_id, big.id);
        assert_eq!(top[0].total_sales, "200.00");
        assert_eq!(top[0].conversion_rate, 100);
        assert_eq!(top[0].plan_completion, 0);

        let everyone = top_managers(&store, &identity_of(&admin), &AnalyticsQuery::default(), Utc::now())
            .await
            .unwrap();
        assert_eq!(everyone.len(), 2);
        assert_eq!(everyone[1].manager_id, small.id);
    }

    #[tokio::test]
    async fn test_idle_and_inactive_managers() {
        let store = setup_store().await;
        let fin = create_user(&store, "fin", Role::Financist, None).await;
        let idle = create_user(&store, "idle", Role::Manager, Some(Project::Shopify)).await;
        let gone = create_user(&store, "gone", Role::Manager, Some(Project::Amazon)).await;
        store
            .update_user(
                gone.id,
                UserChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let rows = managers_performance(
            &store,
            &identity_of(&fin),
            &AnalyticsQuery::default(),
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].manager_id, idle.id);
        assert_eq!(rows[0].revenue, "0.00");
        assert_eq!(rows[0].conversion_rate, 0);

        let amazon = managers_performance(
            &store,
            &identity_of(&fin),
            &AnalyticsQuery {
                project: Some("amazon".to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();
        assert!(amazon.is_empty());

        assert!(matches!(
            managers_performance(
                &store,
                &identity_of(&idle),
                &AnalyticsQuery::default(),
                Utc::now()
            )
            .await,
            Err(AccessError::Forbidden)
        ));
    }
}
