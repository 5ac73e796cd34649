use common::{AnalyticsQuery, ConversionFunnel, ProjectComparisonRow, format_money};
use model::entities::deal::{DealStatus, Project};
use sea_orm::{ActiveEnum, Iterable};
use store::{DealFilter, Store};
use tracing::{debug, instrument};

use super::{amount, percent};
use crate::error::Result;
use crate::identity::Identity;
use crate::policy::{Operation, Resource, authorize};
use crate::validation::{DayBound, FieldErrors, parse_date_bound, parse_project_filter};

fn date_filter(query: &AnalyticsQuery, errors: &mut FieldErrors) -> DealFilter {
    DealFilter {
        created_from: errors.check_opt(query.date_from.as_deref(), |v| {
            parse_date_bound("dateFrom", v, DayBound::Start)
        }),
        created_to: errors.check_opt(query.date_to.as_deref(), |v| {
            parse_date_bound("dateTo", v, DayBound::End)
        }),
        ..Default::default()
    }
}

/// Completed deals split by project. Every project is listed, including
/// those without sales.
#[instrument(skip(store))]
pub async fn project_comparison(
    store: &Store,
    identity: &Identity,
    query: &AnalyticsQuery,
) -> Result<Vec<ProjectComparisonRow>> {
    authorize(identity, Resource::Analytics, Operation::Read)?;

    let mut errors = FieldErrors::new();
    let filter = date_filter(query, &mut errors).with_status(DealStatus::Completed);
    errors.finish()?;

    let deals = store.find_deals(&filter).await?;
    let all: Vec<_> = deals.iter().collect();
    let total = amount(&all);

    Ok(Project::iter()
        .map(|project| {
            let group: Vec<_> = all.iter().copied().filter(|d| d.project == project).collect();
            let group_total = amount(&group);
            ProjectComparisonRow {
                project: project.to_value(),
                total_amount: format_money(group_total),
                count: group.len() as u64,
                percentage: percent(group_total, total),
            }
        })
        .collect())
}

/// Cumulative pipeline stages: each stage contains every later one.
#[instrument(skip(store))]
pub async fn conversion_funnel(
    store: &Store,
    identity: &Identity,
    query: &AnalyticsQuery,
) -> Result<ConversionFunnel> {
    authorize(identity, Resource::Analytics, Operation::Read)?;

    let mut errors = FieldErrors::new();
    let mut filter = date_filter(query, &mut errors);
    filter.project = errors
        .check_opt(query.project.as_deref(), |v| parse_project_filter("project", v))
        .flatten();
    errors.finish()?;

    let deals = store.find_deals(&filter).await?;
    let count = |statuses: &[DealStatus]| {
        deals
            .iter()
            .filter(|d| statuses.contains(&d.status))
            .count() as u64
    };

    let funnel = ConversionFunnel {
        leads: deals.len() as u64,
        contacts: count(&[
            DealStatus::InProgress,
            DealStatus::Prepayment,
            DealStatus::Partial,
            DealStatus::Completed,
        ]),
        negotiations: count(&[
            DealStatus::Prepayment,
            DealStatus::Partial,
            DealStatus::Completed,
        ]),
        completed: count(&[DealStatus::Completed]),
    };
    debug!(?funnel, "Computed conversion funnel");
    Ok(funnel)
}
