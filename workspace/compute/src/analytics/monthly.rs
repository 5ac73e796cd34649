use std::collections::HashMap;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use common::{
    AnalyticsQuery, ManagerMonthlyRow, MonthlyReport, MonthlyReturnRow, MonthlySaleRow,
    format_money,
};
use model::entities::deal::DealStatus;
use rust_decimal::Decimal;
use sea_orm::ActiveEnum;
use store::{DealFilter, ReturnFilter, Store, money::normalize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{AccessError, Result};
use crate::identity::Identity;
use crate::policy::{Operation, Resource, authorize};
use crate::validation::{
    FieldErrors, end_of_day, parse_int_in, parse_project_filter, start_of_day,
};

#[derive(Default)]
struct ManagerTally {
    gross: Decimal,
    returns: Decimal,
    deals: u64,
}

/// Completed sales of deals created in one calendar month, the completed
/// returns booked against those deals, and a per-manager breakdown.
#[instrument(skip(store))]
pub async fn monthly_report(
    store: &Store,
    identity: &Identity,
    query: &AnalyticsQuery,
    now: DateTime<Utc>,
) -> Result<MonthlyReport> {
    authorize(identity, Resource::Analytics, Operation::Read)?;

    let mut errors = FieldErrors::new();
    let year = errors
        .check_opt(query.year.as_deref(), |v| parse_int_in("year", v, 2000, 2100))
        .unwrap_or(now.year());
    let month = errors
        .check_opt(query.month.as_deref(), |v| parse_int_in("month", v, 1u32, 12))
        .unwrap_or(now.month());
    let project = errors
        .check_opt(query.project.as_deref(), |v| parse_project_filter("project", v))
        .flatten();
    errors.finish()?;

    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AccessError::invalid("month", "Not a calendar month"))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| AccessError::invalid("month", "Not a calendar month"))?;

    let deal_filter = DealFilter {
        project,
        ..Default::default()
    }
    .created_between(start_of_day(first), end_of_day(last));

    let sales = store
        .find_deals(&deal_filter.clone().with_status(DealStatus::Completed))
        .await?;
    let returns = store
        .find_returns(&ReturnFilter::completed().with_deal(deal_filter))
        .await?;

    let manager_ids: Vec<Uuid> = sales
        .iter()
        .map(|d| d.manager_id)
        .chain(returns.iter().map(|(_, d)| d.manager_id))
        .collect();
    let managers = store.users_by_ids(&manager_ids).await?;
    let manager_name = |id: &Uuid| managers.get(id).map(|m| m.full_name.clone());

    let mut tallies: HashMap<Uuid, ManagerTally> = HashMap::new();
    let mut gross_revenue = Decimal::ZERO;
    let sale_rows: Vec<MonthlySaleRow> = sales
        .iter()
        .map(|deal| {
            let amount = normalize(deal.amount);
            gross_revenue += amount;
            let tally = tallies.entry(deal.manager_id).or_default();
            tally.gross += amount;
            tally.deals += 1;

            MonthlySaleRow {
                deal_id: deal.id,
                date: deal.created_at,
                client_name: deal.client_name.clone(),
                project: deal.project.to_value(),
                program: deal.program.clone(),
                manager_name: manager_name(&deal.manager_id),
                status: deal.status.to_value(),
                amount: format_money(amount),
                paid_amount: format_money(deal.paid_amount),
            }
        })
        .collect();

    let mut total_returns = Decimal::ZERO;
    let return_rows: Vec<MonthlyReturnRow> = returns
        .iter()
        .map(|(ret, deal)| {
            let amount = normalize(ret.return_amount);
            total_returns += amount;
            tallies.entry(deal.manager_id).or_default().returns += amount;

            MonthlyReturnRow {
                return_id: ret.id,
                deal_id: deal.id,
                date: ret.return_date,
                client_name: deal.client_name.clone(),
                manager_name: manager_name(&deal.manager_id),
                amount: format_money(amount),
                reason: ret.return_reason.clone(),
                status: ret.status.to_value(),
            }
        })
        .collect();

    let mut manager_stats: Vec<(Decimal, ManagerMonthlyRow)> = tallies
        .into_iter()
        .map(|(manager_id, tally)| {
            (
                tally.gross,
                ManagerMonthlyRow {
                    manager_id,
                    full_name: manager_name(&manager_id).unwrap_or_default(),
                    gross_revenue: format_money(tally.gross),
                    returns: format_money(tally.returns),
                    net_revenue: format_money(tally.gross - tally.returns),
                    deal_count: tally.deals,
                },
            )
        })
        .collect();
    manager_stats.sort_by(|(a_gross, a), (b_gross, b)| {
        b_gross
            .cmp(a_gross)
            .then_with(|| a.full_name.cmp(&b.full_name))
    });

    debug!(year, month, sales = sale_rows.len(), returns = return_rows.len(), "Built monthly report");
    Ok(MonthlyReport {
        year,
        month,
        gross_revenue: format_money(gross_revenue),
        total_returns: format_money(total_returns),
        net_revenue: format_money(gross_revenue - total_returns),
        total_deals: sale_rows.len() as u64,
        return_count: return_rows.len() as u64,
        sales: sale_rows,
        returns: return_rows,
        manager_stats: manager_stats.into_iter().map(|(_, row)| row).collect(),
    })
}
