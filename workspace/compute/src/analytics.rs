//! Aggregate views over deals, returns and plans.
//!
//! Everything is summed in [`Decimal`] on rows loaded through the same scoped
//! filters as the CRUD views. Every function takes `now` explicitly so the
//! windows are reproducible.

pub mod charts;
pub mod dashboard;
pub mod managers;
pub mod monthly;
pub mod overview;
pub mod plan_completion;
pub mod projects;

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use common::FieldError;
use model::entities::{deal, deal::DealStatus};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use store::money::normalize;

use crate::validation::{FieldErrors, parse_enum, parse_int_in};

pub use charts::{returns_analysis, revenue_trend, sales_chart};
pub use dashboard::dashboard_metrics;
pub use managers::{managers_performance, top_managers};
pub use monthly::monthly_report;
pub use overview::analytics_overview;
pub use projects::{conversion_funnel, project_comparison};

/// Named reporting windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Week,
    Month,
    Quarter,
    Year,
}

impl Period {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "quarter" => Some(Self::Quarter),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    pub fn days(self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
            Self::Year => 365,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }
}

pub(crate) const MAX_DAYS: i64 = 366;

/// Reads a day-based window from `period` (week, month, quarter) or an
/// explicit `days`, which wins when both are given.
pub(crate) fn window_days(
    errors: &mut FieldErrors,
    period: Option<&str>,
    days: Option<&str>,
    default_days: i64,
) -> i64 {
    let from_period = errors
        .check_opt(period, |v| {
            parse_enum(
                "period",
                v,
                |p| Period::parse(p).filter(|p| *p != Period::Year),
                "week, month, quarter",
            )
        })
        .map(Period::days);
    let explicit = errors.check_opt(days, |v| parse_int_in("days", v, 1, MAX_DAYS));
    explicit.or(from_period).unwrap_or(default_days)
}

/// The `days` calendar days ending with today, oldest first.
pub(crate) fn day_range(now: DateTime<Utc>, days: i64) -> Vec<NaiveDate> {
    let today = now.date_naive();
    (0..days.max(1))
        .rev()
        .map(|back| today - Duration::days(back))
        .collect()
}

/// A map with one zeroed bucket per day, ready to be filled.
pub(crate) fn day_buckets<T: Default>(days: &[NaiveDate]) -> BTreeMap<NaiveDate, T> {
    days.iter().map(|day| (*day, T::default())).collect()
}

/// `part / whole` as a whole percentage, rounded half away from zero; zero
/// when there is nothing to divide by.
pub fn percent(part: Decimal, whole: Decimal) -> i64 {
    if whole.is_zero() {
        return 0;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|pct| {
            pct.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
        })
        .unwrap_or(i64::MAX)
}

pub fn rate(part: u64, whole: u64) -> i64 {
    percent(Decimal::from(part), Decimal::from(whole))
}

pub(crate) fn mean(total: Decimal, count: u64) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        total / Decimal::from(count)
    }
}

pub(crate) fn paid(deals: &[&deal::Model]) -> Decimal {
    deals.iter().map(|d| normalize(d.paid_amount)).sum()
}

pub(crate) fn amount(deals: &[&deal::Model]) -> Decimal {
    deals.iter().map(|d| normalize(d.amount)).sum()
}

pub(crate) fn count_status(deals: &[&deal::Model], status: DealStatus) -> u64 {
    deals.iter().filter(|d| d.status == status).count() as u64
}

/// An optional `limit` query value.
pub(crate) fn parse_limit(value: &str, max: u64) -> Result<u64, FieldError> {
    parse_int_in("limit", value, 1, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_percent_rounds_half_away_from_zero() {
        assert_eq!(percent(Decimal::ONE, Decimal::from(8)), 13);
        assert_eq!(percent(Decimal::from(-1), Decimal::from(8)), -13);
        assert_eq!(percent(Decimal::from(5), Decimal::ZERO), 0);
        assert_eq!(rate(0, 0), 0);
        assert_eq!(rate(1, 3), 33);
        assert_eq!(rate(2, 3), 67);
    }

    #[test]
    fn test_day_range_ends_today() {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 15, 0, 0).unwrap();
        let days = day_range(now, 3);
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            ]
        );
    }

    #[test]
    fn test_window_days() {
        let mut errors = FieldErrors::new();
        assert_eq!(window_days(&mut errors, Some("week"), None, 30), 7);
        assert_eq!(window_days(&mut errors, Some("quarter"), Some("3"), 30), 3);
        assert_eq!(window_days(&mut errors, None, None, 30), 30);
        assert!(errors.is_empty());

        window_days(&mut errors, Some("year"), Some("400"), 30);
        assert!(errors.finish().is_err());
    }
}
