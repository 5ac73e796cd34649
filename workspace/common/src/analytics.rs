use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Filters accepted by the analytics views. Each view reads only the
/// parameters it understands; values are parsed and checked per field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, PartialEq)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AnalyticsQuery {
    /// `amazon` or `shopify`
    pub project: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// `week`, `month`, `quarter` (and `year` for the overview)
    pub period: Option<String>,
    /// Explicit window length in days (1-366)
    pub days: Option<String>,
    /// Number of rows to return (1-100)
    pub limit: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    /// Sum of paid amounts
    pub total_sales: String,
    pub total_deals: u64,
    /// Mean paid amount per deal
    pub average_deal: String,
    pub completed_deals: u64,
    /// Sum of completed returns against deals in scope
    pub total_returns: String,
    pub returns_count: u64,
    pub net_revenue: String,
    pub conversion_rate: i64,
    pub plan_completion: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalesChartPoint {
    pub date: NaiveDate,
    /// Sum of paid amounts of deals created that day
    pub revenue: String,
    pub deals: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevenueTrendPoint {
    pub date: NaiveDate,
    pub gross_revenue: String,
    pub returns: String,
    pub net_revenue: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectComparisonRow {
    pub project: String,
    pub total_amount: String,
    pub count: u64,
    pub percentage: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopManagerRow {
    pub manager_id: Uuid,
    pub full_name: String,
    pub project: Option<String>,
    pub total_sales: String,
    pub deal_count: u64,
    pub completed_deals: u64,
    pub avg_deal_size: String,
    pub conversion_rate: i64,
    pub plan_completion: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagerPerformanceRow {
    pub manager_id: Uuid,
    pub full_name: String,
    pub project: Option<String>,
    /// Sum of deal amounts across all statuses
    pub revenue: String,
    pub deals_count: u64,
    pub completed_deals: u64,
    pub conversion_rate: i64,
    pub plan_completion: i64,
}

/// Cumulative pipeline stages; each stage is a subset of the previous one.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversionFunnel {
    pub leads: u64,
    pub contacts: u64,
    pub negotiations: u64,
    pub completed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReturnsAnalysisPoint {
    pub date: NaiveDate,
    pub total_amount: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    pub period: String,
    pub date_from: DateTime<Utc>,
    pub date_to: DateTime<Utc>,
    pub gross_revenue: String,
    pub total_returns: String,
    pub net_revenue: String,
    pub active_deals: u64,
    pub total_deals: u64,
    pub conversion_rate: i64,
    pub plan_completion: i64,
    /// Change of gross revenue against the preceding window, in percent
    pub revenue_growth: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySaleRow {
    pub deal_id: Uuid,
    pub date: DateTime<Utc>,
    pub client_name: String,
    pub project: String,
    pub program: String,
    pub manager_name: Option<String>,
    pub status: String,
    pub amount: String,
    pub paid_amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReturnRow {
    pub return_id: Uuid,
    pub deal_id: Uuid,
    pub date: DateTime<Utc>,
    pub client_name: String,
    pub manager_name: Option<String>,
    pub amount: String,
    pub reason: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagerMonthlyRow {
    pub manager_id: Uuid,
    pub full_name: String,
    pub gross_revenue: String,
    pub returns: String,
    pub net_revenue: String,
    pub deal_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub gross_revenue: String,
    pub total_returns: String,
    pub net_revenue: String,
    pub total_deals: u64,
    pub return_count: u64,
    pub sales: Vec<MonthlySaleRow>,
    pub returns: Vec<MonthlyReturnRow>,
    pub manager_stats: Vec<ManagerMonthlyRow>,
}
