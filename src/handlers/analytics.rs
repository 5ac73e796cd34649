use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::Utc;
use common::{
    AnalyticsOverview, AnalyticsQuery, ApiResponse, ConversionFunnel, DashboardMetrics,
    ManagerPerformanceRow, MonthlyReport, ProjectComparisonRow, ReturnsAnalysisPoint,
    RevenueTrendPoint, SalesChartPoint, TopManagerRow,
};
use compute::analytics;
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use crate::helpers::{errors::ApiError, identity::CurrentUser, response::respond};
use crate::schemas::{AppState, ErrorResponse};

/// Headline dashboard numbers for the caller's scope
///
/// Managers see their own deals only. Accepts `project`, `dateFrom` and `dateTo`.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/dashboard",
    tag = "analytics",
    params(
        AnalyticsQuery,
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    responses(
        (status = 200, description = "Dashboard metrics retrieved successfully", body = ApiResponse<DashboardMetrics>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 403, description = "Role may not read this view", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<DashboardMetrics>>, ApiError> {
    trace!("Entering dashboard function");
    let result = analytics::dashboard_metrics(&state.store, &identity, &query, Utc::now()).await?;
    Ok(respond(result, "Dashboard metrics retrieved successfully"))
}

/// Daily deal count and paid amount
///
/// One zero-filled point per day; `period` or `days` (default 30) pick the window.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/sales-chart",
    tag = "analytics",
    params(
        AnalyticsQuery,
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    responses(
        (status = 200, description = "Sales chart retrieved successfully", body = ApiResponse<Vec<SalesChartPoint>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 403, description = "Role may not read this view", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn sales_chart(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<Vec<SalesChartPoint>>>, ApiError> {
    trace!("Entering sales_chart function");
    let result = analytics::sales_chart(&state.store, &identity, &query, Utc::now()).await?;
    debug!("sales_chart produced {} rows", result.len());
    Ok(respond(result, "Sales chart retrieved successfully"))
}

/// Revenue, returns and growth for a named period
///
/// Growth compares against the window of the same length just before.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/overview",
    tag = "analytics",
    params(
        AnalyticsQuery,
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    responses(
        (status = 200, description = "Analytics overview retrieved successfully", body = ApiResponse<AnalyticsOverview>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 403, description = "Role may not read this view", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn overview(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<AnalyticsOverview>>, ApiError> {
    trace!("Entering overview function");
    let result = analytics::analytics_overview(&state.store, &identity, &query, Utc::now()).await?;
    debug!("Overview for {}: gross {}", result.period, result.gross_revenue);
    Ok(respond(result, "Analytics overview retrieved successfully"))
}

/// Daily gross, returns and net revenue
#[utoipa::path(
    get,
    path = "/api/v1/analytics/revenue-trend",
    tag = "analytics",
    params(
        AnalyticsQuery,
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    responses(
        (status = 200, description = "Revenue trend retrieved successfully", body = ApiResponse<Vec<RevenueTrendPoint>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 403, description = "Role may not read this view", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn revenue_trend(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<Vec<RevenueTrendPoint>>>, ApiError> {
    trace!("Entering revenue_trend function");
    let result = analytics::revenue_trend(&state.store, &identity, &query, Utc::now()).await?;
    debug!("revenue_trend produced {} rows", result.len());
    Ok(respond(result, "Revenue trend retrieved successfully"))
}

/// Completed revenue per project
#[utoipa::path(
    get,
    path = "/api/v1/analytics/project-comparison",
    tag = "analytics",
    params(
        AnalyticsQuery,
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    responses(
        (status = 200, description = "Project comparison retrieved successfully", body = ApiResponse<Vec<ProjectComparisonRow>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 403, description = "Role may not read this view", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn project_comparison(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<Vec<ProjectComparisonRow>>>, ApiError> {
    trace!("Entering project_comparison function");
    let result = analytics::project_comparison(&state.store, &identity, &query).await?;
    debug!("project_comparison produced {} rows", result.len());
    Ok(respond(result, "Project comparison retrieved successfully"))
}

/// Managers ranked by revenue collected
///
/// `limit` defaults to 5.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/top-managers",
    tag = "analytics",
    params(
        AnalyticsQuery,
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    responses(
        (status = 200, description = "Top managers retrieved successfully", body = ApiResponse<Vec<TopManagerRow>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 403, description = "Role may not read this view", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn top_managers(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<Vec<TopManagerRow>>>, ApiError> {
    trace!("Entering top_managers function");
    let result = analytics::top_managers(&state.store, &identity, &query, Utc::now()).await?;
    debug!("top_managers produced {} rows", result.len());
    Ok(respond(result, "Top managers retrieved successfully"))
}

/// Per-manager deal volume, conversion and plan attainment
#[utoipa::path(
    get,
    path = "/api/v1/analytics/managers-performance",
    tag = "analytics",
    params(
        AnalyticsQuery,
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    responses(
        (status = 200, description = "Managers performance retrieved successfully", body = ApiResponse<Vec<ManagerPerformanceRow>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 403, description = "Role may not read this view", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn managers_performance(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<Vec<ManagerPerformanceRow>>>, ApiError> {
    trace!("Entering managers_performance function");
    let result = analytics::managers_performance(&state.store, &identity, &query, Utc::now()).await?;
    debug!("managers_performance produced {} rows", result.len());
    Ok(respond(result, "Managers performance retrieved successfully"))
}

/// Deal counts per pipeline stage
#[utoipa::path(
    get,
    path = "/api/v1/analytics/conversion-funnel",
    tag = "analytics",
    params(
        AnalyticsQuery,
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    responses(
        (status = 200, description = "Conversion funnel retrieved successfully", body = ApiResponse<ConversionFunnel>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 403, description = "Role may not read this view", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn conversion_funnel(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<ConversionFunnel>>, ApiError> {
    trace!("Entering conversion_funnel function");
    let result = analytics::conversion_funnel(&state.store, &identity, &query).await?;
    Ok(respond(result, "Conversion funnel retrieved successfully"))
}

/// Daily return count and amount
#[utoipa::path(
    get,
    path = "/api/v1/analytics/returns-analysis",
    tag = "analytics",
    params(
        AnalyticsQuery,
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    responses(
        (status = 200, description = "Returns analysis retrieved successfully", body = ApiResponse<Vec<ReturnsAnalysisPoint>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 403, description = "Role may not read this view", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn returns_analysis(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<Vec<ReturnsAnalysisPoint>>>, ApiError> {
    trace!("Entering returns_analysis function");
    let result = analytics::returns_analysis(&state.store, &identity, &query, Utc::now()).await?;
    debug!("returns_analysis produced {} rows", result.len());
    Ok(respond(result, "Returns analysis retrieved successfully"))
}

/// Sales, returns and per-manager totals for one calendar month
///
/// `year` and `month` default to the current month.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/monthly-report",
    tag = "analytics",
    params(
        AnalyticsQuery,
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    responses(
        (status = 200, description = "Monthly report retrieved successfully", body = ApiResponse<MonthlyReport>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 403, description = "Role may not read this view", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn monthly_report(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<MonthlyReport>>, ApiError> {
    trace!("Entering monthly_report function");
    let result = analytics::monthly_report(&state.store, &identity, &query, Utc::now()).await?;
    debug!(
        "Monthly report {}-{:02}: {} sales, {} returns",
        result.year, result.month, result.total_deals, result.return_count
    );
    Ok(respond(result, "Monthly report retrieved successfully"))
}
