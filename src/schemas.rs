use common::{
    AnalyticsOverview, ConversionFunnel, CreateDealRequest, CreatePlanRequest,
    CreateReturnRequest, CreateUserRequest, DashboardMetrics, DealDto, DealListResponse,
    FieldError, ManagerMonthlyRow, ManagerPerformanceRow, MonthlyReport, MonthlyReturnRow,
    MonthlySaleRow, MoneyInput, Pagination, PlanDto, PlanProgressDto, ProjectComparisonRow,
    ReturnDealSummary, ReturnDto, ReturnListResponse, ReturnsAnalysisPoint, RevenueTrendPoint,
    SalesChartPoint, TopManagerRow, UpdateDealRequest, UpdatePlanRequest, UpdateReturnRequest,
    UpdateUserRequest, UserDto,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use store::Store;
use utoipa::{OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Entity store over the pooled connection
    pub store: Store,
}

impl AppState {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            store: Store::new(db),
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
    /// Every invalid field, for validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
            success: false,
            fields: None,
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldError>) -> Self {
        self.fields = Some(fields);
        self
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::users::get_me,
        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::create_user,
        crate::handlers::users::update_user,
        crate::handlers::users::deactivate_user,
        crate::handlers::deals::list_deals,
        crate::handlers::deals::get_deal,
        crate::handlers::deals::create_deal,
        crate::handlers::deals::update_deal,
        crate::handlers::deals::delete_deal,
        crate::handlers::returns::list_returns,
        crate::handlers::returns::create_return,
        crate::handlers::returns::update_return,
        crate::handlers::plans::list_plans,
        crate::handlers::plans::create_plan,
        crate::handlers::plans::update_plan,
        crate::handlers::plans::plan_progress,
        crate::handlers::analytics::dashboard,
        crate::handlers::analytics::sales_chart,
        crate::handlers::analytics::overview,
        crate::handlers::analytics::revenue_trend,
        crate::handlers::analytics::project_comparison,
        crate::handlers::analytics::top_managers,
        crate::handlers::analytics::managers_performance,
        crate::handlers::analytics::conversion_funnel,
        crate::handlers::analytics::returns_analysis,
        crate::handlers::analytics::monthly_report,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            FieldError,
            Pagination,
            MoneyInput,
            UserDto,
            CreateUserRequest,
            UpdateUserRequest,
            DealDto,
            DealListResponse,
            CreateDealRequest,
            UpdateDealRequest,
            ReturnDto,
            ReturnDealSummary,
            ReturnListResponse,
            CreateReturnRequest,
            UpdateReturnRequest,
            PlanDto,
            PlanProgressDto,
            CreatePlanRequest,
            UpdatePlanRequest,
            DashboardMetrics,
            SalesChartPoint,
            RevenueTrendPoint,
            ProjectComparisonRow,
            TopManagerRow,
            ManagerPerformanceRow,
            ConversionFunnel,
            ReturnsAnalysisPoint,
            AnalyticsOverview,
            MonthlyReport,
            MonthlySaleRow,
            MonthlyReturnRow,
            ManagerMonthlyRow,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "User administration and the caller's profile"),
        (name = "deals", description = "Sales deals, scoped to the owning manager"),
        (name = "returns", description = "Returns registered against deals"),
        (name = "plans", description = "Half-month sales plans and their progress"),
        (name = "analytics", description = "Dashboards, trends and reports"),
    ),
    info(
        title = "SalesDesk API",
        description = "Sales CRM back end: deals, returns, plans and analytics with role-based access",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
