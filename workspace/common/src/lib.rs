//! Common transport-layer types shared by the access layer and the HTTP
//! surface: request payloads (validated with `validator`), response DTOs
//! (documented with `utoipa`) and the money wire format.

mod analytics;
mod deals;
mod money;
mod plans;
mod returns;
mod users;

pub use analytics::{
    AnalyticsOverview, AnalyticsQuery, ConversionFunnel, DashboardMetrics, ManagerMonthlyRow,
    ManagerPerformanceRow, MonthlyReport, MonthlyReturnRow, MonthlySaleRow, ProjectComparisonRow,
    ReturnsAnalysisPoint, RevenueTrendPoint, SalesChartPoint, TopManagerRow,
};
pub use deals::{CreateDealRequest, DealDto, DealListQuery, DealListResponse, UpdateDealRequest};
pub use money::{MoneyInput, format_money};
pub use plans::{CreatePlanRequest, PlanDto, PlanListQuery, PlanProgressDto, UpdatePlanRequest};
pub use returns::{
    CreateReturnRequest, ReturnDealSummary, ReturnDto, ReturnListQuery, ReturnListResponse,
    UpdateReturnRequest,
};
pub use users::{CreateUserRequest, UpdateUserRequest, UserDto};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{ValidateEmail, ValidationError};

/// Generic API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

/// One invalid input field and why it was rejected.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct FieldError {
    /// Wire name of the field (camelCase)
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Email check for optional fields. A blank value passes because it clears
/// the stored address.
pub(crate) fn blank_or_email(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || value.validate_email() {
        Ok(())
    } else {
        Err(ValidationError::new("email"))
    }
}

/// Page metadata returned with every paginated list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_rounds_pages_up() {
        assert_eq!(Pagination::new(1, 10, 0).pages, 0);
        assert_eq!(Pagination::new(1, 10, 10).pages, 1);
        assert_eq!(Pagination::new(2, 10, 11).pages, 2);
        assert_eq!(Pagination::new(1, 3, 7).pages, 3);
    }

    #[test]
    fn test_api_response_shape() {
        let response = ApiResponse {
            data: vec![1, 2],
            message: "ok".to_string(),
            success: true,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["data"], serde_json::json!([1, 2]));
        assert_eq!(value["success"], serde_json::json!(true));
    }
}
