use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{MoneyInput, Pagination};

/// Query parameters for listing deals.
///
/// Everything arrives as text so malformed values can be reported per field
/// instead of failing the whole extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, IntoParams, PartialEq)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DealListQuery {
    /// `amazon` or `shopify`
    pub project: Option<String>,
    pub status: Option<String>,
    /// Lower bound on creation time (RFC 3339 or YYYY-MM-DD)
    pub date_from: Option<String>,
    /// Upper bound on creation time; a bare date includes the whole day
    pub date_to: Option<String>,
    #[validate(length(max = 100))]
    pub search: Option<String>,
    /// `client` (default), `phone` or `manager`
    pub search_by: Option<String>,
    /// Page number, starting at 1
    pub page: Option<String>,
    /// Items per page (1-100)
    pub limit: Option<String>,
}

/// Request body for creating a deal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateDealRequest {
    #[validate(length(min = 1, max = 200))]
    pub client_name: String,
    #[validate(length(min = 1, max = 50))]
    pub phone: String,
    #[validate(custom(function = "crate::blank_or_email"))]
    pub email: Option<String>,
    pub project: String,
    #[validate(length(min = 1, max = 100))]
    pub program: String,
    /// Owning manager. Required for admins, ignored for managers.
    pub manager_id: Option<String>,
    pub status: Option<String>,
    pub amount: MoneyInput,
    pub paid_amount: Option<MoneyInput>,
    #[validate(length(max = 100))]
    pub source: Option<String>,
    #[validate(length(max = 100))]
    pub marketing_channel: Option<String>,
    #[validate(length(max = 100))]
    pub payment_method: Option<String>,
    pub gender: Option<String>,
    #[validate(length(max = 100))]
    pub client_segment: Option<String>,
    #[validate(length(max = 2000))]
    pub comments: Option<String>,
    #[validate(length(max = 100))]
    pub bank_order_number: Option<String>,
}

/// Request body for updating a deal. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDealRequest {
    #[validate(length(min = 1, max = 200))]
    pub client_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub phone: Option<String>,
    #[validate(custom(function = "crate::blank_or_email"))]
    pub email: Option<String>,
    pub project: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub program: Option<String>,
    pub manager_id: Option<String>,
    pub status: Option<String>,
    pub amount: Option<MoneyInput>,
    pub paid_amount: Option<MoneyInput>,
    #[validate(length(max = 100))]
    pub source: Option<String>,
    #[validate(length(max = 100))]
    pub marketing_channel: Option<String>,
    #[validate(length(max = 100))]
    pub payment_method: Option<String>,
    pub gender: Option<String>,
    #[validate(length(max = 100))]
    pub client_segment: Option<String>,
    #[validate(length(max = 2000))]
    pub comments: Option<String>,
    #[validate(length(max = 100))]
    pub bank_order_number: Option<String>,
}

/// A deal as exposed over the API. Money fields are two-decimal strings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DealDto {
    pub id: Uuid,
    pub client_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub project: String,
    pub program: String,
    pub manager_id: Uuid,
    pub manager_name: Option<String>,
    pub status: String,
    pub amount: String,
    pub paid_amount: String,
    pub remaining_amount: String,
    pub source: Option<String>,
    pub marketing_channel: Option<String>,
    pub payment_method: Option<String>,
    pub gender: Option<String>,
    pub client_segment: Option<String>,
    pub comments: Option<String>,
    pub bank_order_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of deals.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DealListResponse {
    pub deals: Vec<DealDto>,
    pub pagination: Pagination,
}
