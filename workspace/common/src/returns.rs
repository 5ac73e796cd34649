use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{MoneyInput, Pagination};

/// Query parameters for listing returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, IntoParams, PartialEq)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReturnListQuery {
    /// `requested`, `processing`, `completed` or `rejected`
    pub status: Option<String>,
    pub deal_id: Option<String>,
    /// Lower bound on the return date
    pub date_from: Option<String>,
    /// Upper bound on the return date; a bare date includes the whole day
    pub date_to: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Request body for registering a return against a deal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateReturnRequest {
    pub deal_id: String,
    /// Defaults to the time of the request
    pub return_date: Option<String>,
    pub return_amount: MoneyInput,
    #[validate(length(min = 1, max = 1000))]
    pub return_reason: String,
}

/// Request body for processing a return. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReturnRequest {
    pub return_date: Option<String>,
    pub return_amount: Option<MoneyInput>,
    #[validate(length(min = 1, max = 1000))]
    pub return_reason: Option<String>,
    pub status: Option<String>,
    /// Defaults to the caller when the status changes
    pub processed_by: Option<String>,
}

/// The deal a return belongs to, as shown next to the return.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReturnDealSummary {
    pub id: Uuid,
    pub client_name: String,
    pub project: String,
    pub program: String,
    pub manager_id: Uuid,
    pub manager_name: Option<String>,
    pub paid_amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReturnDto {
    pub id: Uuid,
    pub deal_id: Uuid,
    pub return_date: DateTime<Utc>,
    pub return_amount: String,
    pub return_reason: String,
    pub status: String,
    pub processed_by: Option<Uuid>,
    pub processor_name: Option<String>,
    pub deal: ReturnDealSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of returns.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ReturnListResponse {
    pub returns: Vec<ReturnDto>,
    pub pagination: Pagination,
}
