use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::MoneyInput;

/// Query parameters shared by the plan list and plan progress views.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, IntoParams, PartialEq)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PlanListQuery {
    pub manager_id: Option<String>,
    pub project: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
    /// `first_half` or `second_half`
    pub plan_type: Option<String>,
    pub is_active: Option<String>,
}

/// Request body for creating a plan.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    pub project: String,
    pub manager_id: String,
    pub plan_type: String,
    #[validate(range(min = 2000, max = 2100))]
    pub year: i32,
    #[validate(range(min = 1, max = 12))]
    pub month: i32,
    pub planned_amount: MoneyInput,
    #[validate(range(min = 0))]
    pub planned_deals: Option<i32>,
    pub is_active: Option<bool>,
}

/// Request body for updating a plan. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanRequest {
    pub project: Option<String>,
    pub manager_id: Option<String>,
    pub plan_type: Option<String>,
    #[validate(range(min = 2000, max = 2100))]
    pub year: Option<i32>,
    #[validate(range(min = 1, max = 12))]
    pub month: Option<i32>,
    pub planned_amount: Option<MoneyInput>,
    #[validate(range(min = 0))]
    pub planned_deals: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanDto {
    pub id: Uuid,
    pub project: String,
    pub manager_id: Uuid,
    pub manager_name: Option<String>,
    pub plan_type: String,
    pub year: i32,
    pub month: i32,
    pub planned_amount: String,
    pub planned_deals: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A plan next to what the manager actually achieved in its window.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanProgressDto {
    pub plan: PlanDto,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub actual_amount: String,
    pub actual_deals: u64,
    /// Percent of the planned amount reached, rounded
    pub completion: i64,
}
