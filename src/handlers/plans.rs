use axum::{
    extract::{Path, Query, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
    response::Json,
};
use common::{
    ApiResponse, CreatePlanRequest, PlanDto, PlanListQuery, PlanProgressDto, UpdatePlanRequest,
};
use compute::plans;
use tracing::{debug, info, instrument, trace};
use uuid::Uuid;

use crate::helpers::{errors::ApiError, identity::CurrentUser, response::respond};
use crate::schemas::{AppState, ErrorResponse};

/// List sales plans; managers only see their own
#[utoipa::path(
    get,
    path = "/api/v1/plans",
    tag = "plans",
    params(
        PlanListQuery,
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    responses(
        (status = 200, description = "Plans retrieved successfully", body = ApiResponse<Vec<PlanDto>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_plans(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(query): Query<PlanListQuery>,
) -> Result<Json<ApiResponse<Vec<PlanDto>>>, ApiError> {
    trace!("Entering list_plans function");
    let plans = plans::list_plans(&state.store, &identity, &query).await?;
    debug!("Retrieved {} plans", plans.len());
    Ok(respond(plans, "Plans retrieved successfully"))
}

/// Create a sales plan for a manager (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/plans",
    tag = "plans",
    params(("X-User-Id" = Uuid, Header, description = "Id of the calling user")),
    request_body = CreatePlanRequest,
    responses(
        (status = 201, description = "Plan created successfully", body = ApiResponse<PlanDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn create_plan(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    payload: Result<Json<CreatePlanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<PlanDto>>), ApiError> {
    trace!("Entering create_plan function");
    let Json(request) = payload?;
    debug!(
        "Creating {} plan for manager {} ({}-{})",
        request.plan_type, request.manager_id, request.year, request.month
    );

    let plan = plans::create_plan(&state.store, &identity, request).await?;
    info!("Plan created successfully with ID: {}", plan.id);
    Ok((StatusCode::CREATED, respond(plan, "Plan created successfully")))
}

/// Update a sales plan (admin only)
#[utoipa::path(
    put,
    path = "/api/v1/plans/{plan_id}",
    tag = "plans",
    params(
        ("plan_id" = Uuid, Path, description = "Plan ID"),
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    request_body = UpdatePlanRequest,
    responses(
        (status = 200, description = "Plan updated successfully", body = ApiResponse<PlanDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Plan not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn update_plan(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    plan_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdatePlanRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PlanDto>>, ApiError> {
    let Path(plan_id) = plan_id?;
    trace!("Entering update_plan function for plan_id: {}", plan_id);
    let Json(request) = payload?;

    let plan = plans::update_plan(&state.store, &identity, plan_id, request).await?;
    info!("Plan {} updated successfully", plan_id);
    Ok(respond(plan, "Plan updated successfully"))
}

/// Each visible plan next to what was actually sold in its window
#[utoipa::path(
    get,
    path = "/api/v1/plan-progress",
    tag = "plans",
    params(
        PlanListQuery,
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    responses(
        (status = 200, description = "Plan progress retrieved successfully", body = ApiResponse<Vec<PlanProgressDto>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn plan_progress(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(query): Query<PlanListQuery>,
) -> Result<Json<ApiResponse<Vec<PlanProgressDto>>>, ApiError> {
    trace!("Entering plan_progress function");
    let progress = plans::plan_progress(&state.store, &identity, &query).await?;
    debug!("Computed progress for {} plans", progress.len());
    Ok(respond(progress, "Plan progress retrieved successfully"))
}
