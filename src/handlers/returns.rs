use axum::{
    extract::{Path, Query, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use common::{
    ApiResponse, CreateReturnRequest, ReturnDto, ReturnListQuery, ReturnListResponse,
    UpdateReturnRequest,
};
use compute::returns;
use tracing::{debug, info, instrument, trace};
use uuid::Uuid;

use crate::helpers::{errors::ApiError, identity::CurrentUser, response::respond};
use crate::schemas::{AppState, ErrorResponse};

/// List returns on deals visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/returns",
    tag = "returns",
    params(
        ReturnListQuery,
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    responses(
        (status = 200, description = "Returns retrieved successfully", body = ApiResponse<ReturnListResponse>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Missing or unknown identity", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_returns(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(query): Query<ReturnListQuery>,
) -> Result<Json<ApiResponse<ReturnListResponse>>, ApiError> {
    trace!("Entering list_returns function");
    let page = returns::list_returns(&state.store, &identity, &query).await?;
    debug!("Retrieved {} of {} returns", page.returns.len(), page.pagination.total);
    Ok(respond(page, "Returns retrieved successfully"))
}

/// Register a return against a deal
///
/// The return starts in `requested`; the deal's paid amount is not touched.
#[utoipa::path(
    post,
    path = "/api/v1/returns",
    tag = "returns",
    params(("X-User-Id" = Uuid, Header, description = "Id of the calling user")),
    request_body = CreateReturnRequest,
    responses(
        (status = 201, description = "Return created successfully", body = ApiResponse<ReturnDto>),
        (status = 400, description = "Invalid request or amount above what was paid", body = ErrorResponse),
        (status = 403, description = "Deal belongs to another manager", body = ErrorResponse),
        (status = 404, description = "Deal not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn create_return(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    payload: Result<Json<CreateReturnRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ReturnDto>>), ApiError> {
    trace!("Entering create_return function");
    let Json(request) = payload?;
    debug!("Registering return against deal: {}", request.deal_id);

    let created = returns::create_return(&state.store, &identity, request, Utc::now()).await?;
    info!(
        "Return created successfully with ID: {}, amount: {}",
        created.id, created.return_amount
    );
    Ok((StatusCode::CREATED, respond(created, "Return created successfully")))
}

/// Process a return (admin only)
///
/// Completed and rejected returns can no longer change.
#[utoipa::path(
    put,
    path = "/api/v1/returns/{return_id}",
    tag = "returns",
    params(
        ("return_id" = Uuid, Path, description = "Return ID"),
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    request_body = UpdateReturnRequest,
    responses(
        (status = 200, description = "Return updated successfully", body = ApiResponse<ReturnDto>),
        (status = 400, description = "Invalid request or return already closed", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Return not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn update_return(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    return_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateReturnRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ReturnDto>>, ApiError> {
    let Path(return_id) = return_id?;
    trace!("Entering update_return function for return_id: {}", return_id);
    let Json(request) = payload?;

    let updated = returns::update_return(&state.store, &identity, return_id, request).await?;
    info!("Return {} is now {}", return_id, updated.status);
    Ok(respond(updated, "Return updated successfully"))
}
