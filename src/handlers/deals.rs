use axum::{
    extract::{Path, Query, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
    response::Json,
};
use common::{ApiResponse, CreateDealRequest, DealDto, DealListQuery, DealListResponse, UpdateDealRequest};
use compute::deals;
use tracing::{debug, info, instrument, trace};
use uuid::Uuid;

use crate::helpers::{errors::ApiError, identity::CurrentUser, response::respond};
use crate::schemas::{AppState, ErrorResponse};

/// List deals visible to the caller; managers only see their own
#[utoipa::path(
    get,
    path = "/api/v1/deals",
    tag = "deals",
    params(
        DealListQuery,
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    responses(
        (status = 200, description = "Deals retrieved successfully", body = ApiResponse<DealListResponse>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Missing or unknown identity", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_deals(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(query): Query<DealListQuery>,
) -> Result<Json<ApiResponse<DealListResponse>>, ApiError> {
    trace!("Entering list_deals function");
    let page = deals::list_deals(&state.store, &identity, &query).await?;
    debug!(
        "Retrieved {} deals (page {} of {}, {} total)",
        page.deals.len(),
        page.pagination.page,
        page.pagination.pages,
        page.pagination.total
    );
    Ok(respond(page, "Deals retrieved successfully"))
}

/// Get a specific deal by ID
#[utoipa::path(
    get,
    path = "/api/v1/deals/{deal_id}",
    tag = "deals",
    params(
        ("deal_id" = Uuid, Path, description = "Deal ID"),
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    responses(
        (status = 200, description = "Deal retrieved successfully", body = ApiResponse<DealDto>),
        (status = 403, description = "Deal belongs to another manager", body = ErrorResponse),
        (status = 404, description = "Deal not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_deal(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    deal_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<DealDto>>, ApiError> {
    let Path(deal_id) = deal_id?;
    trace!("Entering get_deal function for deal_id: {}", deal_id);
    let deal = deals::get_deal(&state.store, &identity, deal_id).await?;
    Ok(respond(deal, "Deal retrieved successfully"))
}

/// Create a new deal
///
/// Managers always create deals for themselves; admins must name the manager.
#[utoipa::path(
    post,
    path = "/api/v1/deals",
    tag = "deals",
    params(("X-User-Id" = Uuid, Header, description = "Id of the calling user")),
    request_body = CreateDealRequest,
    responses(
        (status = 201, description = "Deal created successfully", body = ApiResponse<DealDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Role may not create deals", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn create_deal(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    payload: Result<Json<CreateDealRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<DealDto>>), ApiError> {
    trace!("Entering create_deal function");
    let Json(request) = payload?;
    debug!("Creating deal for client: {}", request.client_name);

    let deal = deals::create_deal(&state.store, &identity, request).await?;
    info!(
        "Deal created successfully with ID: {}, remaining: {}",
        deal.id, deal.remaining_amount
    );
    Ok((StatusCode::CREATED, respond(deal, "Deal created successfully")))
}

/// Update a deal
#[utoipa::path(
    put,
    path = "/api/v1/deals/{deal_id}",
    tag = "deals",
    params(
        ("deal_id" = Uuid, Path, description = "Deal ID"),
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    request_body = UpdateDealRequest,
    responses(
        (status = 200, description = "Deal updated successfully", body = ApiResponse<DealDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Deal belongs to another manager", body = ErrorResponse),
        (status = 404, description = "Deal not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn update_deal(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    deal_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateDealRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<DealDto>>, ApiError> {
    let Path(deal_id) = deal_id?;
    trace!("Entering update_deal function for deal_id: {}", deal_id);
    let Json(request) = payload?;

    let deal = deals::update_deal(&state.store, &identity, deal_id, request).await?;
    info!("Deal {} updated, remaining: {}", deal_id, deal.remaining_amount);
    Ok(respond(deal, "Deal updated successfully"))
}

/// Delete a deal (admin only)
#[utoipa::path(
    delete,
    path = "/api/v1/deals/{deal_id}",
    tag = "deals",
    params(
        ("deal_id" = Uuid, Path, description = "Deal ID"),
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    responses(
        (status = 200, description = "Deal deleted successfully", body = ApiResponse<String>),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Deal not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_deal(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    deal_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let Path(deal_id) = deal_id?;
    trace!("Entering delete_deal function for deal_id: {}", deal_id);

    deals::delete_deal(&state.store, &identity, deal_id).await?;
    info!("Deal {} deleted", deal_id);
    Ok(respond(
        format!("Deal {deal_id} deleted"),
        "Deal deleted successfully",
    ))
}
