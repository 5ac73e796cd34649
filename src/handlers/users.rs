use axum::{
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
    response::Json,
};
use common::{ApiResponse, CreateUserRequest, UpdateUserRequest, UserDto};
use compute::users;
use tracing::{debug, info, instrument, trace};
use uuid::Uuid;

use crate::helpers::{errors::ApiError, identity::CurrentUser, response::respond};
use crate::schemas::{AppState, ErrorResponse};

/// The caller's own profile
#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "users",
    params(("X-User-Id" = Uuid, Header, description = "Id of the calling user")),
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<UserDto>),
        (status = 401, description = "Missing or unknown identity", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    trace!("Entering get_me function");
    let user = users::me(&state.store, &identity).await?;
    Ok(respond(user, "Profile retrieved successfully"))
}

/// Get all users visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    params(("X-User-Id" = Uuid, Header, description = "Id of the calling user")),
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<UserDto>>),
        (status = 401, description = "Missing or unknown identity", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    trace!("Entering list_users function");
    let users = users::list_users(&state.store, &identity).await?;
    info!("Retrieved {} users", users.len());
    Ok(respond(users, "Users retrieved successfully"))
}

/// Get a specific user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = Uuid, Path, description = "User ID"),
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserDto>),
        (status = 403, description = "Someone else's profile", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let Path(user_id) = user_id?;
    trace!("Entering get_user function for user_id: {}", user_id);
    let user = users::get_user(&state.store, &identity, user_id).await?;
    Ok(respond(user, "User retrieved successfully"))
}

/// Create a new user (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    params(("X-User-Id" = Uuid, Header, description = "Id of the calling user")),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    trace!("Entering create_user function");
    let Json(request) = payload?;
    debug!("Creating user with username: {}", request.username);

    let user = users::create_user(&state.store, &identity, request).await?;
    info!("User created successfully with ID: {}", user.id);
    Ok((StatusCode::CREATED, respond(user, "User created successfully")))
}

/// Update a user (admin only)
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = Uuid, Path, description = "User ID"),
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    user_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let Path(user_id) = user_id?;
    trace!("Entering update_user function for user_id: {}", user_id);
    let Json(request) = payload?;

    let user = users::update_user(&state.store, &identity, user_id, request).await?;
    info!("User {} updated successfully", user_id);
    Ok(respond(user, "User updated successfully"))
}

/// Deactivate a user (admin only). The account is kept for history.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = Uuid, Path, description = "User ID"),
        ("X-User-Id" = Uuid, Header, description = "Id of the calling user")
    ),
    responses(
        (status = 200, description = "User deactivated successfully", body = ApiResponse<UserDto>),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn deactivate_user(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let Path(user_id) = user_id?;
    trace!("Entering deactivate_user function for user_id: {}", user_id);

    let user = users::deactivate_user(&state.store, &identity, user_id).await?;
    info!("User {} deactivated", user_id);
    Ok(respond(user, "User deactivated successfully"))
}
