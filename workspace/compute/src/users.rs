//! User administration. Admins manage accounts; everybody can see themselves.

use common::{CreateUserRequest, FieldError, UpdateUserRequest, UserDto};
use model::entities::{deal::Project, user::Role};
use store::{NewUser, Store, UserChanges, password::hash_password};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::convert::user_dto;
use crate::error::{AccessError, Result};
use crate::identity::Identity;
use crate::policy::{Operation, Resource, authorize};
use crate::validation::{FieldErrors, parse_enum, parse_project};

fn parse_role(field: &str, value: &str) -> std::result::Result<Role, FieldError> {
    parse_enum(field, value, Role::parse, "admin, manager, financist")
}

/// Only managers carry a project.
fn project_for(role: Role, project: Option<Project>) -> Option<Project> {
    if role == Role::Manager { project } else { None }
}

#[instrument(skip(store))]
pub async fn list_users(store: &Store, identity: &Identity) -> Result<Vec<UserDto>> {
    let scope = authorize(identity, Resource::User, Operation::Read)?;

    let users = store.list_users().await?;
    Ok(users
        .iter()
        .filter(|user| scope.permits(user.id))
        .map(user_dto)
        .collect())
}

#[instrument(skip(store))]
pub async fn get_user(store: &Store, identity: &Identity, user_id: Uuid) -> Result<UserDto> {
    let scope = authorize(identity, Resource::User, Operation::Read)?;

    let user = store
        .get_user(user_id)
        .await?
        .ok_or_else(|| AccessError::NotFound("User".to_string()))?;
    if !scope.permits(user.id) {
        warn!(%user_id, caller = %identity.user_id, "User profile of someone else requested");
        return Err(AccessError::Forbidden);
    }

    Ok(user_dto(&user))
}

/// The caller's own profile.
#[instrument(skip(store))]
pub async fn me(store: &Store, identity: &Identity) -> Result<UserDto> {
    get_user(store, identity, identity.user_id).await
}

#[instrument(skip(store, request), fields(username = %request.username))]
pub async fn create_user(
    store: &Store,
    identity: &Identity,
    request: CreateUserRequest,
) -> Result<UserDto> {
    authorize(identity, Resource::User, Operation::Create)?;

    let mut errors = FieldErrors::validate(&request);
    let role = errors.check(parse_role("role", &request.role));
    let project = errors.check_opt(request.project.as_deref(), |v| parse_project("project", v));
    errors.finish()?;
    let Some(role) = role else {
        return Err(AccessError::invalid("role", "Role is required"));
    };

    let created = store
        .create_user(NewUser {
            username: request.username.trim().to_string(),
            password: request.password,
            full_name: request.full_name.trim().to_string(),
            email: request.email.filter(|e| !e.trim().is_empty()),
            role,
            project: project_for(role, project),
        })
        .await?;

    info!(user_id = %created.id, ?role, "User created");
    Ok(user_dto(&created))
}

/// Updates a user. Changing the role away from manager clears the project.
#[instrument(skip(store, request))]
pub async fn update_user(
    store: &Store,
    identity: &Identity,
    user_id: Uuid,
    request: UpdateUserRequest,
) -> Result<UserDto> {
    authorize(identity, Resource::User, Operation::Update)?;

    let mut errors = FieldErrors::validate(&request);
    let role = errors.check_opt(request.role.as_deref(), |v| parse_role("role", v));
    let project = errors.check_opt(
        request.project.as_deref().filter(|v| !v.trim().is_empty()),
        |v| parse_project("project", v),
    );
    errors.finish()?;

    let existing = store
        .get_user(user_id)
        .await?
        .ok_or_else(|| AccessError::NotFound("User".to_string()))?;

    let effective_role = role.unwrap_or(existing.role);
    let project = if effective_role != Role::Manager {
        existing.project.map(|_| None)
    } else if request.project.is_some() {
        Some(project)
    } else {
        None
    };

    let password_hash = match request.password {
        Some(password) => Some(hash_password(&password).await?),
        None => None,
    };

    let updated = store
        .update_user(
            user_id,
            UserChanges {
                username: request.username.map(|u| u.trim().to_string()),
                password_hash,
                full_name: request.full_name.map(|n| n.trim().to_string()),
                email: request
                    .email
                    .map(|e| Some(e.trim().to_string()).filter(|e| !e.is_empty())),
                role,
                project,
                is_active: request.is_active,
            },
        )
        .await?;

    info!(%user_id, "User updated");
    Ok(user_dto(&updated))
}

/// Soft delete: the account stays for history but can no longer act.
#[instrument(skip(store))]
pub async fn deactivate_user(store: &Store, identity: &Identity, user_id: Uuid) -> Result<UserDto> {
    authorize(identity, Resource::User, Operation::Delete)?;

    let updated = store
        .update_user(
            user_id,
            UserChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await?;

    info!(%user_id, "User deactivated");
    Ok(user_dto(&updated))
}
