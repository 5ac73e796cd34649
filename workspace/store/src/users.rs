use std::collections::HashMap;

use model::entities::{
    deal::Project,
    user::{self, Role},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::Store;
use crate::error::{Result, StoreError};
use crate::password::hash_password;

/// A user to be created. The password is plaintext and hashed here.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub project: Option<Project>,
}

/// Changes to an existing user. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    /// Must already be hashed with [`crate::password::hash_password`]
    pub password_hash: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<Option<String>>,
    pub role: Option<Role>,
    pub project: Option<Option<Project>>,
    pub is_active: Option<bool>,
}

impl Store {
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> Result<Option<user::Model>> {
        Ok(user::Entity::find_by_id(id).one(&self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?)
    }

    #[instrument(skip(self, new_user), fields(username = %new_user.username))]
    pub async fn create_user(&self, new_user: NewUser) -> Result<user::Model> {
        if self.get_user_by_username(&new_user.username).await?.is_some() {
            return Err(StoreError::invalid("username", "Username is already taken"));
        }

        let password_hash = hash_password(&new_user.password).await?;
        let model = user::ActiveModel {
            username: Set(new_user.username),
            password_hash: Set(password_hash),
            full_name: Set(new_user.full_name),
            email: Set(new_user.email),
            role: Set(new_user.role),
            project: Set(new_user.project),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(user_id = %model.id, "Created user");
        Ok(model)
    }

    #[instrument(skip(self, changes))]
    pub async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<user::Model> {
        let existing = user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::not_found("user", id))?;

        if let Some(username) = &changes.username {
            if *username != existing.username {
                if self.get_user_by_username(username).await?.is_some() {
                    return Err(StoreError::invalid("username", "Username is already taken"));
                }
            }
        }

        let mut active = existing.into_active_model();
        if let Some(username) = changes.username {
            active.username = Set(username);
        }
        if let Some(password_hash) = changes.password_hash {
            active.password_hash = Set(password_hash);
        }
        if let Some(full_name) = changes.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(role) = changes.role {
            active.role = Set(role);
        }
        if let Some(project) = changes.project {
            active.project = Set(project);
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }

        let model = active.update(&self.db).await?;
        debug!(user_id = %model.id, "Updated user");
        Ok(model)
    }

    /// All users ordered by full name.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<user::Model>> {
        Ok(user::Entity::find()
            .order_by_asc(user::Column::FullName)
            .all(&self.db)
            .await?)
    }

    /// Active users with the manager role, ordered by full name.
    #[instrument(skip(self))]
    pub async fn list_active_managers(&self) -> Result<Vec<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Role.eq(Role::Manager))
            .filter(user::Column::IsActive.eq(true))
            .order_by_asc(user::Column::FullName)
            .all(&self.db)
            .await?)
    }

    /// Loads the given users keyed by id; unknown ids are skipped.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn users_by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, user::Model>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut unique = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        Ok(user::Entity::find()
            .filter(user::Column::Id.is_in(unique))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect())
    }
}
