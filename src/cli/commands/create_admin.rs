use anyhow::{Context, Result, bail};
use model::entities::user::Role;
use store::{NewUser, Store};
use tracing::{error, info, trace};

use crate::config::connect;

/// Minimum accepted password length, matching the user API.
const MIN_PASSWORD_LEN: usize = 6;

pub async fn create_admin(
    database_url: &str,
    username: &str,
    full_name: &str,
    password: &str,
) -> Result<()> {
    trace!("Entering create_admin function");

    let username = username.trim();
    let full_name = full_name.trim();
    if username.len() < 3 {
        bail!("Username must be at least 3 characters");
    }
    if full_name.is_empty() {
        bail!("Full name must not be empty");
    }
    if password.len() < MIN_PASSWORD_LEN {
        bail!("Password must be at least {MIN_PASSWORD_LEN} characters");
    }

    let store = Store::new(connect(database_url).await?);
    let admin = match store
        .create_user(NewUser {
            username: username.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            email: None,
            role: Role::Admin,
            project: None,
        })
        .await
    {
        Ok(admin) => admin,
        Err(e) => {
            error!("Failed to create admin '{}': {}", username, e);
            return Err(e).context("creating admin account");
        }
    };

    info!("Admin '{}' created with id {}", admin.username, admin.id);
    println!("{}", admin.id);
    Ok(())
}
