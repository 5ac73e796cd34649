use anyhow::Result;
use sea_orm::{Database, DatabaseConnection};
use store::Store;
use tracing::{debug, error, info};

use crate::schemas::AppState;

/// Open the connection pool.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database: {}", database_url);
    match Database::connect(database_url).await {
        Ok(db) => {
            info!("Successfully connected to database");
            Ok(db)
        }
        Err(e) => {
            error!("Failed to connect to database '{}': {}", database_url, e);
            Err(e.into())
        }
    }
}

/// Initialize application state for the given database
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    let db = connect(database_url).await?;
    Ok(AppState::new(db))
}
