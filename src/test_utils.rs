use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use migration::{Migrator, MigratorTrait};
use model::entities::{deal::Project, user::{self, Role}};
use sea_orm::{Database, DatabaseConnection};
use store::{NewUser, Store};
use uuid::Uuid;

use crate::router::create_router;
use crate::schemas::AppState;

/// Create an in-memory SQLite database for testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Create AppState for testing
pub async fn setup_test_app_state() -> AppState {
    AppState::new(setup_test_db().await)
}

/// Initialize tracing for tests. Output goes through the test writer, so it
/// only shows for failing tests; `RUST_LOG` overrides the default filter.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "salesdesk=debug,compute=debug,store=debug".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A running test server plus direct access to its store for seeding.
pub struct TestApp {
    pub server: TestServer,
    pub store: Store,
}

/// Create the full application over a fresh database
pub async fn setup_test_app() -> TestApp {
    init_test_tracing();

    let state = setup_test_app_state().await;
    let store = state.store.clone();
    let server = TestServer::new(create_router(state)).expect("Failed to start test server");

    TestApp { server, store }
}

impl TestApp {
    /// Insert a user directly, bypassing the API.
    pub async fn seed_user(&self, username: &str, role: Role, project: Option<Project>) -> user::Model {
        self.store
            .create_user(NewUser {
                username: username.to_string(),
                password: "password123".to_string(),
                full_name: format!("{username} user"),
                email: None,
                role,
                project,
            })
            .await
            .expect("Failed to seed user")
    }

    pub async fn seed_admin(&self) -> user::Model {
        self.seed_user("admin", Role::Admin, None).await
    }

    pub async fn seed_manager(&self, username: &str) -> user::Model {
        self.seed_user(username, Role::Manager, Some(Project::Amazon)).await
    }
}

/// Attach the caller's identity header.
pub fn as_user(request: TestRequest, user_id: Uuid) -> TestRequest {
    request.add_header(
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(&user_id.to_string()).expect("uuid is a valid header value"),
    )
}
