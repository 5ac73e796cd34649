use crate::handlers::{
    analytics::{
        conversion_funnel, dashboard, managers_performance, monthly_report, overview,
        project_comparison, returns_analysis, revenue_trend, sales_chart, top_managers,
    },
    deals::{create_deal, delete_deal, get_deal, list_deals, update_deal},
    health::health_check,
    plans::{create_plan, list_plans, plan_progress, update_plan},
    returns::{create_return, list_returns, update_return},
    users::{create_user, deactivate_user, get_me, get_user, list_users, update_user},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    Router,
    routing::{get, put},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Users
        .route("/api/v1/me", get(get_me))
        .route("/api/v1/users", get(list_users).post(create_user))
        .route(
            "/api/v1/users/:user_id",
            get(get_user).put(update_user).delete(deactivate_user),
        )
        // Deals
        .route("/api/v1/deals", get(list_deals).post(create_deal))
        .route(
            "/api/v1/deals/:deal_id",
            get(get_deal).put(update_deal).delete(delete_deal),
        )
        // Returns
        .route("/api/v1/returns", get(list_returns).post(create_return))
        .route("/api/v1/returns/:return_id", put(update_return))
        // Plans
        .route("/api/v1/plans", get(list_plans).post(create_plan))
        .route("/api/v1/plans/:plan_id", put(update_plan))
        .route("/api/v1/plan-progress", get(plan_progress))
        // Analytics
        .route("/api/v1/analytics/dashboard", get(dashboard))
        .route("/api/v1/analytics/sales-chart", get(sales_chart))
        .route("/api/v1/analytics/overview", get(overview))
        .route("/api/v1/analytics/revenue-trend", get(revenue_trend))
        .route("/api/v1/analytics/project-comparison", get(project_comparison))
        .route("/api/v1/analytics/top-managers", get(top_managers))
        .route("/api/v1/analytics/managers-performance", get(managers_performance))
        .route("/api/v1/analytics/conversion-funnel", get(conversion_funnel))
        .route("/api/v1/analytics/returns-analysis", get(returns_analysis))
        .route("/api/v1/analytics/monthly-report", get(monthly_report))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    with_metrics(router)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Prometheus request metrics at `/metrics`. The recorder is process-global,
/// so test routers are built without it.
#[cfg(not(test))]
fn with_metrics(router: Router<AppState>) -> Router<AppState> {
    use axum_prometheus::PrometheusMetricLayer;

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
    router
        .route("/metrics", get(move || std::future::ready(metric_handle.render())))
        .layer(prometheus_layer)
}

#[cfg(test)]
fn with_metrics(router: Router<AppState>) -> Router<AppState> {
    router
}
