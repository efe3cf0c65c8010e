//! API route definitions
//!
//! Defines all API routes and their associated handler functions.

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::api::handlers;
use crate::api::middleware::{cors_layer, logging_layer};
use crate::db::DatabaseConnection;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}

/// Build the complete API router
pub fn create_router(db: DatabaseConnection) -> Router {
    let app_state = AppState { db };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/system/health", get(handlers::health_detailed))
        .route("/api/v1/system/info", get(handlers::system_info))
        .route("/api/v1/system/metrics", get(handlers::system_metrics))
        .route(
            "/scripts/create",
            post(handlers::create_script),
        )
        .route("/scripts/list", get(handlers::list_scripts))
        .route("/scripts/:id", get(handlers::get_script))
        .route("/scripts/delete/:id", post(handlers::delete_script))
        .route(
            "/workflows/create",
            post(handlers::create_workflow),
        )
        .route("/workflows/list", get(handlers::list_workflows))
        .route("/workflows/:id", get(handlers::get_workflow))
        .route("/workflows/update/:id", put(handlers::update_workflow))
        .route(
            "/workflows/delete/:id",
            axum::routing::delete(handlers::delete_workflow),
        )
        .route(
            "/executions/create/:workflow_id",
            post(handlers::create_execution),
        )
        .route(
            "/executions/cancel/:id",
            post(handlers::cancel_execution),
        )
        .route("/executions/list", get(handlers::list_executions))
        .route("/executions/:id", get(handlers::get_execution))
        .with_state(app_state)
        .layer(logging_layer())
        .layer(cors_layer())
}

/// Create a router for testing. Exposed unconditionally so integration tests
/// under `tests/` (compiled as a separate crate, without `cfg(test)`) can use it.
pub fn create_test_router(db: DatabaseConnection) -> Router {
    create_router(db)
}
