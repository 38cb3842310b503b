use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::*};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{error::AppResult, state::AppState};

pub mod categories;
pub mod tasks;

/// Build the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest(
            "/api",
            Router::new()
                .route(
                    "/categories",
                    get(categories::list_categories).post(categories::create_category),
                )
                .route("/categories/bulk", post(categories::create_bulk_categories))
                .route("/categories/{id}", delete(categories::delete_category))
                .route("/setup/status", get(categories::setup_status))
                .route("/policy", get(categories::get_policy))
                .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
                .route("/tasks/quadrants", get(tasks::tasks_by_quadrant))
                .route("/tasks/rescore", post(tasks::rescore_tasks))
                .route("/tasks/{id}/done", patch(tasks::toggle_task_done))
                .route("/tasks/{id}", delete(tasks::delete_task)),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Record ids arrive as path segments
pub(crate) fn parse_id(raw: &str) -> AppResult<u64> {
    Ok(raw.parse::<u64>()?)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello, World! DB connected." }))
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let (categories, tasks) = state.storage.get_stats();
    Json(json!({
        "status": "healthy",
        "categories": categories,
        "tasks": tasks,
        "timestamp": chrono::Utc::now()
    }))
}
