use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use indexmap::IndexMap;
use log::{debug, info};
use serde_json::json;

use crate::{
    api::parse_id,
    error::AppError,
    models::Task,
    schema::{NewTask, RescoreResponse, TasksByQuadrant},
    scoring::Quadrant,
    state::AppState,
};

pub async fn create_task(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<NewTask>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let task = app_state
        .storage
        .create_task(req, Utc::now(), app_state.config.days_when_urgent)?;
    info!(
        "New task {}: urgency {:.3}, importance {:.3}, quadrant {} ({})",
        task.id,
        task.urgency_score,
        task.imp_score,
        task.quadrant.number(),
        task.quadrant.label()
    );
    Ok(Json(task))
}

pub async fn list_tasks(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.storage.list_tasks()?))
}

/// Group open tasks into quadrants, most urgent first within each.
pub fn group_by_quadrant(mut tasks: Vec<Task>) -> TasksByQuadrant {
    tasks.sort_by(|a, b| {
        b.urgency_score
            .total_cmp(&a.urgency_score)
            .then(b.imp_score.total_cmp(&a.imp_score))
            .then(a.id.cmp(&b.id))
    });

    let mut quadrants: IndexMap<String, Vec<Task>> = Quadrant::ALL
        .iter()
        .map(|q| (q.number().to_string(), Vec::new()))
        .collect();
    for task in tasks {
        quadrants
            .entry(task.quadrant.number().to_string())
            .or_default()
            .push(task);
    }
    TasksByQuadrant { quadrants }
}

pub async fn tasks_by_quadrant(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let open = app_state.storage.list_open_tasks()?;
    Ok(Json(group_by_quadrant(open)))
}

pub async fn rescore_tasks(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state
        .storage
        .rescore_open_tasks(Utc::now(), app_state.config.days_when_urgent)?;
    debug!(
        "Rescored {} open tasks, {} changed",
        summary.rescored, summary.changed
    );
    Ok(Json(RescoreResponse {
        rescored: summary.rescored,
        changed: summary.changed,
    }))
}

pub async fn toggle_task_done(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let task = app_state.storage.toggle_task_done(id)?;
    info!("Task {} marked done={}", task.id, task.is_done);
    Ok(Json(task))
}

pub async fn delete_task(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    app_state.storage.delete_task(id)?;
    info!("Deleted task {id}");
    Ok(Json(json!({
        "message": format!("Task {id} deleted successfully")
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task(id: u64, urgency_score: f64, imp_score: f64, quadrant: Quadrant) -> Task {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Task {
            id,
            description: format!("task {id}"),
            is_done: false,
            due_date: None,
            estimated_effort_hours: 1.0,
            importance: 3,
            category_id: 1,
            urgency_score,
            imp_score,
            quadrant,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_group_by_quadrant_keeps_all_buckets_in_order() {
        let grouped = group_by_quadrant(vec![task(1, 0.1, 1.5, Quadrant::Eliminate)]);
        let keys: Vec<&str> = grouped.quadrants.keys().map(String::as_str).collect();
        assert_eq!(keys, ["1", "2", "3", "4"]);
        assert!(grouped.quadrants["1"].is_empty());
        assert_eq!(grouped.quadrants["4"].len(), 1);
    }

    #[test]
    fn test_group_by_quadrant_sorts_most_urgent_first() {
        let grouped = group_by_quadrant(vec![
            task(1, 0.6, 4.0, Quadrant::DoNow),
            task(2, 0.9, 3.5, Quadrant::DoNow),
            task(3, 0.9, 4.5, Quadrant::DoNow),
            task(4, 0.2, 3.0, Quadrant::Schedule),
        ]);
        let ids: Vec<u64> = grouped.quadrants["1"].iter().map(|t| t.id).collect();
        assert_eq!(ids, [3, 2, 1]);
        assert_eq!(grouped.quadrants["2"][0].id, 4);
    }
}
