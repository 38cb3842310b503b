use std::{collections::BTreeMap, sync::Arc};

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use log::info;
use serde_json::json;

use crate::{
    api::parse_id,
    error::AppError,
    schema::{
        COEFFICIENT_SUM_TOLERANCE, CategorySetupRequest, NewCategory, ScoringPolicyResponse,
        SetupStatusResponse,
    },
    state::AppState,
};

pub async fn list_categories(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.storage.list_categories()?))
}

pub async fn create_category(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<NewCategory>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let category = app_state.storage.create_category(req)?;
    info!(
        "New category {} '{}' (coefficient {})",
        category.id, category.name, category.coefficient
    );
    Ok(Json(category))
}

pub async fn create_bulk_categories(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<CategorySetupRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let created = app_state.storage.create_categories(req.categories)?;
    info!("Created {} categories in bulk", created.len());
    Ok(Json(created))
}

pub async fn delete_category(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let category = app_state.storage.delete_category(id)?;
    info!("Deleted category {} '{}'", category.id, category.name);
    Ok(Json(json!({
        "message": format!("Category {id} deleted successfully")
    })))
}

/// Setup counts as complete once categories exist and their weights add up.
pub async fn setup_status(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let categories = app_state.storage.list_categories()?;
    let total: f64 = categories.iter().map(|c| c.coefficient).sum();
    Ok(Json(SetupStatusResponse {
        setup_complete: !categories.is_empty()
            && (total - 1.0).abs() <= COEFFICIENT_SUM_TOLERANCE,
        category_count: categories.len(),
    }))
}

pub async fn get_policy(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let category_weights: BTreeMap<u64, f64> = app_state
        .storage
        .list_categories()?
        .into_iter()
        .map(|c| (c.id, c.coefficient))
        .collect();
    Ok(Json(ScoringPolicyResponse {
        policy: app_state.policy(),
        category_weights,
    }))
}
