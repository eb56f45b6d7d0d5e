use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::{AppJson, AppPath, AppQuery, AppState};
use crate::error::AppError;
use crate::models::{Project, ProjectPatch, ProjectPayload};

const DEFAULT_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// Ids outside the `SERIAL` column's range cannot name a stored row.
fn project_id(id: i64) -> Result<i32, AppError> {
    i32::try_from(id).map_err(|_| AppError::NotFound)
}

pub async fn create_project(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ProjectPayload>,
) -> Result<Json<Project>, AppError> {
    let project = payload.validate()?;
    let created = state.store.create(project).await?;

    Ok(Json(created))
}

pub async fn list_projects(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Vec<Project>>, AppError> {
    let limit = params.limit.min(state.max_list_limit);
    let projects = state.store.list(params.skip, limit).await?;

    Ok(Json(projects))
}

pub async fn get_project(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Project>, AppError> {
    let project = state.store.get(project_id(id)?).await?.ok_or(AppError::NotFound)?;

    Ok(Json(project))
}

pub async fn update_project(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(patch): AppJson<ProjectPatch>,
) -> Result<Json<Project>, AppError> {
    let changes = patch.validate()?;
    let project = state
        .store
        .update(project_id(id)?, changes)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode, AppError> {
    state.store.delete(project_id(id)?).await?.ok_or(AppError::NotFound)?;

    Ok(StatusCode::NO_CONTENT)
}
