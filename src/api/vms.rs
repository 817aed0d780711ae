//! Provisioning endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::vm::{Vm, VmCreationTask, VmDeployment, VmSpec};
use crate::AppState;

/// POST /vms — accept a VM creation request
pub async fn create_vm(
    State(state): State<Arc<AppState>>,
    Json(spec): Json<VmSpec>,
) -> Result<(StatusCode, Json<VmCreationTask>), AppError> {
    let task = state.provisioning.create_vm(spec)?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /vms
pub async fn list_vms(State(state): State<Arc<AppState>>) -> Json<Vec<Vm>> {
    Json(state.provisioning.list_vms())
}

/// GET /vms/:id
pub async fn get_vm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vm>, AppError> {
    state
        .provisioning
        .vm(&id)
        .map(Json)
        .ok_or(AppError::NotFound("vm"))
}

/// GET /tasks
pub async fn list_tasks(State(state): State<Arc<AppState>>) -> Json<Vec<VmCreationTask>> {
    Json(state.provisioning.list_tasks())
}

/// GET /deployments
pub async fn list_deployments(State(state): State<Arc<AppState>>) -> Json<Vec<VmDeployment>> {
    Json(state.provisioning.list_deployments())
}

/// GET /deployments/:id
pub async fn get_deployment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<VmDeployment>, AppError> {
    state
        .provisioning
        .deployment(&id)
        .map(Json)
        .ok_or(AppError::NotFound("deployment"))
}
