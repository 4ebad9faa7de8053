//! Handlers for `/departments` endpoints.
//!
//! Any signed-in caller may read departments; only admins change them.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  Role, ValidationError,
  department::{Department, DepartmentUpdate, NewDepartment},
  store::DirectoryStore,
};
use uuid::Uuid;

use crate::{AppState, Backend, auth::Principal, error::ApiError};

/// `GET /departments`
pub async fn list<S: Backend>(
  State(state): State<AppState<S>>,
  _principal: Principal,
) -> Result<Json<Vec<Department>>, ApiError> {
  let departments = state.store.list_departments().await.map_err(ApiError::store)?;
  Ok(Json(departments))
}

/// `POST /departments`
pub async fn create<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Json(body): Json<NewDepartment>,
) -> Result<impl IntoResponse, ApiError> {
  principal.require(Role::Admin)?;
  if body.name.trim().is_empty() {
    return Err(roster_core::Error::from(ValidationError::Required("name")).into());
  }
  let department = state.store.create_department(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(department)))
}

/// `GET /departments/{id}`
pub async fn get_one<S: Backend>(
  State(state): State<AppState<S>>,
  _principal: Principal,
  Path(id): Path<Uuid>,
) -> Result<Json<Department>, ApiError> {
  let department = state
    .store
    .get_department(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("department {id}")))?;
  Ok(Json(department))
}

/// `PATCH /departments/{id}`
pub async fn update<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(id): Path<Uuid>,
  Json(body): Json<DepartmentUpdate>,
) -> Result<Json<Department>, ApiError> {
  principal.require(Role::Admin)?;
  let department = state
    .store
    .update_department(id, body)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("department {id}")))?;
  Ok(Json(department))
}

/// `DELETE /departments/{id}`
pub async fn delete_one<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  principal.require(Role::Admin)?;
  if state.store.delete_department(id).await.map_err(ApiError::store)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("department {id}")))
  }
}
