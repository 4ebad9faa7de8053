//! Handlers for `/employees` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/employees` | Manager. `?department=&status=&is_registered=` |
//! | `POST`   | `/employees` | Admin. Pre-provisions an unregistered record |
//! | `GET`    | `/employees/{id}` | Manager |
//! | `PATCH`  | `/employees/{id}` | Admin |
//! | `DELETE` | `/employees/{id}` | Admin |
//! | `POST`   | `/employees/{id}/status` | Admin. Body: `{"status":"inactive"}` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  Role, directory,
  employee::{EmployeeProfile, EmployeeQuery, EmployeeStatus, EmployeeUpdate, NewEmployee},
  store::DirectoryStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, Backend, auth::Principal, error::ApiError};

/// `GET /employees`
pub async fn list<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Query(query): Query<EmployeeQuery>,
) -> Result<Json<Vec<EmployeeProfile>>, ApiError> {
  principal.require(Role::Manager)?;
  let employees = state.store.list_employees(&query).await.map_err(ApiError::store)?;
  Ok(Json(employees))
}

/// `POST /employees`
pub async fn create<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Json(body): Json<NewEmployee>,
) -> Result<impl IntoResponse, ApiError> {
  principal.require(Role::Admin)?;
  let employee = directory::create_employee(state.store.as_ref(), body).await?;
  Ok((StatusCode::CREATED, Json(employee)))
}

/// `GET /employees/{id}`
pub async fn get_one<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(id): Path<Uuid>,
) -> Result<Json<EmployeeProfile>, ApiError> {
  principal.require(Role::Manager)?;
  let employee = state
    .store
    .get_employee(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("employee {id}")))?;
  Ok(Json(employee))
}

/// `PATCH /employees/{id}`
pub async fn update<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(id): Path<Uuid>,
  Json(body): Json<EmployeeUpdate>,
) -> Result<Json<EmployeeProfile>, ApiError> {
  principal.require(Role::Admin)?;
  let employee = directory::update_employee(state.store.as_ref(), id, body).await?;
  Ok(Json(employee))
}

/// `DELETE /employees/{id}`
pub async fn delete_one<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  principal.require(Role::Admin)?;
  if state.store.delete_employee(id).await.map_err(ApiError::store)? {
    tracing::info!(%id, by = %principal.identity.uid, "employee deleted");
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("employee {id}")))
  }
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: EmployeeStatus,
}

/// `POST /employees/{id}/status`
pub async fn set_status<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<EmployeeProfile>, ApiError> {
  principal.require(Role::Admin)?;
  let update = EmployeeUpdate { status: Some(body.status), ..Default::default() };
  let employee = directory::update_employee(state.store.as_ref(), id, update).await?;
  Ok(Json(employee))
}
