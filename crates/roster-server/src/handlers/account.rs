//! Health, the caller's own profile, and registration.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/health` | No credentials |
//! | `GET`  | `/me` | The resolved profile of the caller |
//! | `POST` | `/register` | Uses the configured registration mode |
//! | `POST` | `/register/invitation` | Flow A, requires `invitation_code` |
//! | `POST` | `/register/employee` | Flow B, requires a pending employee record |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use roster_core::{
  registration::{Registered, RegistrationMode, RegistrationRequest},
  user::UserProfile,
};
use serde_json::{Value, json};

use crate::{AppState, Backend, auth::Principal, error::ApiError};

/// `GET /health`
pub async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

/// `GET /me`
pub async fn me(principal: Principal) -> Json<UserProfile> { Json(principal.profile) }

async fn register_with<S: Backend>(
  state: &AppState<S>,
  mode: RegistrationMode,
  request: RegistrationRequest,
) -> Result<(StatusCode, Json<Registered>), ApiError> {
  let store = state.store.as_ref();
  let registered = mode.register(store, store, request).await?;
  Ok((StatusCode::CREATED, Json(registered)))
}

/// `POST /register`
pub async fn register<S: Backend>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegistrationRequest>,
) -> Result<impl IntoResponse, ApiError> {
  let mode = state.config.registration_mode;
  register_with(&state, mode, body).await
}

/// `POST /register/invitation`
pub async fn register_invitation<S: Backend>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegistrationRequest>,
) -> Result<impl IntoResponse, ApiError> {
  register_with(&state, RegistrationMode::Invitation, body).await
}

/// `POST /register/employee`
pub async fn register_employee<S: Backend>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegistrationRequest>,
) -> Result<impl IntoResponse, ApiError> {
  register_with(&state, RegistrationMode::Employee, body).await
}
