//! Handlers for `/invitations` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/invitations` | Admin. Body: `{"role":"manager","expiry_days":7}` |
//! | `GET`    | `/invitations` | Admin. Newest first |
//! | `GET`    | `/invitations/verify/{code}` | No credentials; 404 unless redeemable |
//! | `DELETE` | `/invitations/{id}` | Admin |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use roster_core::{
  InvitationRole, Role,
  invitation::{self, InvitationCode},
  store::DirectoryStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, Backend, auth::Principal, error::ApiError};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub role:        InvitationRole,
  /// Falls back to `default_invitation_expiry_days`.
  pub expiry_days: Option<i64>,
}

/// `POST /invitations`
pub async fn create<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  principal.require(Role::Admin)?;
  let days = body.expiry_days.unwrap_or(state.config.default_invitation_expiry_days);
  let issued =
    invitation::generate(state.store.as_ref(), body.role, days, Some(&principal.profile)).await?;
  Ok((StatusCode::CREATED, Json(issued)))
}

// ─── List / delete ────────────────────────────────────────────────────────────

/// `GET /invitations`
pub async fn list<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
) -> Result<Json<Vec<InvitationCode>>, ApiError> {
  principal.require(Role::Admin)?;
  let codes = state.store.list_invitations().await.map_err(ApiError::store)?;
  Ok(Json(codes))
}

/// `DELETE /invitations/{id}`
pub async fn delete_one<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  principal.require(Role::Admin)?;
  if state.store.delete_invitation(id).await.map_err(ApiError::store)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("invitation {id}")))
  }
}

// ─── Verify ───────────────────────────────────────────────────────────────────

/// What an unauthenticated caller learns about a code.
#[derive(Debug, Serialize)]
pub struct VerifiedCode {
  pub role:       InvitationRole,
  pub expires_at: DateTime<Utc>,
}

/// `GET /invitations/verify/{code}`
pub async fn verify<S: Backend>(
  State(state): State<AppState<S>>,
  Path(code): Path<String>,
) -> Result<Json<VerifiedCode>, ApiError> {
  let found = invitation::verify(state.store.as_ref(), &code)
    .await?
    .ok_or(roster_core::Error::InvitationNotFound)?;
  Ok(Json(VerifiedCode { role: found.role, expires_at: found.expires_at }))
}
