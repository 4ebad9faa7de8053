//! Handlers for `/leave-requests` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/leave-requests` | Employees see only their own |
//! | `POST`   | `/leave-requests` | Files a request for the caller |
//! | `GET`    | `/leave-requests/feed` | Server-sent `snapshot` events |
//! | `GET`    | `/leave-requests/{id}` | Owner or manager |
//! | `DELETE` | `/leave-requests/{id}` | Admin |
//! | `POST`   | `/leave-requests/{id}/review` | Manager. Body: `{"decision":"approve"}` |
//! | `POST`   | `/leave-requests/{id}/cancel` | Owner, while pending |

use std::convert::Infallible;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::{
    IntoResponse,
    sse::{Event, KeepAlive, Sse},
  },
};
use futures::{Stream, stream};
use roster_core::{
  Role,
  directory::{self, LeaveDraft, can_view_leave, leave_scope},
  leave::{LeaveDecision, LeaveQuery, LeaveRequest},
  store::DirectoryStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, Backend, auth::Principal, error::ApiError};

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /leave-requests`
pub async fn list<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Query(query): Query<LeaveQuery>,
) -> Result<Json<Vec<LeaveRequest>>, ApiError> {
  let query = leave_scope(&principal.profile, query);
  let requests = state.store.list_leave_requests(&query).await.map_err(ApiError::store)?;
  Ok(Json(requests))
}

/// `GET /leave-requests/{id}`
pub async fn get_one<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(id): Path<Uuid>,
) -> Result<Json<LeaveRequest>, ApiError> {
  let request = state
    .store
    .get_leave_request(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("leave request {id}")))?;
  if !can_view_leave(&principal.profile, &request) {
    return Err(roster_core::Error::PermissionDenied("not your leave request".into()).into());
  }
  Ok(Json(request))
}

/// `GET /leave-requests/feed`
///
/// Sends the caller's visible requests as a `snapshot` event, then a fresh
/// one after every change. If the first snapshot misses the listener
/// deadline the stream sends one `error` event and ends. Closing the
/// connection ends the subscription.
pub async fn feed<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Query(query): Query<LeaveQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
  let query = leave_scope(&principal.profile, query);
  let subscription = state.store.subscribe_leave_requests(query);
  let deadline = state.config.listener_timeout();
  tracing::debug!(uid = %principal.identity.uid, "leave feed opened");

  let events = stream::unfold(Some((subscription, true)), move |next| async move {
    let (mut sub, first) = next?;
    let snapshot = if first {
      match sub.next_within(deadline).await {
        Ok(snapshot) => snapshot.map(Ok),
        Err(e) => {
          tracing::warn!(error = %e, "leave feed produced no first snapshot");
          return Some((Ok::<_, Infallible>(error_event(&e)), None));
        }
      }
    } else {
      sub.next().await
    };

    let event = match snapshot? {
      Ok(requests) => snapshot_event(&requests),
      Err(e) => {
        tracing::warn!(error = %e, "leave feed read failed");
        error_event(&e)
      }
    };
    Some((Ok(event), Some((sub, false))))
  });

  Sse::new(events).keep_alive(KeepAlive::default())
}

fn snapshot_event(requests: &[LeaveRequest]) -> Event {
  Event::default()
    .event("snapshot")
    .json_data(requests)
    .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}

fn error_event(e: &roster_core::Error) -> Event {
  Event::default().event("error").data(e.to_string())
}

// ─── Write ────────────────────────────────────────────────────────────────────

/// `POST /leave-requests`
pub async fn create<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Json(body): Json<LeaveDraft>,
) -> Result<impl IntoResponse, ApiError> {
  let request = directory::submit_leave(state.store.as_ref(), &principal.profile, body).await?;
  Ok((StatusCode::CREATED, Json(request)))
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub decision: LeaveDecision,
  pub comment:  Option<String>,
}

/// `POST /leave-requests/{id}/review`
pub async fn review<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(id): Path<Uuid>,
  Json(body): Json<ReviewBody>,
) -> Result<Json<LeaveRequest>, ApiError> {
  let request = directory::review_leave(
    state.store.as_ref(),
    &principal.profile,
    id,
    body.decision,
    body.comment,
  )
  .await?;
  Ok(Json(request))
}

/// `POST /leave-requests/{id}/cancel`
pub async fn cancel<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(id): Path<Uuid>,
) -> Result<Json<LeaveRequest>, ApiError> {
  let request = directory::cancel_leave(state.store.as_ref(), &principal.profile, id).await?;
  Ok(Json(request))
}

/// `DELETE /leave-requests/{id}`
pub async fn delete_one<S: Backend>(
  State(state): State<AppState<S>>,
  principal: Principal,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  principal.require(Role::Admin)?;
  if state.store.delete_leave_request(id).await.map_err(ApiError::store)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("leave request {id}")))
  }
}
