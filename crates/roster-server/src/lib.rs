//! JSON HTTP API for the Roster staff directory.
//!
//! Exposes an axum [`Router`] backed by anything implementing both
//! [`DirectoryStore`] and [`IdentityProvider`]. Callers authenticate with
//! HTTP Basic credentials; each route applies the role gate it needs.

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{get, post},
};
use roster_core::{
  identity::IdentityProvider, registration::RegistrationMode, store::DirectoryStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{account, departments, employees, invitations, leave};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ROSTER_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                           String,
  pub port:                           u16,
  pub store_path:                     PathBuf,
  /// Strategy behind `POST /register`.
  #[serde(default)]
  pub registration_mode:              RegistrationMode,
  #[serde(default = "default_expiry_days")]
  pub default_invitation_expiry_days: i64,
  #[serde(default = "default_timeout_secs")]
  pub resolve_timeout_secs:           u64,
  /// Deadline for the first snapshot of a live feed.
  #[serde(default = "default_timeout_secs")]
  pub listener_timeout_secs:          u64,
}

fn default_expiry_days() -> i64 { 7 }

fn default_timeout_secs() -> u64 { 10 }

impl ServerConfig {
  pub fn resolve_timeout(&self) -> Duration { Duration::from_secs(self.resolve_timeout_secs) }

  pub fn listener_timeout(&self) -> Duration { Duration::from_secs(self.listener_timeout_secs) }
}

// ─── Application state ────────────────────────────────────────────────────────

/// A backend serving both the directory and the credentials.
pub trait Backend: DirectoryStore + IdentityProvider + Clone + 'static {}

impl<T> Backend for T where T: DirectoryStore + IdentityProvider + Clone + 'static {}

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: Backend> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API [`Router`] for `state`.
pub fn router<S: Backend>(state: AppState<S>) -> Router {
  Router::new()
    .route("/health", get(account::health))
    .route("/me", get(account::me))
    // Registration
    .route("/register", post(account::register::<S>))
    .route("/register/invitation", post(account::register_invitation::<S>))
    .route("/register/employee", post(account::register_employee::<S>))
    // Invitation codes
    .route("/invitations", get(invitations::list::<S>).post(invitations::create::<S>))
    .route("/invitations/verify/{code}", get(invitations::verify::<S>))
    .route("/invitations/{id}", axum::routing::delete(invitations::delete_one::<S>))
    // Employees
    .route("/employees", get(employees::list::<S>).post(employees::create::<S>))
    .route(
      "/employees/{id}",
      get(employees::get_one::<S>)
        .patch(employees::update::<S>)
        .delete(employees::delete_one::<S>),
    )
    .route("/employees/{id}/status", post(employees::set_status::<S>))
    // Departments
    .route("/departments", get(departments::list::<S>).post(departments::create::<S>))
    .route(
      "/departments/{id}",
      get(departments::get_one::<S>)
        .patch(departments::update::<S>)
        .delete(departments::delete_one::<S>),
    )
    // Leave requests
    .route("/leave-requests", get(leave::list::<S>).post(leave::create::<S>))
    .route("/leave-requests/feed", get(leave::feed::<S>))
    .route(
      "/leave-requests/{id}",
      get(leave::get_one::<S>).delete(leave::delete_one::<S>),
    )
    .route("/leave-requests/{id}/review", post(leave::review::<S>))
    .route("/leave-requests/{id}/cancel", post(leave::cancel::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Algorithm, Argon2, Params, Version};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use chrono::Utc;
  use futures::StreamExt as _;
  use roster_core::{
    Role,
    identity::NewAccount,
    testing::Faulty,
    user::UserProfile,
  };
  use roster_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  const PASSWORD: &str = "secret1";

  async fn backend() -> SqliteStore {
    let cheap = Params::new(8, 1, 1, None).unwrap();
    SqliteStore::open_in_memory()
      .await
      .unwrap()
      .with_hasher(Argon2::new(Algorithm::Argon2id, Version::V0x13, cheap))
  }

  fn config(mode: RegistrationMode) -> ServerConfig {
    ServerConfig {
      host:                           "127.0.0.1".to_string(),
      port:                           8080,
      store_path:                     PathBuf::from(":memory:"),
      registration_mode:              mode,
      default_invitation_expiry_days: 7,
      resolve_timeout_secs:           5,
      listener_timeout_secs:          5,
    }
  }

  async fn make_state(mode: RegistrationMode) -> AppState<SqliteStore> {
    AppState {
      store:  Arc::new(backend().await),
      config: Arc::new(config(mode)),
    }
  }

  /// Create an account with a `users` record carrying `role`.
  async fn seed<S: Backend>(state: &AppState<S>, email: &str, role: Role) {
    let identity = state
      .store
      .create_account(NewAccount {
        email:        email.into(),
        password:     PASSWORD.into(),
        display_name: None,
      })
      .await
      .unwrap();
    let now = Utc::now();
    state
      .store
      .put_user(UserProfile {
        id: identity.uid,
        email: email.into(),
        name: email.into(),
        role,
        department: "Science".into(),
        position: String::new(),
        created_at: now,
        updated_at: now,
      })
      .await
      .unwrap();
  }

  fn basic(email: &str) -> String { format!("Basic {}", B64.encode(format!("{email}:{PASSWORD}"))) }

  async fn send<S: Backend>(
    state:  &AppState<S>,
    method: &str,
    uri:    &str,
    auth:   Option<&str>,
    body:   Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(email) = auth {
      builder = builder.header(header::AUTHORIZATION, basic(email));
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    router(state.clone()).oneshot(builder.body(body).unwrap()).await.unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  // ── Health / auth ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_needs_no_credentials() {
    let state = make_state(RegistrationMode::Invitation).await;
    let resp = send(&state, "GET", "/health", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn unauthenticated_requests_return_401() {
    let state = make_state(RegistrationMode::Invitation).await;
    let resp = send(&state, "GET", "/me", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

    let resp = send(&state, "GET", "/me", Some("ghost@school.example"), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn me_returns_resolved_profile() {
    let state = make_state(RegistrationMode::Invitation).await;
    seed(&state, "boss@school.example", Role::Admin).await;

    let resp = send(&state, "GET", "/me", Some("boss@school.example"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["role"], "admin");
    assert_eq!(body["email"], "boss@school.example");
  }

  // ── Invitations and registration ───────────────────────────────────────────

  #[tokio::test]
  async fn manager_cannot_issue_codes() {
    let state = make_state(RegistrationMode::Invitation).await;
    seed(&state, "mgr@school.example", Role::Manager).await;

    let resp = send(
      &state,
      "POST",
      "/invitations",
      Some("mgr@school.example"),
      Some(json!({ "role": "manager" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn issued_code_registers_manager_once() {
    let state = make_state(RegistrationMode::Invitation).await;
    seed(&state, "boss@school.example", Role::Admin).await;

    let resp = send(
      &state,
      "POST",
      "/invitations",
      Some("boss@school.example"),
      Some(json!({ "role": "manager", "expiry_days": 3 })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let code = json_body(resp).await["code"].as_str().unwrap().to_owned();
    assert_eq!(code.len(), 8);

    let resp = send(&state, "GET", &format!("/invitations/verify/{code}"), None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["role"], "manager");

    let register = |email: &str| {
      json!({
        "email": email,
        "password": PASSWORD,
        "confirm_password": PASSWORD,
        "invitation_code": code.to_lowercase(),
      })
    };
    let resp = send(&state, "POST", "/register", None, Some(register("m@school.example"))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(json_body(resp).await["profile"]["role"], "manager");

    let resp = send(&state, "POST", "/register", None, Some(register("n@school.example"))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&state, "GET", &format!("/invitations/verify/{code}"), None, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&state, "GET", "/employees", Some("m@school.example"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn employee_registration_needs_pending_record() {
    let state = make_state(RegistrationMode::Employee).await;
    seed(&state, "boss@school.example", Role::Admin).await;

    let creds = json!({
      "email": "grace@school.example",
      "password": PASSWORD,
      "confirm_password": PASSWORD,
    });
    let resp = send(&state, "POST", "/register", None, Some(creds.clone())).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(
      &state,
      "POST",
      "/employees",
      Some("boss@school.example"),
      Some(json!({
        "employee_id": "E-100",
        "name": "Grace Hopper",
        "email": "grace@school.example",
        "hire_date": "2024-09-01",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = send(&state, "POST", "/register", None, Some(creds)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["profile"]["role"], "employee");
    assert_eq!(body["profile"]["name"], "Grace Hopper");

    let resp = send(&state, "GET", "/employees", Some("grace@school.example"), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn mismatched_passwords_are_rejected() {
    let state = make_state(RegistrationMode::Invitation).await;
    let resp = send(
      &state,
      "POST",
      "/register/invitation",
      None,
      Some(json!({
        "email": "x@school.example",
        "password": PASSWORD,
        "confirm_password": "other-pw",
        "invitation_code": "ABCDEFGH",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Leave requests ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn leave_review_flow() {
    let state = make_state(RegistrationMode::Invitation).await;
    seed(&state, "emp@school.example", Role::Employee).await;
    seed(&state, "mgr@school.example", Role::Manager).await;

    let resp = send(
      &state,
      "POST",
      "/leave-requests",
      Some("emp@school.example"),
      Some(json!({
        "leave_type": "sick",
        "start_date": "2025-03-03",
        "end_date": "2025-03-04",
        "reason": "flu",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = json_body(resp).await;
    assert_eq!(created["days"], 2);
    let id = created["id"].as_str().unwrap().to_owned();

    let review = json!({ "decision": "approve" });
    let uri = format!("/leave-requests/{id}/review");
    let resp = send(&state, "POST", &uri, Some("emp@school.example"), Some(review.clone())).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(&state, "POST", &uri, Some("mgr@school.example"), Some(review.clone())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["status"], "approved");

    let resp = send(&state, "POST", &uri, Some("mgr@school.example"), Some(review)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = send(&state, "GET", "/leave-requests", Some("mgr@school.example"), None).await;
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn leave_feed_is_an_event_stream() {
    let state = make_state(RegistrationMode::Invitation).await;
    seed(&state, "emp@school.example", Role::Employee).await;

    let resp = send(&state, "GET", "/leave-requests/feed", Some("emp@school.example"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(ct.starts_with("text/event-stream"), "Content-Type: {ct}");

    let mut body = resp.into_body().into_data_stream();
    let first = body.next().await.unwrap().unwrap();
    let first = String::from_utf8(first.to_vec()).unwrap();
    assert!(first.contains("event: snapshot"), "{first}");
    assert!(first.contains("data: []"), "{first}");
  }

  #[tokio::test]
  async fn late_first_snapshot_ends_feed_with_error() {
    let mut cfg = config(RegistrationMode::Invitation);
    cfg.listener_timeout_secs = 1;
    let state = AppState {
      store:  Arc::new(Faulty::new(backend().await).delay_first_snapshot(Duration::from_secs(30))),
      config: Arc::new(cfg),
    };
    seed(&state, "emp@school.example", Role::Employee).await;

    let resp = send(&state, "GET", "/leave-requests/feed", Some("emp@school.example"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // The stream ends after the error, so the whole body can be read.
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("event: error"), "{text}");
    assert!(text.contains("timed out"), "{text}");
    assert!(!text.contains("event: snapshot"), "{text}");
  }

  #[tokio::test]
  async fn slow_profile_lookup_is_a_gateway_timeout() {
    let mut cfg = config(RegistrationMode::Invitation);
    cfg.resolve_timeout_secs = 1;
    let state = AppState {
      store:  Arc::new(Faulty::new(backend().await).delay_user_reads(Duration::from_secs(30))),
      config: Arc::new(cfg),
    };
    seed(&state, "emp@school.example", Role::Employee).await;

    let resp = send(&state, "GET", "/me", Some("emp@school.example"), None).await;
    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
  }
}
