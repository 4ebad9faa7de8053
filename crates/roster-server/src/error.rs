//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use roster_core::identity::IdentityError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("{0} not found")]
  NotFound(String),

  #[error(transparent)]
  Core(#[from] roster_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn status(&self) -> StatusCode {
    use roster_core::Error as E;
    match self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      ApiError::Core(e) => match e {
        E::Validation(_) => StatusCode::BAD_REQUEST,
        E::InvitationNotFound | E::NoPendingRegistration(_) | E::NotFound(_) => {
          StatusCode::NOT_FOUND
        }
        E::AuthenticationRequired => StatusCode::UNAUTHORIZED,
        E::Identity(IdentityError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
        E::Identity(IdentityError::EmailInUse(_)) => StatusCode::CONFLICT,
        E::Identity(IdentityError::WeakPassword | IdentityError::InvalidEmail(_)) => {
          StatusCode::BAD_REQUEST
        }
        E::Identity(IdentityError::Backend(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        E::PermissionDenied(_) => StatusCode::FORBIDDEN,
        E::DuplicateEmail(_) | E::InvalidTransition(_) => StatusCode::CONFLICT,
        E::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        E::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    } else {
      tracing::debug!(%status, error = %self, "request rejected");
    }

    let unauthorized = status == StatusCode::UNAUTHORIZED;
    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if unauthorized {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"roster\""),
      );
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use roster_core::ValidationError;

  #[test]
  fn core_errors_map_to_statuses() {
    let cases = [
      (roster_core::Error::from(ValidationError::PasswordMismatch), StatusCode::BAD_REQUEST),
      (roster_core::Error::InvitationNotFound, StatusCode::NOT_FOUND),
      (roster_core::Error::PermissionDenied("x".into()), StatusCode::FORBIDDEN),
      (roster_core::Error::DuplicateEmail("a@b.c".into()), StatusCode::CONFLICT),
      (roster_core::Error::Timeout(Duration::from_secs(1)), StatusCode::GATEWAY_TIMEOUT),
      (IdentityError::InvalidCredentials.into(), StatusCode::UNAUTHORIZED),
      (IdentityError::EmailInUse("a@b.c".into()).into(), StatusCode::CONFLICT),
    ];
    for (e, status) in cases {
      assert_eq!(ApiError::from(e).status(), status);
    }
  }

  #[test]
  fn unauthorized_carries_challenge() {
    let res = ApiError::Unauthorized.into_response();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
  }
}
