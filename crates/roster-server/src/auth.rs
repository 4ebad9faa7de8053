//! HTTP Basic-auth extractor.
//!
//! Credentials are checked against the [`IdentityProvider`], then the
//! identity is resolved to a [`UserProfile`] for the access gate.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use roster_core::{
  Role,
  identity::{Identity, IdentityError, IdentityProvider},
  resolver::resolve_profile_within,
  user::UserProfile,
};

use crate::{AppState, Backend, error::ApiError};

/// The signed-in caller of a request.
#[derive(Debug, Clone)]
pub struct Principal {
  pub identity: Identity,
  pub profile:  UserProfile,
}

impl Principal {
  /// The access gate applied to this caller.
  pub fn require(&self, role: Role) -> Result<(), ApiError> {
    roster_core::require(&self.profile, role).map_err(ApiError::from)
  }
}

/// Pull `(email, password)` out of a `Basic` authorization header.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let value = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = value.strip_prefix("Basic ").ok_or(ApiError::Unauthorized)?;
  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds   = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

  let (email, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((email.to_owned(), password.to_owned()))
}

impl<S: Backend> FromRequestParts<AppState<S>> for Principal {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let (email, password) = basic_credentials(&parts.headers)?;

    let identity = match state.store.authenticate(&email, &password).await {
      Ok(identity) => identity,
      Err(IdentityError::InvalidCredentials) => return Err(ApiError::Unauthorized),
      Err(e) => return Err(roster_core::Error::from(e).into()),
    };

    let profile =
      resolve_profile_within(state.store.as_ref(), &identity, state.config.resolve_timeout())
        .await?;
    Ok(Principal { identity, profile })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::HeaderValue;

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  #[test]
  fn decodes_basic_credentials() {
    let value = format!("Basic {}", B64.encode("ada@school.example:pa:ss"));
    let (email, password) = basic_credentials(&headers(&value)).unwrap();
    assert_eq!(email, "ada@school.example");
    assert_eq!(password, "pa:ss");
  }

  #[test]
  fn rejects_malformed_headers() {
    assert!(matches!(basic_credentials(&HeaderMap::new()), Err(ApiError::Unauthorized)));
    assert!(matches!(
      basic_credentials(&headers("Bearer abc")),
      Err(ApiError::Unauthorized)
    ));
    assert!(matches!(
      basic_credentials(&headers("Basic !!!not-base64!!!")),
      Err(ApiError::Unauthorized)
    ));
    let no_colon = format!("Basic {}", B64.encode("nocolon"));
    assert!(matches!(basic_credentials(&headers(&no_colon)), Err(ApiError::Unauthorized)));
  }
}
