//! The identity-provider abstraction.
//!
//! The provider owns accounts and credentials. Everything else (roles,
//! profiles, employee links) lives in the [`DirectoryStore`].
//!
//! [`DirectoryStore`]: crate::store::DirectoryStore

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// An authenticated principal as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub uid:          Uuid,
  pub email:        String,
  pub display_name: Option<String>,
}

/// Input to [`IdentityProvider::create_account`].
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub email:        String,
  pub password:     String,
  pub display_name: Option<String>,
}

/// Provider rejection categories, surfaced to the user as-is.
#[derive(Debug, Error)]
pub enum IdentityError {
  #[error("an account with email {0} already exists")]
  EmailInUse(String),

  #[error("password is too weak")]
  WeakPassword,

  #[error("email address {0:?} is invalid")]
  InvalidEmail(String),

  #[error("invalid email or password")]
  InvalidCredentials,

  #[error("identity provider error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Abstraction over an identity provider backend.
pub trait IdentityProvider: Send + Sync {
  /// Create an account and return its identity. The uid is provider-assigned.
  fn create_account(
    &self,
    account: NewAccount,
  ) -> impl Future<Output = Result<Identity, IdentityError>> + Send + '_;

  /// Check credentials (sign-in). Unknown email and wrong password are both
  /// reported as [`IdentityError::InvalidCredentials`].
  fn authenticate<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Identity, IdentityError>> + Send + 'a;

  /// Remove an account. Used to compensate when linking a freshly created
  /// account fails. Returns `false` if the uid was unknown.
  fn delete_account(
    &self,
    uid: Uuid,
  ) -> impl Future<Output = Result<bool, IdentityError>> + Send + '_;
}
