//! Error types for `roster-core`.

use std::time::Duration;

use thiserror::Error;

use crate::identity::IdentityError;

/// Client-side form constraints. These never reach a backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("{0} is required")]
  Required(&'static str),

  #[error("email address {0:?} is not valid")]
  InvalidEmail(String),

  #[error("password must be at least {min} characters")]
  PasswordTooShort { min: usize },

  #[error("passwords do not match")]
  PasswordMismatch,

  #[error("expiry must be a positive number of days, got {0}")]
  InvalidExpiry(i64),

  #[error("end date {end} is before start date {start}")]
  InvalidDateRange {
    start: chrono::NaiveDate,
    end:   chrono::NaiveDate,
  },
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(#[from] ValidationError),

  #[error("invitation code not found, already used, or expired")]
  InvitationNotFound,

  #[error("no pending registration for {0}")]
  NoPendingRegistration(String),

  #[error("{0} not found")]
  NotFound(String),

  #[error("authentication required")]
  AuthenticationRequired,

  #[error(transparent)]
  Identity(#[from] IdentityError),

  #[error("permission denied: {0}")]
  PermissionDenied(String),

  #[error("an unregistered employee with email {0} already exists")]
  DuplicateEmail(String),

  #[error("{0}")]
  InvalidTransition(String),

  #[error("timed out after {0:?}")]
  Timeout(Duration),

  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error into [`Error::Persistence`].
  pub fn persistence<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Persistence(Box::new(e))
  }

  /// Like [`persistence`](Self::persistence), but keeps conflicts the
  /// backend recognised as their own variant.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    match e.duplicate_email() {
      Some(email) => Self::DuplicateEmail(email.to_owned()),
      None => Self::persistence(e),
    }
  }
}

/// Error type of a [`DirectoryStore`](crate::store::DirectoryStore) backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The email of a write rejected because another unregistered employee
  /// already holds it.
  fn duplicate_email(&self) -> Option<&str> { None }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
