//! Error type for `roster-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum column held a value this build does not know.
  #[error("cannot decode {what}: {value:?}")]
  Decode { what: &'static str, value: String },

  #[error("password hashing error: {0}")]
  Hash(String),

  /// The partial unique index on pending employee emails rejected a write.
  #[error("an unregistered employee with email {0} already exists")]
  DuplicateEmail(String),
}

impl roster_core::StoreError for Error {
  fn duplicate_email(&self) -> Option<&str> {
    match self {
      Self::DuplicateEmail(email) => Some(email),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
