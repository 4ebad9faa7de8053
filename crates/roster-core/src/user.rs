//! The session-facing user profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::Role;

/// Role-bearing projection used for access control.
///
/// One per authenticated principal. Keyed by the identity's uid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
  pub id:         Uuid,
  pub email:      String,
  pub name:       String,
  pub role:       Role,
  pub department: String,
  pub position:   String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Fallback display name when every other source is empty.
pub const DEFAULT_NAME: &str = "Employee";

/// Pick a display name from the first non-blank source, in order: explicit
/// name, first + last name, provider display name, email local part, then
/// [`DEFAULT_NAME`].
pub fn display_name(
  name: Option<&str>,
  first_name: Option<&str>,
  last_name: Option<&str>,
  provider_name: Option<&str>,
  email: &str,
) -> String {
  fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
  }

  if let Some(n) = non_blank(name) {
    return n.to_owned();
  }

  let joined = [non_blank(first_name), non_blank(last_name)]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");
  if !joined.is_empty() {
    return joined;
  }

  if let Some(n) = non_blank(provider_name) {
    return n.to_owned();
  }

  non_blank(email.split('@').next())
    .unwrap_or(DEFAULT_NAME)
    .to_owned()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn explicit_name_wins() {
    let n = display_name(Some("Ada"), Some("A"), Some("L"), Some("p"), "x@y");
    assert_eq!(n, "Ada");
  }

  #[test]
  fn first_and_last_joined() {
    let n = display_name(Some("  "), Some("Ada"), Some("Lovelace"), None, "x@y");
    assert_eq!(n, "Ada Lovelace");
    let n = display_name(None, None, Some("Lovelace"), None, "x@y");
    assert_eq!(n, "Lovelace");
  }

  #[test]
  fn provider_name_then_email() {
    assert_eq!(display_name(None, None, None, Some("Prov"), "a@b"), "Prov");
    assert_eq!(display_name(None, None, None, None, "ada@school"), "ada");
  }

  #[test]
  fn literal_fallback() {
    assert_eq!(display_name(None, None, None, None, ""), DEFAULT_NAME);
    assert_eq!(display_name(None, None, None, None, "@school"), DEFAULT_NAME);
    assert_eq!(display_name(None, None, None, None, "bare"), "bare");
  }
}
