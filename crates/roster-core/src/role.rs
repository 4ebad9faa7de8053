//! Roles and the access gate.
//!
//! Roles are a closed set. Every gate decision goes through [`is_allowed`],
//! so a misspelled role cannot silently deny or grant access.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result, user::UserProfile};

/// The role carried by a session-facing [`UserProfile`].
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  #[default]
  Employee,
  Manager,
  Admin,
}

/// The subset of roles an invitation code may grant.
///
/// Employees register through their pre-provisioned profile instead, so an
/// invitation can never mint a plain `employee`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InvitationRole {
  Admin,
  Manager,
}

impl From<InvitationRole> for Role {
  fn from(r: InvitationRole) -> Self {
    match r {
      InvitationRole::Admin => Role::Admin,
      InvitationRole::Manager => Role::Manager,
    }
  }
}

impl Role {
  /// Whether a holder of `self` passes a gate requiring `required`.
  ///
  /// Admin passes every gate. No other role implies another.
  pub fn satisfies(self, required: Role) -> bool {
    match self {
      Role::Admin => true,
      Role::Manager | Role::Employee => self == required,
    }
  }
}

/// The access gate: allowed iff nothing is required, the roles match, or the
/// profile is an admin.
pub fn is_allowed(profile: &UserProfile, required: Option<Role>) -> bool {
  required.is_none_or(|r| profile.role.satisfies(r))
}

/// Role-set variant of [`is_allowed`]: an empty set allows everyone,
/// otherwise any one satisfied role is enough.
pub fn is_allowed_any(profile: &UserProfile, required: &[Role]) -> bool {
  required.is_empty() || required.iter().any(|r| profile.role.satisfies(*r))
}

/// [`is_allowed`] as a `Result`, for use with `?`.
pub fn require(profile: &UserProfile, required: Role) -> Result<()> {
  if is_allowed(profile, Some(required)) {
    Ok(())
  } else {
    Err(Error::PermissionDenied(format!("requires {required} role")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;
  use uuid::Uuid;

  fn profile(role: Role) -> UserProfile {
    let now = Utc::now();
    UserProfile {
      id: Uuid::new_v4(),
      email: "someone@school.example".into(),
      name: "Someone".into(),
      role,
      department: String::new(),
      position: String::new(),
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn manager_does_not_pass_admin_gate() {
    assert!(!is_allowed(&profile(Role::Manager), Some(Role::Admin)));
  }

  #[test]
  fn admin_passes_manager_gate() {
    assert!(is_allowed(&profile(Role::Admin), Some(Role::Manager)));
    assert!(is_allowed(&profile(Role::Admin), Some(Role::Employee)));
  }

  #[test]
  fn no_requirement_allows_employee() {
    assert!(is_allowed(&profile(Role::Employee), None));
  }

  #[test]
  fn manager_does_not_pass_employee_gate() {
    assert!(!is_allowed(&profile(Role::Manager), Some(Role::Employee)));
  }

  #[test]
  fn role_set_gate() {
    let staff = [Role::Manager, Role::Employee];
    assert!(is_allowed_any(&profile(Role::Manager), &staff));
    assert!(is_allowed_any(&profile(Role::Admin), &[Role::Manager]));
    assert!(!is_allowed_any(&profile(Role::Employee), &[Role::Manager]));
    assert!(is_allowed_any(&profile(Role::Employee), &[]));
  }

  #[test]
  fn require_reports_missing_role() {
    assert!(require(&profile(Role::Admin), Role::Manager).is_ok());
    let err = require(&profile(Role::Employee), Role::Manager).unwrap_err();
    assert_eq!(err.to_string(), "permission denied: requires manager role");
  }

  #[test]
  fn role_string_forms() {
    assert_eq!(Role::Manager.as_ref(), "manager");
    assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
    assert!("Admin ".parse::<Role>().is_err());
    assert_eq!(Role::from(InvitationRole::Manager), Role::Manager);
  }
}
