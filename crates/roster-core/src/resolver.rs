//! Role resolution: turning an identity into the [`UserProfile`] used for
//! access control.
//!
//! Lookup order:
//! 1. the `users` record keyed by the identity's uid, used verbatim;
//! 2. the employee record linked to the uid, projected with role `employee`
//!    (employee records never grant elevated roles);
//! 3. a minimal default with role `employee`, which is *not* persisted.

use std::time::Duration;

use chrono::Utc;

use crate::{
  Error, Result,
  employee::EmployeeProfile,
  identity::Identity,
  role::Role,
  store::DirectoryStore,
  user::{UserProfile, display_name},
};

pub async fn resolve_profile<S: DirectoryStore>(
  store: &S,
  identity: &Identity,
) -> Result<UserProfile> {
  if let Some(user) = store
    .get_user(identity.uid)
    .await
    .map_err(Error::persistence)?
  {
    tracing::debug!(uid = %identity.uid, role = %user.role, "resolved from users");
    return Ok(user);
  }

  if let Some(employee) = store
    .get_employee_by_uid(identity.uid)
    .await
    .map_err(Error::persistence)?
  {
    tracing::debug!(uid = %identity.uid, "resolved from employees");
    return Ok(from_employee(identity, &employee));
  }

  tracing::debug!(uid = %identity.uid, "no profile on record, using default");
  Ok(default_profile(identity))
}

/// [`resolve_profile`] bounded by `timeout`.
pub async fn resolve_profile_within<S: DirectoryStore>(
  store: &S,
  identity: &Identity,
  timeout: Duration,
) -> Result<UserProfile> {
  tokio::time::timeout(timeout, resolve_profile(store, identity))
    .await
    .map_err(|_| Error::Timeout(timeout))?
}

pub(crate) fn from_employee(identity: &Identity, e: &EmployeeProfile) -> UserProfile {
  UserProfile {
    id:         identity.uid,
    email:      if e.email.is_empty() { identity.email.clone() } else { e.email.clone() },
    name:       display_name(
      Some(&e.name),
      e.first_name.as_deref(),
      e.last_name.as_deref(),
      identity.display_name.as_deref(),
      &identity.email,
    ),
    role:       Role::Employee,
    department: e.department.clone(),
    position:   e.position.clone(),
    created_at: e.created_at,
    updated_at: e.updated_at,
  }
}

fn default_profile(identity: &Identity) -> UserProfile {
  let now = Utc::now();
  UserProfile {
    id:         identity.uid,
    email:      identity.email.clone(),
    name:       display_name(
      None,
      None,
      None,
      identity.display_name.as_deref(),
      &identity.email,
    ),
    role:       Role::Employee,
    department: String::new(),
    position:   String::new(),
    created_at: now,
    updated_at: now,
  }
}
