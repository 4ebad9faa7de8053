//! Directory rules layered over [`DirectoryStore`]: input checks, uniqueness,
//! ownership and one-shot status transitions.

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  error::ValidationError,
  employee::{EmployeeProfile, EmployeeUpdate, NewEmployee},
  leave::{
    LeaveDecision, LeaveQuery, LeaveRequest, LeaveReview, LeaveStatus, LeaveType,
    NewLeaveRequest,
  },
  role::{Role, require},
  store::DirectoryStore,
  user::UserProfile,
};

// ─── Employees ───────────────────────────────────────────────────────────────

/// Create an employee record, rejecting a second unregistered record with the
/// same email.
pub async fn create_employee<S: DirectoryStore>(
  store: &S,
  input: NewEmployee,
) -> Result<EmployeeProfile> {
  if input.employee_id.trim().is_empty() {
    return Err(ValidationError::Required("employee id").into());
  }
  let email = input.email.trim();
  if email.is_empty() {
    return Err(ValidationError::Required("email").into());
  }
  if !email.contains('@') {
    return Err(ValidationError::InvalidEmail(email.to_owned()).into());
  }
  ensure_email_free(store, email, None).await?;

  let employee = store.create_employee(input).await.map_err(Error::from_store)?;
  tracing::info!(id = %employee.id, employee_id = %employee.employee_id, "employee created");
  Ok(employee)
}

pub async fn update_employee<S: DirectoryStore>(
  store: &S,
  id: Uuid,
  update: EmployeeUpdate,
) -> Result<EmployeeProfile> {
  if let Some(email) = update.email.as_deref() {
    ensure_email_free(store, email.trim(), Some(id)).await?;
  }
  store
    .update_employee(id, update)
    .await
    .map_err(Error::from_store)?
    .ok_or_else(|| Error::NotFound(format!("employee {id}")))
}

async fn ensure_email_free<S: DirectoryStore>(
  store: &S,
  email: &str,
  except: Option<Uuid>,
) -> Result<()> {
  let clash = store
    .find_unregistered_employee(email)
    .await
    .map_err(Error::persistence)?
    .filter(|e| Some(e.id) != except);
  match clash {
    Some(_) => Err(Error::DuplicateEmail(email.to_owned())),
    None => Ok(()),
  }
}

// ─── Leave requests ──────────────────────────────────────────────────────────

/// What an employee fills in; the rest comes from their profile.
#[derive(Debug, Clone, Deserialize)]
pub struct LeaveDraft {
  pub leave_type: LeaveType,
  pub start_date: NaiveDate,
  pub end_date:   NaiveDate,
  #[serde(default)]
  pub reason:     String,
}

/// File a leave request on behalf of `requester`.
pub async fn submit_leave<S: DirectoryStore>(
  store: &S,
  requester: &UserProfile,
  draft: LeaveDraft,
) -> Result<LeaveRequest> {
  let input = NewLeaveRequest {
    employee_uid:  requester.id,
    employee_name: requester.name.clone(),
    department:    requester.department.clone(),
    leave_type:    draft.leave_type,
    start_date:    draft.start_date,
    end_date:      draft.end_date,
    reason:        draft.reason,
  };
  let days = input.validate()?;
  store
    .create_leave_request(input, days)
    .await
    .map_err(Error::persistence)
}

/// Approve or reject a pending request. Reviewers need the manager role.
pub async fn review_leave<S: DirectoryStore>(
  store: &S,
  reviewer: &UserProfile,
  id: Uuid,
  decision: LeaveDecision,
  comment: Option<String>,
) -> Result<LeaveRequest> {
  require(reviewer, Role::Manager)?;
  let review = LeaveReview {
    decision,
    reviewer_uid: reviewer.id,
    reviewer_name: reviewer.name.clone(),
    comment: comment.filter(|c| !c.trim().is_empty()),
  };
  match store.review_leave_request(id, review).await.map_err(Error::persistence)? {
    Some(r) => {
      tracing::info!(%id, status = %r.status, reviewer = %reviewer.id, "leave request reviewed");
      Ok(r)
    }
    None => Err(not_pending(store, id).await),
  }
}

/// Withdraw a pending request. Only its owner may do so.
pub async fn cancel_leave<S: DirectoryStore>(
  store: &S,
  requester: &UserProfile,
  id: Uuid,
) -> Result<LeaveRequest> {
  let existing = store
    .get_leave_request(id)
    .await
    .map_err(Error::persistence)?
    .ok_or_else(|| Error::NotFound(format!("leave request {id}")))?;
  if existing.employee_uid != requester.id {
    return Err(Error::PermissionDenied("only the requester may cancel".into()));
  }
  match store
    .set_leave_status(id, LeaveStatus::Cancelled)
    .await
    .map_err(Error::persistence)?
  {
    Some(r) => Ok(r),
    None => Err(not_pending(store, id).await),
  }
}

/// Explain why a compare-and-set on a pending request did not apply.
async fn not_pending<S: DirectoryStore>(store: &S, id: Uuid) -> Error {
  match store.get_leave_request(id).await {
    Ok(Some(r)) => Error::InvalidTransition(format!("leave request is already {}", r.status)),
    Ok(None) => Error::NotFound(format!("leave request {id}")),
    Err(e) => Error::persistence(e),
  }
}

/// Narrow `query` to what `viewer` may see: managers and admins see every
/// request, everyone else only their own.
pub fn leave_scope(viewer: &UserProfile, mut query: LeaveQuery) -> LeaveQuery {
  if !viewer.role.satisfies(Role::Manager) {
    query.employee_uid = Some(viewer.id);
  }
  query
}

pub fn can_view_leave(viewer: &UserProfile, request: &LeaveRequest) -> bool {
  request.employee_uid == viewer.id || viewer.role.satisfies(Role::Manager)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn viewer(role: Role) -> UserProfile {
    let now = Utc::now();
    UserProfile {
      id: Uuid::new_v4(),
      email: "v@school.example".into(),
      name: "Viewer".into(),
      role,
      department: "Maths".into(),
      position: String::new(),
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn employees_are_scoped_to_themselves() {
    let v = viewer(Role::Employee);
    let other = Uuid::new_v4();
    let scoped = leave_scope(&v, LeaveQuery { employee_uid: Some(other), ..Default::default() });
    assert_eq!(scoped.employee_uid, Some(v.id));
  }

  #[test]
  fn managers_and_admins_keep_their_filter() {
    for role in [Role::Manager, Role::Admin] {
      let scoped = leave_scope(&viewer(role), LeaveQuery::default());
      assert_eq!(scoped.employee_uid, None);
    }
  }
}
