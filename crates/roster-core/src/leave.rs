//! Leave requests.
//!
//! A request starts `pending` and leaves that state exactly once: approved or
//! rejected by a reviewer, or cancelled by its owner. Stores enforce this
//! with a compare-and-set on the status column.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::error::{Result, ValidationError};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
  Annual,
  Sick,
  Personal,
  Maternity,
  Unpaid,
  Other,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
  Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
  pub id:             Uuid,
  pub employee_uid:   Uuid,
  pub employee_name:  String,
  pub department:     String,
  pub leave_type:     LeaveType,
  pub start_date:     NaiveDate,
  pub end_date:       NaiveDate,
  /// Calendar days, both ends inclusive.
  pub days:           i64,
  pub reason:         String,
  pub status:         LeaveStatus,
  pub reviewed_by:    Option<Uuid>,
  pub reviewer_name:  Option<String>,
  pub review_comment: Option<String>,
  pub reviewed_at:    Option<DateTime<Utc>>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

/// Input to [`DirectoryStore::create_leave_request`](crate::store::DirectoryStore::create_leave_request).
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
  pub employee_uid:  Uuid,
  pub employee_name: String,
  pub department:    String,
  pub leave_type:    LeaveType,
  pub start_date:    NaiveDate,
  pub end_date:      NaiveDate,
  pub reason:        String,
}

impl NewLeaveRequest {
  /// Check the date range and return the inclusive day count.
  pub fn validate(&self) -> Result<i64> {
    if self.end_date < self.start_date {
      return Err(
        ValidationError::InvalidDateRange {
          start: self.start_date,
          end:   self.end_date,
        }
        .into(),
      );
    }
    if self.reason.trim().is_empty() {
      return Err(ValidationError::Required("reason").into());
    }
    Ok((self.end_date - self.start_date).num_days() + 1)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveDecision {
  Approve,
  Reject,
}

impl From<LeaveDecision> for LeaveStatus {
  fn from(d: LeaveDecision) -> Self {
    match d {
      LeaveDecision::Approve => LeaveStatus::Approved,
      LeaveDecision::Reject => LeaveStatus::Rejected,
    }
  }
}

/// A reviewer's verdict on a pending request.
#[derive(Debug, Clone)]
pub struct LeaveReview {
  pub decision:      LeaveDecision,
  pub reviewer_uid:  Uuid,
  pub reviewer_name: String,
  pub comment:       Option<String>,
}

/// Parameters for listing and subscribing to leave requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaveQuery {
  pub employee_uid: Option<Uuid>,
  pub department:   Option<String>,
  pub status:       Option<LeaveStatus>,
}

impl LeaveQuery {
  pub fn matches(&self, r: &LeaveRequest) -> bool {
    self.employee_uid.is_none_or(|u| r.employee_uid == u)
      && self.department.as_deref().is_none_or(|d| r.department == d)
      && self.status.is_none_or(|s| r.status == s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn draft(start: (i32, u32, u32), end: (i32, u32, u32)) -> NewLeaveRequest {
    NewLeaveRequest {
      employee_uid:  Uuid::new_v4(),
      employee_name: "Ada".into(),
      department:    "Maths".into(),
      leave_type:    LeaveType::Annual,
      start_date:    NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
      end_date:      NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
      reason:        "family trip".into(),
    }
  }

  #[test]
  fn days_are_inclusive() {
    assert_eq!(draft((2026, 3, 2), (2026, 3, 2)).validate().unwrap(), 1);
    assert_eq!(draft((2026, 2, 27), (2026, 3, 2)).validate().unwrap(), 4);
  }

  #[test]
  fn reversed_range_rejected() {
    let err = draft((2026, 3, 5), (2026, 3, 2)).validate().unwrap_err();
    assert!(matches!(
      err,
      crate::Error::Validation(ValidationError::InvalidDateRange { .. })
    ));
  }

  #[test]
  fn blank_reason_rejected() {
    let mut d = draft((2026, 3, 2), (2026, 3, 3));
    d.reason = "   ".into();
    assert!(matches!(
      d.validate(),
      Err(crate::Error::Validation(ValidationError::Required("reason")))
    ));
  }
}
