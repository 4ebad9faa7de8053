//! HR-managed employee records.
//!
//! An employee profile is created by an administrator before the employee
//! ever signs in. Registration later links it to an identity.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::role::Role;

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
pub enum EmployeeStatus {
  #[default]
  Active,
  Inactive,
  Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
  pub name:         String,
  pub phone:        String,
  pub relationship: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeProfile {
  pub id:                Uuid,
  /// HR-assigned staff number, e.g. `"EMP-0042"`.
  pub employee_id:       String,
  pub name:              String,
  pub first_name:        Option<String>,
  pub last_name:         Option<String>,
  pub email:             String,
  pub phone:             String,
  pub department:        String,
  pub position:          String,
  /// Informational only; the role resolver never elevates from this field.
  pub role:              Role,
  pub salary:            Option<f64>,
  pub hire_date:         NaiveDate,
  pub status:            EmployeeStatus,
  pub emergency_contact: Option<EmergencyContact>,
  /// Identity link, set on registration.
  pub uid:               Option<Uuid>,
  pub is_registered:     bool,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

/// Input to [`DirectoryStore::create_employee`](crate::store::DirectoryStore::create_employee).
#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
  pub employee_id:       String,
  #[serde(default)]
  pub name:              String,
  pub first_name:        Option<String>,
  pub last_name:         Option<String>,
  pub email:             String,
  #[serde(default)]
  pub phone:             String,
  #[serde(default)]
  pub department:        String,
  #[serde(default)]
  pub position:          String,
  #[serde(default)]
  pub role:              Role,
  pub salary:            Option<f64>,
  pub hire_date:         NaiveDate,
  #[serde(default)]
  pub status:            EmployeeStatus,
  pub emergency_contact: Option<EmergencyContact>,
}

/// Partial update; `None` leaves a field untouched.
///
/// Identity link and registration state are not editable here; they only
/// change through registration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeUpdate {
  pub employee_id:       Option<String>,
  pub name:              Option<String>,
  pub first_name:        Option<String>,
  pub last_name:         Option<String>,
  pub email:             Option<String>,
  pub phone:             Option<String>,
  pub department:        Option<String>,
  pub position:          Option<String>,
  pub role:              Option<Role>,
  pub salary:            Option<f64>,
  pub hire_date:         Option<NaiveDate>,
  pub status:            Option<EmployeeStatus>,
  pub emergency_contact: Option<EmergencyContact>,
}

impl EmployeeUpdate {
  /// Apply this update to `profile` in place and bump `updated_at`.
  pub fn apply(self, profile: &mut EmployeeProfile, now: DateTime<Utc>) {
    macro_rules! set {
      ($($field:ident),* $(,)?) => {
        $(if let Some(v) = self.$field { profile.$field = v; })*
      };
    }
    set!(employee_id, name, email, phone, department, position, role, hire_date, status);
    if self.first_name.is_some() {
      profile.first_name = self.first_name;
    }
    if self.last_name.is_some() {
      profile.last_name = self.last_name;
    }
    if self.salary.is_some() {
      profile.salary = self.salary;
    }
    if self.emergency_contact.is_some() {
      profile.emergency_contact = self.emergency_contact;
    }
    profile.updated_at = now;
  }
}

/// Parameters for [`DirectoryStore::list_employees`](crate::store::DirectoryStore::list_employees).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeQuery {
  pub department:    Option<String>,
  pub status:        Option<EmployeeStatus>,
  pub is_registered: Option<bool>,
}

impl EmployeeQuery {
  pub fn matches(&self, e: &EmployeeProfile) -> bool {
    self.department.as_deref().is_none_or(|d| e.department == d)
      && self.status.is_none_or(|s| e.status == s)
      && self.is_registered.is_none_or(|r| e.is_registered == r)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> EmployeeProfile {
    let now = Utc::now();
    EmployeeProfile {
      id: Uuid::new_v4(),
      employee_id: "EMP-1".into(),
      name: "Grace Hopper".into(),
      first_name: None,
      last_name: None,
      email: "grace@school.example".into(),
      phone: String::new(),
      department: "Science".into(),
      position: "Teacher".into(),
      role: Role::Employee,
      salary: Some(1000.0),
      hire_date: NaiveDate::from_ymd_opt(2020, 9, 1).unwrap(),
      status: EmployeeStatus::Active,
      emergency_contact: None,
      uid: None,
      is_registered: false,
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn update_touches_only_given_fields() {
    let mut p = sample();
    let later = p.updated_at + chrono::Duration::seconds(5);
    EmployeeUpdate {
      position: Some("Head of Science".into()),
      status: Some(EmployeeStatus::Inactive),
      ..Default::default()
    }
    .apply(&mut p, later);

    assert_eq!(p.position, "Head of Science");
    assert_eq!(p.status, EmployeeStatus::Inactive);
    assert_eq!(p.name, "Grace Hopper");
    assert_eq!(p.salary, Some(1000.0));
    assert_eq!(p.updated_at, later);
  }

  #[test]
  fn query_filters() {
    let p = sample();
    assert!(EmployeeQuery::default().matches(&p));
    assert!(EmployeeQuery { department: Some("Science".into()), ..Default::default() }.matches(&p));
    assert!(!EmployeeQuery { is_registered: Some(true), ..Default::default() }.matches(&p));
    assert!(!EmployeeQuery { status: Some(EmployeeStatus::Terminated), ..Default::default() }.matches(&p));
  }
}
