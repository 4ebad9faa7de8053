//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings; a NULL timestamp reads as "now". Calendar
//! dates are `YYYY-MM-DD`. Enums use their lowercase string form. UUIDs are
//! hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use roster_core::{
  department::Department,
  employee::{EmergencyContact, EmployeeProfile},
  invitation::InvitationCode,
  leave::LeaveRequest,
  user::UserProfile,
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

/// Missing timestamps read as the current time rather than failing.
pub fn decode_dt_or_now(s: Option<String>) -> Result<DateTime<Utc>> {
  Ok(decode_opt_dt(s)?.unwrap_or_else(Utc::now))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn decode_enum<T: FromStr>(what: &'static str, s: String) -> Result<T> {
  s.parse().map_err(|_| Error::Decode { what, value: s })
}

pub fn encode_contact(c: Option<&EmergencyContact>) -> Result<Option<String>> {
  c.map(serde_json::to_string).transpose().map_err(Error::from)
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const INVITATION_COLUMNS: &str = "id, code, role, created_by, created_by_name, is_used, used_by, used_at, expires_at, created_at";

/// Raw values read directly from an `invitation_codes` row.
pub struct RawInvitation {
  pub id:              String,
  pub code:            String,
  pub role:            String,
  pub created_by:      String,
  pub created_by_name: String,
  pub is_used:         bool,
  pub used_by:         Option<String>,
  pub used_at:         Option<String>,
  pub expires_at:      String,
  pub created_at:      Option<String>,
}

impl RawInvitation {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      code:            row.get(1)?,
      role:            row.get(2)?,
      created_by:      row.get(3)?,
      created_by_name: row.get(4)?,
      is_used:         row.get(5)?,
      used_by:         row.get(6)?,
      used_at:         row.get(7)?,
      expires_at:      row.get(8)?,
      created_at:      row.get(9)?,
    })
  }

  pub fn into_invitation(self) -> Result<InvitationCode> {
    Ok(InvitationCode {
      id:              decode_uuid(&self.id)?,
      code:            self.code,
      role:            decode_enum("invitation role", self.role)?,
      created_by:      decode_uuid(&self.created_by)?,
      created_by_name: self.created_by_name,
      is_used:         self.is_used,
      used_by:         decode_opt_uuid(self.used_by)?,
      used_at:         decode_opt_dt(self.used_at)?,
      expires_at:      decode_dt(&self.expires_at)?,
      created_at:      decode_dt_or_now(self.created_at)?,
    })
  }
}

pub const USER_COLUMNS: &str =
  "uid, email, name, role, department, position, created_at, updated_at";

pub struct RawUser {
  pub uid:        String,
  pub email:      String,
  pub name:       String,
  pub role:       String,
  pub department: String,
  pub position:   String,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      uid:        row.get(0)?,
      email:      row.get(1)?,
      name:       row.get(2)?,
      role:       row.get(3)?,
      department: row.get(4)?,
      position:   row.get(5)?,
      created_at: row.get(6)?,
      updated_at: row.get(7)?,
    })
  }

  pub fn into_user(self) -> Result<UserProfile> {
    Ok(UserProfile {
      id:         decode_uuid(&self.uid)?,
      email:      self.email,
      name:       self.name,
      role:       decode_enum("role", self.role)?,
      department: self.department,
      position:   self.position,
      created_at: decode_dt_or_now(self.created_at)?,
      updated_at: decode_dt_or_now(self.updated_at)?,
    })
  }
}

pub const EMPLOYEE_COLUMNS: &str = "id, employee_id, name, first_name, last_name, email, phone, department, position, role, salary, hire_date, status, emergency_contact, uid, is_registered, created_at, updated_at";

pub struct RawEmployee {
  pub id:                String,
  pub employee_id:       String,
  pub name:              String,
  pub first_name:        Option<String>,
  pub last_name:         Option<String>,
  pub email:             String,
  pub phone:             String,
  pub department:        String,
  pub position:          String,
  pub role:              String,
  pub salary:            Option<f64>,
  pub hire_date:         String,
  pub status:            String,
  pub emergency_contact: Option<String>,
  pub uid:               Option<String>,
  pub is_registered:     bool,
  pub created_at:        Option<String>,
  pub updated_at:        Option<String>,
}

impl RawEmployee {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      employee_id:       row.get(1)?,
      name:              row.get(2)?,
      first_name:        row.get(3)?,
      last_name:         row.get(4)?,
      email:             row.get(5)?,
      phone:             row.get(6)?,
      department:        row.get(7)?,
      position:          row.get(8)?,
      role:              row.get(9)?,
      salary:            row.get(10)?,
      hire_date:         row.get(11)?,
      status:            row.get(12)?,
      emergency_contact: row.get(13)?,
      uid:               row.get(14)?,
      is_registered:     row.get(15)?,
      created_at:        row.get(16)?,
      updated_at:        row.get(17)?,
    })
  }

  pub fn into_employee(self) -> Result<EmployeeProfile> {
    Ok(EmployeeProfile {
      id:                decode_uuid(&self.id)?,
      employee_id:       self.employee_id,
      name:              self.name,
      first_name:        self.first_name,
      last_name:         self.last_name,
      email:             self.email,
      phone:             self.phone,
      department:        self.department,
      position:          self.position,
      role:              decode_enum("role", self.role)?,
      salary:            self.salary,
      hire_date:         decode_date(&self.hire_date)?,
      status:            decode_enum("employee status", self.status)?,
      emergency_contact: self
        .emergency_contact
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?,
      uid:               decode_opt_uuid(self.uid)?,
      is_registered:     self.is_registered,
      created_at:        decode_dt_or_now(self.created_at)?,
      updated_at:        decode_dt_or_now(self.updated_at)?,
    })
  }
}

pub const DEPARTMENT_COLUMNS: &str =
  "id, name, description, head, created_at, updated_at";

pub struct RawDepartment {
  pub id:          String,
  pub name:        String,
  pub description: String,
  pub head:        Option<String>,
  pub created_at:  Option<String>,
  pub updated_at:  Option<String>,
}

impl RawDepartment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      name:        row.get(1)?,
      description: row.get(2)?,
      head:        row.get(3)?,
      created_at:  row.get(4)?,
      updated_at:  row.get(5)?,
    })
  }

  pub fn into_department(self) -> Result<Department> {
    Ok(Department {
      id:          decode_uuid(&self.id)?,
      name:        self.name,
      description: self.description,
      head:        self.head,
      created_at:  decode_dt_or_now(self.created_at)?,
      updated_at:  decode_dt_or_now(self.updated_at)?,
    })
  }
}

pub const LEAVE_COLUMNS: &str = "id, employee_uid, employee_name, department, leave_type, start_date, end_date, days, reason, status, reviewed_by, reviewer_name, review_comment, reviewed_at, created_at, updated_at";

pub struct RawLeave {
  pub id:             String,
  pub employee_uid:   String,
  pub employee_name:  String,
  pub department:     String,
  pub leave_type:     String,
  pub start_date:     String,
  pub end_date:       String,
  pub days:           i64,
  pub reason:         String,
  pub status:         String,
  pub reviewed_by:    Option<String>,
  pub reviewer_name:  Option<String>,
  pub review_comment: Option<String>,
  pub reviewed_at:    Option<String>,
  pub created_at:     Option<String>,
  pub updated_at:     Option<String>,
}

impl RawLeave {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      employee_uid:   row.get(1)?,
      employee_name:  row.get(2)?,
      department:     row.get(3)?,
      leave_type:     row.get(4)?,
      start_date:     row.get(5)?,
      end_date:       row.get(6)?,
      days:           row.get(7)?,
      reason:         row.get(8)?,
      status:         row.get(9)?,
      reviewed_by:    row.get(10)?,
      reviewer_name:  row.get(11)?,
      review_comment: row.get(12)?,
      reviewed_at:    row.get(13)?,
      created_at:     row.get(14)?,
      updated_at:     row.get(15)?,
    })
  }

  pub fn into_leave(self) -> Result<LeaveRequest> {
    Ok(LeaveRequest {
      id:             decode_uuid(&self.id)?,
      employee_uid:   decode_uuid(&self.employee_uid)?,
      employee_name:  self.employee_name,
      department:     self.department,
      leave_type:     decode_enum("leave type", self.leave_type)?,
      start_date:     decode_date(&self.start_date)?,
      end_date:       decode_date(&self.end_date)?,
      days:           self.days,
      reason:         self.reason,
      status:         decode_enum("leave status", self.status)?,
      reviewed_by:    decode_opt_uuid(self.reviewed_by)?,
      reviewer_name:  self.reviewer_name,
      review_comment: self.review_comment,
      reviewed_at:    decode_opt_dt(self.reviewed_at)?,
      created_at:     decode_dt_or_now(self.created_at)?,
      updated_at:     decode_dt_or_now(self.updated_at)?,
    })
  }
}
