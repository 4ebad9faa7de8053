//! [`SqliteStore`], the SQLite implementation of [`DirectoryStore`].

use std::path::Path;

use argon2::Argon2;
use chrono::{DateTime, Utc};
use roster_core::{
  department::{Department, DepartmentUpdate, NewDepartment},
  employee::{EmployeeProfile, EmployeeQuery, EmployeeUpdate, NewEmployee},
  invitation::{InvitationCode, NewInvitation},
  leave::{LeaveQuery, LeaveRequest, LeaveReview, LeaveStatus, NewLeaveRequest},
  store::DirectoryStore,
  subscription::Subscription,
  user::UserProfile,
};
use rusqlite::{ErrorCode, OptionalExtension as _, Row, params_from_iter, types::Value};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    DEPARTMENT_COLUMNS, EMPLOYEE_COLUMNS, INVITATION_COLUMNS, LEAVE_COLUMNS,
    RawDepartment, RawEmployee, RawInvitation, RawLeave, RawUser, USER_COLUMNS,
    encode_contact, encode_date, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Change feed ─────────────────────────────────────────────────────────────

/// The collection touched by a write, broadcast to live subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
  Invitations,
  Users,
  Employees,
  Departments,
  LeaveRequests,
}

const CHANGE_FEED_CAPACITY: usize = 64;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Roster directory and identity store backed by a single SQLite file.
///
/// Clones share one connection and one change feed.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn:   tokio_rusqlite::Connection,
  pub(crate) hasher: Argon2<'static>,
  changes:           broadcast::Sender<Collection>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
    let store = Self { conn, hasher: Argon2::default(), changes };
    store
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(store)
  }

  /// Replace the password hasher, e.g. with cheaper parameters for tests.
  pub fn with_hasher(mut self, hasher: Argon2<'static>) -> Self {
    self.hasher = hasher;
    self
  }

  fn notify(&self, collection: Collection) {
    // No receivers is the common case.
    let _ = self.changes.send(collection);
  }

  // ── Generic helpers ───────────────────────────────────────────────────────

  async fn fetch_all<R: Send + 'static>(
    &self,
    sql: String,
    params: Vec<Value>,
    map: fn(&Row<'_>) -> rusqlite::Result<R>,
  ) -> Result<Vec<R>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(params), map)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn fetch_opt<R: Send + 'static>(
    &self,
    sql: String,
    params: Vec<Value>,
    map: fn(&Row<'_>) -> rusqlite::Result<R>,
  ) -> Result<Option<R>> {
    let row = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, params_from_iter(params), map).optional()?))
      .await?;
    Ok(row)
  }

  /// Run one statement; returns the number of changed rows.
  async fn execute(&self, sql: &'static str, params: Vec<Value>) -> Result<usize> {
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, params_from_iter(params))?))
      .await?;
    Ok(changed)
  }
}

/// Build ` WHERE a AND b` from the given conditions, or an empty string.
fn where_clause(conds: &[&str]) -> String {
  if conds.is_empty() {
    String::new()
  } else {
    format!(" WHERE {}", conds.join(" AND "))
  }
}

/// Turn a violation of `employees_pending_email_idx` into
/// [`Error::DuplicateEmail`].
fn pending_email_clash(e: tokio_rusqlite::Error, email: Option<&str>) -> Error {
  if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, Some(msg))) = &e
    && f.code == ErrorCode::ConstraintViolation
    && (msg.contains("employees.email") || msg.contains("employees_pending_email_idx"))
  {
    return Error::DuplicateEmail(email.unwrap_or_default().to_owned());
  }
  Error::Database(e)
}

// ─── DirectoryStore impl ─────────────────────────────────────────────────────

impl DirectoryStore for SqliteStore {
  type Error = crate::Error;

  // ── Invitation codes ──────────────────────────────────────────────────────

  async fn insert_invitation(&self, input: NewInvitation) -> Result<InvitationCode> {
    let invitation = InvitationCode {
      id:              Uuid::new_v4(),
      code:            input.code,
      role:            input.role,
      created_by:      input.created_by,
      created_by_name: input.created_by_name,
      is_used:         false,
      used_by:         None,
      used_at:         None,
      expires_at:      input.expires_at,
      created_at:      input.created_at,
    };

    self
      .execute(
        "INSERT INTO invitation_codes
           (id, code, role, created_by, created_by_name, is_used, expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7)",
        vec![
          encode_uuid(invitation.id).into(),
          invitation.code.clone().into(),
          invitation.role.as_ref().to_owned().into(),
          encode_uuid(invitation.created_by).into(),
          invitation.created_by_name.clone().into(),
          encode_dt(invitation.expires_at).into(),
          encode_dt(invitation.created_at).into(),
        ],
      )
      .await?;

    self.notify(Collection::Invitations);
    Ok(invitation)
  }

  async fn find_unused_invitations(&self, code: &str) -> Result<Vec<InvitationCode>> {
    self
      .fetch_all(
        format!(
          "SELECT {INVITATION_COLUMNS} FROM invitation_codes
           WHERE code = ?1 AND is_used = 0
           ORDER BY created_at ASC, id ASC"
        ),
        vec![code.to_owned().into()],
        RawInvitation::from_row,
      )
      .await?
      .into_iter()
      .map(RawInvitation::into_invitation)
      .collect()
  }

  async fn redeem_invitation(
    &self,
    id: Uuid,
    used_by: Uuid,
    used_at: DateTime<Utc>,
  ) -> Result<bool> {
    let changed = self
      .execute(
        "UPDATE invitation_codes SET is_used = 1, used_by = ?2, used_at = ?3
         WHERE id = ?1 AND is_used = 0",
        vec![
          encode_uuid(id).into(),
          encode_uuid(used_by).into(),
          encode_dt(used_at).into(),
        ],
      )
      .await?;
    if changed == 1 {
      self.notify(Collection::Invitations);
    }
    Ok(changed == 1)
  }

  async fn list_invitations(&self) -> Result<Vec<InvitationCode>> {
    self
      .fetch_all(
        format!(
          "SELECT {INVITATION_COLUMNS} FROM invitation_codes ORDER BY created_at DESC, id"
        ),
        vec![],
        RawInvitation::from_row,
      )
      .await?
      .into_iter()
      .map(RawInvitation::into_invitation)
      .collect()
  }

  async fn delete_invitation(&self, id: Uuid) -> Result<bool> {
    let changed = self
      .execute(
        "DELETE FROM invitation_codes WHERE id = ?1",
        vec![encode_uuid(id).into()],
      )
      .await?;
    if changed == 1 {
      self.notify(Collection::Invitations);
    }
    Ok(changed == 1)
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn get_user(&self, uid: Uuid) -> Result<Option<UserProfile>> {
    self
      .fetch_opt(
        format!("SELECT {USER_COLUMNS} FROM users WHERE uid = ?1"),
        vec![encode_uuid(uid).into()],
        RawUser::from_row,
      )
      .await?
      .map(RawUser::into_user)
      .transpose()
  }

  async fn put_user(&self, profile: UserProfile) -> Result<()> {
    self
      .execute(
        "INSERT INTO users (uid, email, name, role, department, position, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT (uid) DO UPDATE SET
           email = excluded.email, name = excluded.name, role = excluded.role,
           department = excluded.department, position = excluded.position,
           updated_at = excluded.updated_at",
        vec![
          encode_uuid(profile.id).into(),
          profile.email.into(),
          profile.name.into(),
          profile.role.as_ref().to_owned().into(),
          profile.department.into(),
          profile.position.into(),
          encode_dt(profile.created_at).into(),
          encode_dt(profile.updated_at).into(),
        ],
      )
      .await?;
    self.notify(Collection::Users);
    Ok(())
  }

  // ── Employees ─────────────────────────────────────────────────────────────

  async fn create_employee(&self, input: NewEmployee) -> Result<EmployeeProfile> {
    let now = Utc::now();
    let employee = EmployeeProfile {
      id:                Uuid::new_v4(),
      employee_id:       input.employee_id,
      name:              input.name,
      first_name:        input.first_name,
      last_name:         input.last_name,
      email:             input.email.trim().to_owned(),
      phone:             input.phone,
      department:        input.department,
      position:          input.position,
      role:              input.role,
      salary:            input.salary,
      hire_date:         input.hire_date,
      status:            input.status,
      emergency_contact: input.emergency_contact,
      uid:               None,
      is_registered:     false,
      created_at:        now,
      updated_at:        now,
    };

    self
      .execute(
        "INSERT INTO employees (
           id, employee_id, name, first_name, last_name, email, phone,
           department, position, role, salary, hire_date, status,
           emergency_contact, uid, is_registered, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, NULL, 0, ?15, ?15)",
        vec![
          encode_uuid(employee.id).into(),
          employee.employee_id.clone().into(),
          employee.name.clone().into(),
          employee.first_name.clone().into(),
          employee.last_name.clone().into(),
          employee.email.clone().into(),
          employee.phone.clone().into(),
          employee.department.clone().into(),
          employee.position.clone().into(),
          employee.role.as_ref().to_owned().into(),
          employee.salary.into(),
          encode_date(employee.hire_date).into(),
          employee.status.as_ref().to_owned().into(),
          encode_contact(employee.emergency_contact.as_ref())?.into(),
          encode_dt(now).into(),
        ],
      )
      .await
      .map_err(|e| match e {
        Error::Database(e) => pending_email_clash(e, Some(&employee.email)),
        e => e,
      })?;

    self.notify(Collection::Employees);
    Ok(employee)
  }

  async fn get_employee(&self, id: Uuid) -> Result<Option<EmployeeProfile>> {
    self
      .fetch_opt(
        format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1"),
        vec![encode_uuid(id).into()],
        RawEmployee::from_row,
      )
      .await?
      .map(RawEmployee::into_employee)
      .transpose()
  }

  async fn get_employee_by_uid(&self, uid: Uuid) -> Result<Option<EmployeeProfile>> {
    self
      .fetch_opt(
        format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE uid = ?1"),
        vec![encode_uuid(uid).into()],
        RawEmployee::from_row,
      )
      .await?
      .map(RawEmployee::into_employee)
      .transpose()
  }

  async fn find_unregistered_employee(&self, email: &str) -> Result<Option<EmployeeProfile>> {
    self
      .fetch_opt(
        format!(
          "SELECT {EMPLOYEE_COLUMNS} FROM employees
           WHERE email = ?1 COLLATE NOCASE AND is_registered = 0
           ORDER BY created_at ASC, id ASC
           LIMIT 1"
        ),
        vec![email.trim().to_owned().into()],
        RawEmployee::from_row,
      )
      .await?
      .map(RawEmployee::into_employee)
      .transpose()
  }

  async fn link_employee(&self, id: Uuid, uid: Uuid) -> Result<bool> {
    let changed = self
      .execute(
        "UPDATE employees SET uid = ?2, is_registered = 1, updated_at = ?3
         WHERE id = ?1 AND is_registered = 0",
        vec![
          encode_uuid(id).into(),
          encode_uuid(uid).into(),
          encode_dt(Utc::now()).into(),
        ],
      )
      .await?;
    if changed == 1 {
      self.notify(Collection::Employees);
    }
    Ok(changed == 1)
  }

  async fn update_employee(
    &self,
    id: Uuid,
    update: EmployeeUpdate,
  ) -> Result<Option<EmployeeProfile>> {
    let email = update.email.as_deref().map(|e| e.trim().to_owned());
    let params: Vec<Value> = vec![
      encode_uuid(id).into(),
      update.employee_id.into(),
      update.name.into(),
      update.first_name.into(),
      update.last_name.into(),
      email.clone().into(),
      update.phone.into(),
      update.department.into(),
      update.position.into(),
      update.role.map(|r| r.as_ref().to_owned()).into(),
      update.salary.into(),
      update.hire_date.map(encode_date).into(),
      update.status.map(|s| s.as_ref().to_owned()).into(),
      encode_contact(update.emergency_contact.as_ref())?.into(),
      encode_dt(Utc::now()).into(),
    ];

    // Update and re-read in one call so no other write lands between them.
    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE employees SET
             employee_id       = COALESCE(?2, employee_id),
             name              = COALESCE(?3, name),
             first_name        = COALESCE(?4, first_name),
             last_name         = COALESCE(?5, last_name),
             email             = COALESCE(?6, email),
             phone             = COALESCE(?7, phone),
             department        = COALESCE(?8, department),
             position          = COALESCE(?9, position),
             role              = COALESCE(?10, role),
             salary            = COALESCE(?11, salary),
             hire_date         = COALESCE(?12, hire_date),
             status            = COALESCE(?13, status),
             emergency_contact = COALESCE(?14, emergency_contact),
             updated_at        = ?15
           WHERE id = ?1",
          params_from_iter(&params),
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let row = conn.query_row(
          &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1"),
          params_from_iter(&params[..1]),
          RawEmployee::from_row,
        )?;
        Ok(Some(row))
      })
      .await
      .map_err(|e| pending_email_clash(e, email.as_deref()))?;

    let Some(raw) = raw else {
      return Ok(None);
    };
    self.notify(Collection::Employees);
    raw.into_employee().map(Some)
  }

  async fn delete_employee(&self, id: Uuid) -> Result<bool> {
    let changed = self
      .execute("DELETE FROM employees WHERE id = ?1", vec![encode_uuid(id).into()])
      .await?;
    if changed == 1 {
      self.notify(Collection::Employees);
    }
    Ok(changed == 1)
  }

  async fn list_employees(&self, query: &EmployeeQuery) -> Result<Vec<EmployeeProfile>> {
    let mut conds: Vec<&str> = vec![];
    let mut params: Vec<Value> = vec![];
    if let Some(d) = &query.department {
      params.push(d.clone().into());
      conds.push("department = ?");
    }
    if let Some(s) = query.status {
      params.push(s.as_ref().to_owned().into());
      conds.push("status = ?");
    }
    if let Some(r) = query.is_registered {
      params.push(r.into());
      conds.push("is_registered = ?");
    }

    let sql = format!(
      "SELECT {EMPLOYEE_COLUMNS} FROM employees{} ORDER BY name, employee_id",
      where_clause(&conds)
    );
    self
      .fetch_all(sql, params, RawEmployee::from_row)
      .await?
      .into_iter()
      .map(RawEmployee::into_employee)
      .collect()
  }

  // ── Departments ───────────────────────────────────────────────────────────

  async fn create_department(&self, input: NewDepartment) -> Result<Department> {
    let now = Utc::now();
    let department = Department {
      id:          Uuid::new_v4(),
      name:        input.name,
      description: input.description,
      head:        input.head,
      created_at:  now,
      updated_at:  now,
    };
    self
      .execute(
        "INSERT INTO departments (id, name, description, head, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        vec![
          encode_uuid(department.id).into(),
          department.name.clone().into(),
          department.description.clone().into(),
          department.head.clone().into(),
          encode_dt(now).into(),
        ],
      )
      .await?;
    self.notify(Collection::Departments);
    Ok(department)
  }

  async fn get_department(&self, id: Uuid) -> Result<Option<Department>> {
    self
      .fetch_opt(
        format!("SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE id = ?1"),
        vec![encode_uuid(id).into()],
        RawDepartment::from_row,
      )
      .await?
      .map(RawDepartment::into_department)
      .transpose()
  }

  async fn list_departments(&self) -> Result<Vec<Department>> {
    self
      .fetch_all(
        format!("SELECT {DEPARTMENT_COLUMNS} FROM departments ORDER BY name, id"),
        vec![],
        RawDepartment::from_row,
      )
      .await?
      .into_iter()
      .map(RawDepartment::into_department)
      .collect()
  }

  async fn update_department(
    &self,
    id: Uuid,
    update: DepartmentUpdate,
  ) -> Result<Option<Department>> {
    let Some(mut department) = self.get_department(id).await? else {
      return Ok(None);
    };
    update.apply(&mut department, Utc::now());
    self
      .execute(
        "UPDATE departments SET name = ?2, description = ?3, head = ?4, updated_at = ?5
         WHERE id = ?1",
        vec![
          encode_uuid(id).into(),
          department.name.clone().into(),
          department.description.clone().into(),
          department.head.clone().into(),
          encode_dt(department.updated_at).into(),
        ],
      )
      .await?;
    self.notify(Collection::Departments);
    Ok(Some(department))
  }

  async fn delete_department(&self, id: Uuid) -> Result<bool> {
    let changed = self
      .execute("DELETE FROM departments WHERE id = ?1", vec![encode_uuid(id).into()])
      .await?;
    if changed == 1 {
      self.notify(Collection::Departments);
    }
    Ok(changed == 1)
  }

  // ── Leave requests ────────────────────────────────────────────────────────

  async fn create_leave_request(
    &self,
    input: NewLeaveRequest,
    days: i64,
  ) -> Result<LeaveRequest> {
    let now = Utc::now();
    let request = LeaveRequest {
      id:             Uuid::new_v4(),
      employee_uid:   input.employee_uid,
      employee_name:  input.employee_name,
      department:     input.department,
      leave_type:     input.leave_type,
      start_date:     input.start_date,
      end_date:       input.end_date,
      days,
      reason:         input.reason,
      status:         LeaveStatus::Pending,
      reviewed_by:    None,
      reviewer_name:  None,
      review_comment: None,
      reviewed_at:    None,
      created_at:     now,
      updated_at:     now,
    };
    self
      .execute(
        "INSERT INTO leave_requests (
           id, employee_uid, employee_name, department, leave_type,
           start_date, end_date, days, reason, status, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'pending', ?10, ?10)",
        vec![
          encode_uuid(request.id).into(),
          encode_uuid(request.employee_uid).into(),
          request.employee_name.clone().into(),
          request.department.clone().into(),
          request.leave_type.as_ref().to_owned().into(),
          encode_date(request.start_date).into(),
          encode_date(request.end_date).into(),
          days.into(),
          request.reason.clone().into(),
          encode_dt(now).into(),
        ],
      )
      .await?;
    self.notify(Collection::LeaveRequests);
    Ok(request)
  }

  async fn get_leave_request(&self, id: Uuid) -> Result<Option<LeaveRequest>> {
    self
      .fetch_opt(
        format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?1"),
        vec![encode_uuid(id).into()],
        RawLeave::from_row,
      )
      .await?
      .map(RawLeave::into_leave)
      .transpose()
  }

  async fn list_leave_requests(&self, query: &LeaveQuery) -> Result<Vec<LeaveRequest>> {
    let mut conds: Vec<&str> = vec![];
    let mut params: Vec<Value> = vec![];
    if let Some(uid) = query.employee_uid {
      params.push(encode_uuid(uid).into());
      conds.push("employee_uid = ?");
    }
    if let Some(d) = &query.department {
      params.push(d.clone().into());
      conds.push("department = ?");
    }
    if let Some(s) = query.status {
      params.push(s.as_ref().to_owned().into());
      conds.push("status = ?");
    }

    let sql = format!(
      "SELECT {LEAVE_COLUMNS} FROM leave_requests{} ORDER BY created_at DESC, id",
      where_clause(&conds)
    );
    self
      .fetch_all(sql, params, RawLeave::from_row)
      .await?
      .into_iter()
      .map(RawLeave::into_leave)
      .collect()
  }

  async fn review_leave_request(
    &self,
    id: Uuid,
    review: LeaveReview,
  ) -> Result<Option<LeaveRequest>> {
    let status: LeaveStatus = review.decision.into();
    let changed = self
      .execute(
        "UPDATE leave_requests SET
           status = ?2, reviewed_by = ?3, reviewer_name = ?4,
           review_comment = ?5, reviewed_at = ?6, updated_at = ?6
         WHERE id = ?1 AND status = 'pending'",
        vec![
          encode_uuid(id).into(),
          status.as_ref().to_owned().into(),
          encode_uuid(review.reviewer_uid).into(),
          review.reviewer_name.into(),
          review.comment.into(),
          encode_dt(Utc::now()).into(),
        ],
      )
      .await?;
    if changed == 0 {
      return Ok(None);
    }
    self.notify(Collection::LeaveRequests);
    self.get_leave_request(id).await
  }

  async fn set_leave_status(&self, id: Uuid, to: LeaveStatus) -> Result<Option<LeaveRequest>> {
    let changed = self
      .execute(
        "UPDATE leave_requests SET status = ?2, updated_at = ?3
         WHERE id = ?1 AND status = 'pending'",
        vec![
          encode_uuid(id).into(),
          to.as_ref().to_owned().into(),
          encode_dt(Utc::now()).into(),
        ],
      )
      .await?;
    if changed == 0 {
      return Ok(None);
    }
    self.notify(Collection::LeaveRequests);
    self.get_leave_request(id).await
  }

  async fn delete_leave_request(&self, id: Uuid) -> Result<bool> {
    let changed = self
      .execute("DELETE FROM leave_requests WHERE id = ?1", vec![encode_uuid(id).into()])
      .await?;
    if changed == 1 {
      self.notify(Collection::LeaveRequests);
    }
    Ok(changed == 1)
  }

  fn subscribe_leave_requests(&self, query: LeaveQuery) -> Subscription<Vec<LeaveRequest>> {
    let store = self.clone();
    // Subscribe before the first read so no write slips between the two.
    let mut changes = self.changes.subscribe();

    Subscription::spawn(move |tx| async move {
      loop {
        let snapshot = store
          .list_leave_requests(&query)
          .await
          .map_err(roster_core::Error::persistence);
        if tx.send(snapshot).is_err() {
          return;
        }

        loop {
          tokio::select! {
            _ = tx.closed() => return,
            change = changes.recv() => match change {
              Ok(Collection::LeaveRequests) => break,
              Ok(_) => continue,
              // Missed some writes; a fresh read catches up.
              Err(broadcast::error::RecvError::Lagged(_)) => break,
              Err(broadcast::error::RecvError::Closed) => return,
            },
          }
        }
      }
    })
  }
}
