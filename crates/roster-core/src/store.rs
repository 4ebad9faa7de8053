//! The `DirectoryStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `roster-store-sqlite`).
//! Higher layers depend on this abstraction, not on any concrete backend.
//!
//! Each collection gets typed operations instead of a schemaless
//! `collection/filter` interface. Writes that must happen at most once
//! (redeeming an invitation, linking an employee, reviewing a leave request)
//! are single compare-and-set operations that report whether they won.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  department::{Department, DepartmentUpdate, NewDepartment},
  employee::{EmployeeProfile, EmployeeQuery, EmployeeUpdate, NewEmployee},
  error::StoreError,
  invitation::{InvitationCode, NewInvitation},
  leave::{LeaveQuery, LeaveRequest, LeaveReview, LeaveStatus, NewLeaveRequest},
  subscription::Subscription,
  user::UserProfile,
};

/// Abstraction over a directory backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait DirectoryStore: Send + Sync {
  type Error: StoreError;

  // ── Invitation codes ──────────────────────────────────────────────────

  /// Persist a new, unused invitation code.
  fn insert_invitation(
    &self,
    input: NewInvitation,
  ) -> impl Future<Output = Result<InvitationCode, Self::Error>> + Send + '_;

  /// All unused codes whose `code` equals `code` exactly, oldest first
  /// (`created_at`, then `id`). Expiry is not filtered here.
  fn find_unused_invitations<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Vec<InvitationCode>, Self::Error>> + Send + 'a;

  /// Atomically mark an unused code as used. Returns `false` if the code does
  /// not exist or was already used.
  fn redeem_invitation(
    &self,
    id: Uuid,
    used_by: Uuid,
    used_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// All codes, newest first.
  fn list_invitations(
    &self,
  ) -> impl Future<Output = Result<Vec<InvitationCode>, Self::Error>> + Send + '_;

  fn delete_invitation(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  fn get_user(
    &self,
    uid: Uuid,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + '_;

  /// Insert or replace the profile keyed by `profile.id`.
  fn put_user(
    &self,
    profile: UserProfile,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Employees ─────────────────────────────────────────────────────────

  fn create_employee(
    &self,
    input: NewEmployee,
  ) -> impl Future<Output = Result<EmployeeProfile, Self::Error>> + Send + '_;

  fn get_employee(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<EmployeeProfile>, Self::Error>> + Send + '_;

  /// The employee record linked to identity `uid`, if any.
  fn get_employee_by_uid(
    &self,
    uid: Uuid,
  ) -> impl Future<Output = Result<Option<EmployeeProfile>, Self::Error>> + Send + '_;

  /// The unregistered employee with this email (case-insensitive), if any.
  fn find_unregistered_employee<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<EmployeeProfile>, Self::Error>> + Send + 'a;

  /// Atomically link an unregistered employee to `uid` and mark it
  /// registered. Returns `false` if the record is gone or already registered.
  fn link_employee(
    &self,
    id: Uuid,
    uid: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Returns the updated record, or `None` if it does not exist.
  fn update_employee(
    &self,
    id: Uuid,
    update: EmployeeUpdate,
  ) -> impl Future<Output = Result<Option<EmployeeProfile>, Self::Error>> + Send + '_;

  fn delete_employee(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn list_employees<'a>(
    &'a self,
    query: &'a EmployeeQuery,
  ) -> impl Future<Output = Result<Vec<EmployeeProfile>, Self::Error>> + Send + 'a;

  // ── Departments ───────────────────────────────────────────────────────

  fn create_department(
    &self,
    input: NewDepartment,
  ) -> impl Future<Output = Result<Department, Self::Error>> + Send + '_;

  fn get_department(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Department>, Self::Error>> + Send + '_;

  /// All departments ordered by name.
  fn list_departments(
    &self,
  ) -> impl Future<Output = Result<Vec<Department>, Self::Error>> + Send + '_;

  fn update_department(
    &self,
    id: Uuid,
    update: DepartmentUpdate,
  ) -> impl Future<Output = Result<Option<Department>, Self::Error>> + Send + '_;

  fn delete_department(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Leave requests ────────────────────────────────────────────────────

  /// Persist a `pending` request. `days` is computed by the caller.
  fn create_leave_request(
    &self,
    input: NewLeaveRequest,
    days: i64,
  ) -> impl Future<Output = Result<LeaveRequest, Self::Error>> + Send + '_;

  fn get_leave_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<LeaveRequest>, Self::Error>> + Send + '_;

  /// Matching requests, newest first.
  fn list_leave_requests<'a>(
    &'a self,
    query: &'a LeaveQuery,
  ) -> impl Future<Output = Result<Vec<LeaveRequest>, Self::Error>> + Send + 'a;

  /// Atomically move a `pending` request to the reviewed status. Returns
  /// `None` if the request does not exist or is no longer pending.
  fn review_leave_request(
    &self,
    id: Uuid,
    review: LeaveReview,
  ) -> impl Future<Output = Result<Option<LeaveRequest>, Self::Error>> + Send + '_;

  /// Atomically move a `pending` request to `to`, without reviewer details.
  /// Used for owner cancellation.
  fn set_leave_status(
    &self,
    id: Uuid,
    to: LeaveStatus,
  ) -> impl Future<Output = Result<Option<LeaveRequest>, Self::Error>> + Send + '_;

  fn delete_leave_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Subscribe to the requests matching `query`. The first snapshot is sent
  /// immediately; another follows every write to the leave collection.
  fn subscribe_leave_requests(
    &self,
    query: LeaveQuery,
  ) -> Subscription<Vec<LeaveRequest>>;
}
