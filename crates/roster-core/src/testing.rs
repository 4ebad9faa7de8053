//! Backend wrappers for exercising slow reads and lost races.
//!
//! [`Faulty`] forwards every [`DirectoryStore`] and [`IdentityProvider`] call
//! to the wrapped backend, except the ones it was told to disturb.

use std::{future::Future, time::Duration};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  department::{Department, DepartmentUpdate, NewDepartment},
  employee::{EmployeeProfile, EmployeeQuery, EmployeeUpdate, NewEmployee},
  identity::{Identity, IdentityError, IdentityProvider, NewAccount},
  invitation::{InvitationCode, NewInvitation},
  leave::{LeaveQuery, LeaveRequest, LeaveReview, LeaveStatus, NewLeaveRequest},
  store::DirectoryStore,
  subscription::Subscription,
  user::UserProfile,
};

#[derive(Debug, Clone)]
pub struct Faulty<S> {
  inner:                S,
  user_read_delay:      Option<Duration>,
  first_snapshot_delay: Option<Duration>,
  lose_links:           bool,
}

impl<S> Faulty<S> {
  pub fn new(inner: S) -> Self {
    Self {
      inner,
      user_read_delay: None,
      first_snapshot_delay: None,
      lose_links: false,
    }
  }

  /// Sleep for `delay` before every `get_user`.
  pub fn delay_user_reads(mut self, delay: Duration) -> Self {
    self.user_read_delay = Some(delay);
    self
  }

  /// Hold back the first snapshot of every leave subscription for `delay`.
  pub fn delay_first_snapshot(mut self, delay: Duration) -> Self {
    self.first_snapshot_delay = Some(delay);
    self
  }

  /// Make every `link_employee` report that another writer got there first.
  pub fn lose_employee_links(mut self) -> Self {
    self.lose_links = true;
    self
  }

  pub fn inner(&self) -> &S { &self.inner }
}

impl<S: DirectoryStore> DirectoryStore for Faulty<S> {
  type Error = S::Error;

  fn insert_invitation(
    &self,
    input: NewInvitation,
  ) -> impl Future<Output = Result<InvitationCode, Self::Error>> + Send + '_ {
    self.inner.insert_invitation(input)
  }

  fn find_unused_invitations<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Vec<InvitationCode>, Self::Error>> + Send + 'a {
    self.inner.find_unused_invitations(code)
  }

  fn redeem_invitation(
    &self,
    id: Uuid,
    used_by: Uuid,
    used_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_ {
    self.inner.redeem_invitation(id, used_by, used_at)
  }

  fn list_invitations(
    &self,
  ) -> impl Future<Output = Result<Vec<InvitationCode>, Self::Error>> + Send + '_ {
    self.inner.list_invitations()
  }

  fn delete_invitation(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_ {
    self.inner.delete_invitation(id)
  }

  async fn get_user(&self, uid: Uuid) -> Result<Option<UserProfile>, Self::Error> {
    if let Some(delay) = self.user_read_delay {
      tokio::time::sleep(delay).await;
    }
    self.inner.get_user(uid).await
  }

  fn put_user(
    &self,
    profile: UserProfile,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_ {
    self.inner.put_user(profile)
  }

  fn create_employee(
    &self,
    input: NewEmployee,
  ) -> impl Future<Output = Result<EmployeeProfile, Self::Error>> + Send + '_ {
    self.inner.create_employee(input)
  }

  fn get_employee(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<EmployeeProfile>, Self::Error>> + Send + '_ {
    self.inner.get_employee(id)
  }

  fn get_employee_by_uid(
    &self,
    uid: Uuid,
  ) -> impl Future<Output = Result<Option<EmployeeProfile>, Self::Error>> + Send + '_ {
    self.inner.get_employee_by_uid(uid)
  }

  fn find_unregistered_employee<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<EmployeeProfile>, Self::Error>> + Send + 'a {
    self.inner.find_unregistered_employee(email)
  }

  async fn link_employee(&self, id: Uuid, uid: Uuid) -> Result<bool, Self::Error> {
    if self.lose_links {
      return Ok(false);
    }
    self.inner.link_employee(id, uid).await
  }

  fn update_employee(
    &self,
    id: Uuid,
    update: EmployeeUpdate,
  ) -> impl Future<Output = Result<Option<EmployeeProfile>, Self::Error>> + Send + '_ {
    self.inner.update_employee(id, update)
  }

  fn delete_employee(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_ {
    self.inner.delete_employee(id)
  }

  fn list_employees<'a>(
    &'a self,
    query: &'a EmployeeQuery,
  ) -> impl Future<Output = Result<Vec<EmployeeProfile>, Self::Error>> + Send + 'a {
    self.inner.list_employees(query)
  }

  fn create_department(
    &self,
    input: NewDepartment,
  ) -> impl Future<Output = Result<Department, Self::Error>> + Send + '_ {
    self.inner.create_department(input)
  }

  fn get_department(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Department>, Self::Error>> + Send + '_ {
    self.inner.get_department(id)
  }

  fn list_departments(
    &self,
  ) -> impl Future<Output = Result<Vec<Department>, Self::Error>> + Send + '_ {
    self.inner.list_departments()
  }

  fn update_department(
    &self,
    id: Uuid,
    update: DepartmentUpdate,
  ) -> impl Future<Output = Result<Option<Department>, Self::Error>> + Send + '_ {
    self.inner.update_department(id, update)
  }

  fn delete_department(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_ {
    self.inner.delete_department(id)
  }

  fn create_leave_request(
    &self,
    input: NewLeaveRequest,
    days: i64,
  ) -> impl Future<Output = Result<LeaveRequest, Self::Error>> + Send + '_ {
    self.inner.create_leave_request(input, days)
  }

  fn get_leave_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<LeaveRequest>, Self::Error>> + Send + '_ {
    self.inner.get_leave_request(id)
  }

  fn list_leave_requests<'a>(
    &'a self,
    query: &'a LeaveQuery,
  ) -> impl Future<Output = Result<Vec<LeaveRequest>, Self::Error>> + Send + 'a {
    self.inner.list_leave_requests(query)
  }

  fn review_leave_request(
    &self,
    id: Uuid,
    review: LeaveReview,
  ) -> impl Future<Output = Result<Option<LeaveRequest>, Self::Error>> + Send + '_ {
    self.inner.review_leave_request(id, review)
  }

  fn set_leave_status(
    &self,
    id: Uuid,
    to: LeaveStatus,
  ) -> impl Future<Output = Result<Option<LeaveRequest>, Self::Error>> + Send + '_ {
    self.inner.set_leave_status(id, to)
  }

  fn delete_leave_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_ {
    self.inner.delete_leave_request(id)
  }

  fn subscribe_leave_requests(&self, query: LeaveQuery) -> Subscription<Vec<LeaveRequest>> {
    let mut upstream = self.inner.subscribe_leave_requests(query);
    let Some(delay) = self.first_snapshot_delay else {
      return upstream;
    };
    Subscription::spawn(move |tx| async move {
      tokio::time::sleep(delay).await;
      while let Some(snapshot) = upstream.next().await {
        if tx.send(snapshot).is_err() {
          return;
        }
      }
    })
  }
}

impl<P: IdentityProvider> IdentityProvider for Faulty<P> {
  fn create_account(
    &self,
    account: NewAccount,
  ) -> impl Future<Output = Result<Identity, IdentityError>> + Send + '_ {
    self.inner.create_account(account)
  }

  fn authenticate<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Identity, IdentityError>> + Send + 'a {
    self.inner.authenticate(email, password)
  }

  fn delete_account(
    &self,
    uid: Uuid,
  ) -> impl Future<Output = Result<bool, IdentityError>> + Send + '_ {
    self.inner.delete_account(uid)
  }
}
