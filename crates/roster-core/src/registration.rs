//! Registration: creating an identity account and linking it to a
//! role-bearing record.
//!
//! Two strategies exist behind [`RegistrationStrategy`]:
//!
//! - [`InvitationRegistration`] (the default): redeem an invitation code and
//!   write a `users` profile carrying the code's role.
//! - [`EmployeeRegistration`]: claim a pre-provisioned, unregistered
//!   employee record by email.
//!
//! Both validate credentials before touching the identity provider, and both
//! delete the freshly created account if the linking write does not land, so
//! a failed registration does not leave an orphaned account behind.

use std::future::Future;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  error::ValidationError,
  identity::{Identity, IdentityProvider, NewAccount},
  invitation,
  resolver,
  role::Role,
  store::DirectoryStore,
  user::{UserProfile, display_name},
};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

// ─── Input ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
  pub email:            String,
  pub password:         String,
  pub confirm_password: String,
  pub display_name:     Option<String>,
}

impl Credentials {
  /// Form-level checks. Not a security boundary.
  pub fn validate(&self) -> Result<(), ValidationError> {
    let email = self.email.trim();
    if email.is_empty() {
      return Err(ValidationError::Required("email"));
    }
    match email.split_once('@') {
      Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {}
      _ => return Err(ValidationError::InvalidEmail(email.to_owned())),
    }
    if self.password.is_empty() {
      return Err(ValidationError::Required("password"));
    }
    if self.password.chars().count() < MIN_PASSWORD_LENGTH {
      return Err(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LENGTH });
    }
    if self.password != self.confirm_password {
      return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
  }

  fn to_account(&self, fallback_name: Option<&str>) -> NewAccount {
    NewAccount {
      email:        self.email.trim().to_owned(),
      password:     self.password.clone(),
      display_name: self
        .display_name
        .as_deref()
        .or(fallback_name)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
  #[serde(flatten)]
  pub credentials:     Credentials,
  /// Required by [`InvitationRegistration`]; ignored otherwise.
  pub invitation_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registered {
  pub identity: Identity,
  pub profile:  UserProfile,
}

// ─── Strategy ────────────────────────────────────────────────────────────────

pub trait RegistrationStrategy {
  fn register(
    &self,
    request: RegistrationRequest,
  ) -> impl Future<Output = Result<Registered>> + Send;
}

/// Which strategy `POST /register` uses when the caller does not pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationMode {
  #[default]
  Invitation,
  Employee,
}

impl RegistrationMode {
  pub async fn register<S, P>(
    self,
    store: &S,
    provider: &P,
    request: RegistrationRequest,
  ) -> Result<Registered>
  where
    S: DirectoryStore,
    P: IdentityProvider,
  {
    match self {
      Self::Invitation => InvitationRegistration { store, provider }.register(request).await,
      Self::Employee => EmployeeRegistration { store, provider }.register(request).await,
    }
  }
}

/// Delete an account whose link write failed. A failure here leaves an
/// orphaned account, which is logged for manual cleanup.
async fn compensate<P: IdentityProvider>(provider: &P, identity: &Identity) {
  match provider.delete_account(identity.uid).await {
    Ok(_) => tracing::warn!(uid = %identity.uid, "rolled back account after failed link"),
    Err(e) => tracing::error!(
      uid = %identity.uid,
      email = %identity.email,
      error = %e,
      "orphaned account: link failed and account deletion failed"
    ),
  }
}

// ─── Invitation code ─────────────────────────────────────────────────────────

pub struct InvitationRegistration<'a, S, P> {
  pub store:    &'a S,
  pub provider: &'a P,
}

impl<S, P> RegistrationStrategy for InvitationRegistration<'_, S, P>
where
  S: DirectoryStore,
  P: IdentityProvider,
{
  async fn register(&self, request: RegistrationRequest) -> Result<Registered> {
    request.credentials.validate()?;
    let raw = request
      .invitation_code
      .as_deref()
      .filter(|c| !c.trim().is_empty())
      .ok_or(ValidationError::Required("invitation code"))?;

    let code = invitation::verify(self.store, raw)
      .await?
      .ok_or(Error::InvitationNotFound)?;

    let identity = self
      .provider
      .create_account(request.credentials.to_account(None))
      .await?;

    let now = Utc::now();
    match self.store.redeem_invitation(code.id, identity.uid, now).await {
      Ok(true) => {}
      Ok(false) => {
        // Someone else redeemed it between verify and claim.
        compensate(self.provider, &identity).await;
        return Err(Error::InvitationNotFound);
      }
      Err(e) => {
        compensate(self.provider, &identity).await;
        return Err(Error::persistence(e));
      }
    }

    let profile = UserProfile {
      id:         identity.uid,
      email:      identity.email.clone(),
      name:       display_name(
        None,
        None,
        None,
        identity.display_name.as_deref(),
        &identity.email,
      ),
      role:       code.role.into(),
      department: String::new(),
      position:   String::new(),
      created_at: now,
      updated_at: now,
    };

    if let Err(e) = self.store.put_user(profile.clone()).await {
      compensate(self.provider, &identity).await;
      return Err(Error::persistence(e));
    }

    tracing::info!(
      uid = %identity.uid,
      role = %profile.role,
      code_id = %code.id,
      "registered with invitation code"
    );
    Ok(Registered { identity, profile })
  }
}

// ─── Pre-provisioned employee ────────────────────────────────────────────────

pub struct EmployeeRegistration<'a, S, P> {
  pub store:    &'a S,
  pub provider: &'a P,
}

impl<S, P> RegistrationStrategy for EmployeeRegistration<'_, S, P>
where
  S: DirectoryStore,
  P: IdentityProvider,
{
  async fn register(&self, request: RegistrationRequest) -> Result<Registered> {
    request.credentials.validate()?;
    let email = request.credentials.email.trim();

    // Must precede account creation.
    let employee = self
      .store
      .find_unregistered_employee(email)
      .await
      .map_err(Error::persistence)?
      .ok_or_else(|| Error::NoPendingRegistration(email.to_owned()))?;

    let identity = self
      .provider
      .create_account(request.credentials.to_account(Some(&employee.name)))
      .await?;

    match self.store.link_employee(employee.id, identity.uid).await {
      Ok(true) => {}
      Ok(false) => {
        compensate(self.provider, &identity).await;
        return Err(Error::NoPendingRegistration(email.to_owned()));
      }
      Err(e) => {
        compensate(self.provider, &identity).await;
        return Err(Error::persistence(e));
      }
    }

    tracing::info!(
      uid = %identity.uid,
      employee = %employee.id,
      "registered pre-provisioned employee"
    );
    let profile = resolver::from_employee(&identity, &employee);
    Ok(Registered { identity, profile })
  }
}

// ─── Bootstrap ───────────────────────────────────────────────────────────────

/// Create an account carrying an admin `users` record. Used to seed a fresh
/// deployment, since codes can only be issued by an admin.
pub async fn provision_admin<S, P>(
  store: &S,
  provider: &P,
  credentials: Credentials,
) -> Result<Registered>
where
  S: DirectoryStore,
  P: IdentityProvider,
{
  credentials.validate()?;
  let identity = provider.create_account(credentials.to_account(None)).await?;

  let now = Utc::now();
  let profile = UserProfile {
    id:         identity.uid,
    email:      identity.email.clone(),
    name:       display_name(
      None,
      None,
      None,
      identity.display_name.as_deref(),
      &identity.email,
    ),
    role:       Role::Admin,
    department: String::new(),
    position:   String::new(),
    created_at: now,
    updated_at: now,
  };
  if let Err(e) = store.put_user(profile.clone()).await {
    compensate(provider, &identity).await;
    return Err(Error::persistence(e));
  }

  tracing::info!(uid = %identity.uid, "provisioned admin");
  Ok(Registered { identity, profile })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn creds(email: &str, pw: &str, confirm: &str) -> Credentials {
    Credentials {
      email:            email.into(),
      password:         pw.into(),
      confirm_password: confirm.into(),
      display_name:     None,
    }
  }

  #[test]
  fn accepts_well_formed() {
    assert!(creds("ada@school.example", "secret1", "secret1").validate().is_ok());
  }

  #[test]
  fn rejects_short_password() {
    assert_eq!(
      creds("ada@school.example", "abc12", "abc12").validate(),
      Err(ValidationError::PasswordTooShort { min: 6 })
    );
  }

  #[test]
  fn rejects_mismatch() {
    assert_eq!(
      creds("ada@school.example", "secret1", "secret2").validate(),
      Err(ValidationError::PasswordMismatch)
    );
  }

  #[test]
  fn rejects_bad_email() {
    assert_eq!(creds("  ", "secret1", "secret1").validate(), Err(ValidationError::Required("email")));
    assert!(matches!(
      creds("ada.school", "secret1", "secret1").validate(),
      Err(ValidationError::InvalidEmail(_))
    ));
    assert!(matches!(
      creds("@school", "secret1", "secret1").validate(),
      Err(ValidationError::InvalidEmail(_))
    ));
  }

  #[test]
  fn account_name_falls_back_to_employee_name() {
    let c = creds(" ada@school.example ", "secret1", "secret1");
    let a = c.to_account(Some("Ada Lovelace"));
    assert_eq!(a.email, "ada@school.example");
    assert_eq!(a.display_name.as_deref(), Some("Ada Lovelace"));
  }
}
