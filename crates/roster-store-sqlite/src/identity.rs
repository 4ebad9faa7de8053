//! Local credential store implementing [`IdentityProvider`].
//!
//! Passwords are kept as argon2 PHC strings. Emails are matched
//! case-insensitively.

use argon2::{PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use chrono::Utc;
use rand_core::OsRng;
use roster_core::identity::{Identity, IdentityError, IdentityProvider, NewAccount};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, SqliteStore,
  encode::{decode_uuid, encode_dt, encode_uuid},
};

/// Shortest password the provider accepts.
pub const MIN_PROVIDER_PASSWORD: usize = 6;

fn backend(e: impl Into<Error>) -> IdentityError { IdentityError::Backend(Box::new(e.into())) }

fn plausible_email(email: &str) -> bool {
  matches!(email.split_once('@'), Some((local, domain))
    if !local.is_empty() && domain.contains('.') && !domain.contains('@'))
}

impl IdentityProvider for SqliteStore {
  async fn create_account(&self, account: NewAccount) -> Result<Identity, IdentityError> {
    let email = account.email.trim().to_owned();
    if !plausible_email(&email) {
      return Err(IdentityError::InvalidEmail(email));
    }
    if account.password.chars().count() < MIN_PROVIDER_PASSWORD {
      return Err(IdentityError::WeakPassword);
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = self
      .hasher
      .hash_password(account.password.as_bytes(), &salt)
      .map_err(|e| backend(Error::Hash(e.to_string())))?
      .to_string();

    let identity = Identity {
      uid:          Uuid::new_v4(),
      email:        email.clone(),
      display_name: account.display_name,
    };

    let uid_str  = encode_uuid(identity.uid);
    let name     = identity.display_name.clone();
    let at_str   = encode_dt(Utc::now());
    let inserted = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM accounts WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO accounts (uid, email, password_hash, display_name, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![uid_str, email, hash, name, at_str],
        )?;
        Ok(true)
      })
      .await
      .map_err(backend)?;

    if !inserted {
      return Err(IdentityError::EmailInUse(identity.email));
    }
    tracing::info!(uid = %identity.uid, "account created");
    Ok(identity)
  }

  async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
    let email = email.trim().to_owned();
    let row: Option<(String, String, String, Option<String>)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT uid, email, password_hash, display_name FROM accounts WHERE email = ?1",
              rusqlite::params![email],
              |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .optional()?,
        )
      })
      .await
      .map_err(backend)?;

    let (uid, email, hash, display_name) = row.ok_or(IdentityError::InvalidCredentials)?;
    let parsed = PasswordHash::new(&hash).map_err(|e| backend(Error::Hash(e.to_string())))?;
    self
      .hasher
      .verify_password(password.as_bytes(), &parsed)
      .map_err(|_| IdentityError::InvalidCredentials)?;

    Ok(Identity {
      uid: decode_uuid(&uid).map_err(backend)?,
      email,
      display_name,
    })
  }

  async fn delete_account(&self, uid: Uuid) -> Result<bool, IdentityError> {
    let uid_str = encode_uuid(uid);
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute("DELETE FROM accounts WHERE uid = ?1", [uid_str])?))
      .await
      .map_err(backend)?;
    if changed == 1 {
      tracing::info!(%uid, "account deleted");
    }
    Ok(changed == 1)
  }
}
