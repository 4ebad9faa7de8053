//! Invitation codes: issuing and verifying.
//!
//! A code is an 8-character uppercase alphanumeric token bound to a role and
//! an expiry. It is redeemable iff it is unused and not yet expired. The
//! `is_used`/`used_by`/`used_at` triple is written once, atomically, and
//! never reverted.
//!
//! Codes are not checked for uniqueness when issued; with 36^8 possible
//! values a collision is accepted as negligible.

use chrono::{DateTime, Duration, Utc};
use rand::{Rng, distributions::Uniform, rngs::OsRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  error::{Error, Result, ValidationError},
  role::InvitationRole,
  store::DirectoryStore,
  user::UserProfile,
};

/// Length of every issued code.
pub const CODE_LENGTH: usize = 8;

const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationCode {
  pub id:              Uuid,
  pub code:            String,
  pub role:            InvitationRole,
  pub created_by:      Uuid,
  pub created_by_name: String,
  pub is_used:         bool,
  pub used_by:         Option<Uuid>,
  pub used_at:         Option<DateTime<Utc>>,
  pub expires_at:      DateTime<Utc>,
  pub created_at:      DateTime<Utc>,
}

impl InvitationCode {
  pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
    !self.is_used && self.expires_at > now
  }
}

/// Input to [`DirectoryStore::insert_invitation`]. Timestamps are fixed by
/// the issuer so the store never computes expiry itself.
#[derive(Debug, Clone)]
pub struct NewInvitation {
  pub code:            String,
  pub role:            InvitationRole,
  pub created_by:      Uuid,
  pub created_by_name: String,
  pub created_at:      DateTime<Utc>,
  pub expires_at:      DateTime<Utc>,
}

/// What the issuer hands back to the administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCode {
  pub id:         Uuid,
  pub code:       String,
  pub expires_at: DateTime<Utc>,
}

// ─── Code generation ─────────────────────────────────────────────────────────

/// Draw a fresh code from `rng`, uniformly over [`ALPHABET`].
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
  let symbol = Uniform::from(0..ALPHABET.len());
  (0..CODE_LENGTH).map(|_| char::from(ALPHABET[rng.sample(symbol)])).collect()
}

/// Canonical lookup form of user input: trimmed and uppercased.
pub fn normalize(raw: &str) -> String { raw.trim().to_uppercase() }

// ─── Issuer ──────────────────────────────────────────────────────────────────

/// Issue a new code for `role`, valid for `expiry_days` days.
///
/// Fails with [`Error::AuthenticationRequired`] when there is no issuing
/// principal, and with a validation error for non-positive expiry.
pub async fn generate<S: DirectoryStore>(
  store: &S,
  role: InvitationRole,
  expiry_days: i64,
  issuer: Option<&UserProfile>,
) -> Result<IssuedCode> {
  let issuer = issuer.ok_or(Error::AuthenticationRequired)?;
  if expiry_days <= 0 {
    return Err(ValidationError::InvalidExpiry(expiry_days).into());
  }

  let now = Utc::now();
  let expires_at = Duration::try_days(expiry_days)
    .and_then(|d| now.checked_add_signed(d))
    .ok_or(ValidationError::InvalidExpiry(expiry_days))?;

  let stored = store
    .insert_invitation(NewInvitation {
      code: generate_code(&mut OsRng),
      role,
      created_by: issuer.id,
      created_by_name: issuer.name.clone(),
      created_at: now,
      expires_at,
    })
    .await
    .map_err(Error::persistence)?;

  tracing::info!(
    code_id = %stored.id,
    role = %role,
    issuer = %issuer.id,
    "issued invitation code"
  );

  Ok(IssuedCode {
    id:         stored.id,
    code:       stored.code,
    expires_at: stored.expires_at,
  })
}

// ─── Verifier ────────────────────────────────────────────────────────────────

/// Look up a redeemable code. `Ok(None)` means absent, used, or expired.
///
/// If several unused records share the code string, the earliest-created
/// redeemable one is returned. Verification has no side effects.
pub async fn verify<S: DirectoryStore>(
  store: &S,
  raw: &str,
) -> Result<Option<InvitationCode>> {
  let code = normalize(raw);
  if code.is_empty() {
    return Ok(None);
  }

  let now = Utc::now();
  let found = store
    .find_unused_invitations(&code)
    .await
    .map_err(Error::persistence)?
    .into_iter()
    .find(|c| c.is_redeemable(now));

  Ok(found)
}

#[cfg(test)]
mod tests {
  use super::*;

  use rand::{SeedableRng, rngs::StdRng};

  #[test]
  fn codes_are_eight_uppercase_alphanumerics() {
    for _ in 0..200 {
      let code = generate_code(&mut OsRng);
      assert_eq!(code.len(), CODE_LENGTH);
      assert!(
        code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
        "bad code {code}"
      );
    }
  }

  #[test]
  fn same_seed_same_code() {
    let a = generate_code(&mut StdRng::seed_from_u64(7));
    let b = generate_code(&mut StdRng::seed_from_u64(7));
    assert_eq!(a, b);
  }

  #[test]
  fn every_symbol_is_drawn() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut seen = [false; 36];
    for _ in 0..200 {
      for c in generate_code(&mut rng).bytes() {
        let i = ALPHABET.iter().position(|a| *a == c).unwrap();
        seen[i] = true;
      }
    }
    assert!(seen.iter().all(|s| *s));
  }

  #[test]
  fn normalize_trims_and_uppercases() {
    assert_eq!(normalize("  ab12cd34 \n"), "AB12CD34");
  }

  #[test]
  fn redeemable_requires_unused_and_unexpired() {
    let now = Utc::now();
    let mut c = InvitationCode {
      id:              Uuid::new_v4(),
      code:            "ABCDEFGH".into(),
      role:            InvitationRole::Manager,
      created_by:      Uuid::new_v4(),
      created_by_name: "Admin".into(),
      is_used:         false,
      used_by:         None,
      used_at:         None,
      expires_at:      now + Duration::days(1),
      created_at:      now,
    };
    assert!(c.is_redeemable(now));

    c.expires_at = now;
    assert!(!c.is_redeemable(now));

    c.expires_at = now + Duration::days(1);
    c.is_used = true;
    assert!(!c.is_redeemable(now));
  }
}
