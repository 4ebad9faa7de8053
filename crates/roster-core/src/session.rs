//! The per-application session context.
//!
//! One [`SessionContext`] is created at application start with
//! [`SessionContext::init`] and ended with [`SessionContext::teardown`]. It
//! holds the current identity and its resolved profile, and broadcasts every
//! change to subscribers.
//!
//! Role resolution is serialized: a sign-in, sign-out or refresh waits for any
//! resolution already in flight before starting its own.

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::sync::{Mutex, watch};

use crate::{
  Result,
  identity::{Identity, IdentityProvider},
  resolver::resolve_profile_within,
  store::DirectoryStore,
  user::UserProfile,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
  SignedOut,
  Resolving {
    identity: Identity,
  },
  Active {
    identity: Identity,
    profile:  UserProfile,
  },
  /// Resolution failed or timed out; the user can retry with `refresh`.
  Failed {
    identity: Identity,
    message:  String,
  },
}

impl SessionState {
  pub fn identity(&self) -> Option<&Identity> {
    match self {
      Self::SignedOut => None,
      Self::Resolving { identity }
      | Self::Active { identity, .. }
      | Self::Failed { identity, .. } => Some(identity),
    }
  }

  pub fn profile(&self) -> Option<&UserProfile> {
    match self {
      Self::Active { profile, .. } => Some(profile),
      _ => None,
    }
  }
}

pub struct SessionContext<S, P> {
  store:     Arc<S>,
  provider:  Arc<P>,
  timeout:   Duration,
  state:     watch::Sender<SessionState>,
  resolving: Mutex<()>,
}

impl<S, P> SessionContext<S, P>
where
  S: DirectoryStore,
  P: IdentityProvider,
{
  /// Start a signed-out session. `timeout` bounds each profile resolution.
  pub fn init(store: Arc<S>, provider: Arc<P>, timeout: Duration) -> Self {
    let (state, _) = watch::channel(SessionState::SignedOut);
    Self { store, provider, timeout, state, resolving: Mutex::new(()) }
  }

  /// Session-changed subscription. The receiver sees the current state
  /// immediately and every transition after it; it reports closure once the
  /// context is torn down.
  pub fn subscribe(&self) -> watch::Receiver<SessionState> { self.state.subscribe() }

  pub fn state(&self) -> SessionState { self.state.borrow().clone() }

  pub fn profile(&self) -> Option<UserProfile> {
    self.state.borrow().profile().cloned()
  }

  /// Authenticate with the identity provider, then resolve the profile.
  ///
  /// Rejected credentials leave the current state untouched.
  pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile> {
    let identity = self.provider.authenticate(email, password).await?;
    let _guard = self.resolving.lock().await;
    self.resolve(identity).await
  }

  pub async fn sign_out(&self) {
    let _guard = self.resolving.lock().await;
    if let Some(identity) = self.state.borrow().identity() {
      tracing::info!(uid = %identity.uid, "signed out");
    }
    self.state.send_replace(SessionState::SignedOut);
  }

  /// Re-run resolution for the current identity. `Ok(None)` when signed out.
  ///
  /// The identity is read once any earlier sign-in, sign-out or refresh has
  /// finished, so a refresh queued behind a sign-out does nothing.
  pub async fn refresh(&self) -> Result<Option<UserProfile>> {
    let _guard = self.resolving.lock().await;
    let identity = self.state.borrow().identity().cloned();
    match identity {
      Some(identity) => self.resolve(identity).await.map(Some),
      None => Ok(None),
    }
  }

  /// Callers hold `resolving`.
  async fn resolve(&self, identity: Identity) -> Result<UserProfile> {
    self.state.send_replace(SessionState::Resolving { identity: identity.clone() });

    match resolve_profile_within(self.store.as_ref(), &identity, self.timeout).await {
      Ok(profile) => {
        tracing::info!(uid = %identity.uid, role = %profile.role, "session active");
        self.state.send_replace(SessionState::Active {
          identity,
          profile: profile.clone(),
        });
        Ok(profile)
      }
      Err(e) => {
        tracing::warn!(uid = %identity.uid, error = %e, "profile resolution failed");
        self.state.send_replace(SessionState::Failed {
          identity,
          message: e.to_string(),
        });
        Err(e)
      }
    }
  }

  /// End the session. Subscribers observe the channel closing.
  pub fn teardown(self) {
    tracing::debug!("session context torn down");
  }
}
