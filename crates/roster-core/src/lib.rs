//! Core types, trait definitions and rules for the Roster school staff
//! directory.
//!
//! This crate is free of HTTP and database dependencies. Backends implement
//! [`store::DirectoryStore`] and [`identity::IdentityProvider`]; the rules in
//! [`invitation`], [`registration`], [`resolver`], [`directory`] and [`role`] are written
//! against those traits only.

pub mod department;
pub mod directory;
pub mod employee;
pub mod error;
pub mod identity;
pub mod invitation;
pub mod leave;
pub mod registration;
pub mod resolver;
pub mod role;
pub mod session;
pub mod store;
pub mod subscription;
#[cfg(feature = "test-util")]
pub mod testing;
pub mod user;

pub use error::{Error, Result, StoreError, ValidationError};
pub use role::{InvitationRole, Role, is_allowed, is_allowed_any, require};
