//! Route handlers, one module per resource.

pub mod account;
pub mod departments;
pub mod employees;
pub mod invitations;
pub mod leave;
