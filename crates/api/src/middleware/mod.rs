//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Claims from a JWT Bearer token.
//! - [`auth::CurrentUser`] -- The active user row behind the token.
//! - [`rbac`] -- Role-gated wrappers around [`auth::CurrentUser`].

pub mod auth;
pub mod rbac;
