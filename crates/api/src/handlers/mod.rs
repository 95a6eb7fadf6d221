//! Request handlers, one module per resource.

pub mod application;
pub mod auth;
pub mod funding;
pub mod notification;
pub mod scope;
pub mod tna;
