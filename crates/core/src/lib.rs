//! Domain core for the DOST-MIMAROPA TNA and funding workflow backend.
//!
//! This crate has zero internal dependencies so the repository layer, the
//! notification pipeline and the HTTP handlers can all share the same status
//! enums, transition tables, and validation rules.

#[macro_use]
mod macros;

pub mod access;
pub mod application;
pub mod attachment;
pub mod error;
pub mod funding;
pub mod notification;
pub mod roles;
pub mod tna;
pub mod types;
pub mod workflow;
