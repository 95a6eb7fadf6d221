//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` request DTOs validated with `validator`
//! - Plain input structs the repositories bind from

pub mod application;
pub mod funding_request;
pub mod notification;
pub mod tna;
pub mod user;
