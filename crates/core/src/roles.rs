//! Well-known role name constants.
//!
//! These must match the `ck_users_role` constraint in
//! `20250101000001_create_users_table.sql`.

use crate::error::CoreError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_PROPONENT: &str = "proponent";
pub const ROLE_PSTO: &str = "psto";
pub const ROLE_DOST_MIMAROPA: &str = "dost_mimaropa";

/// All valid role values.
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_PROPONENT, ROLE_PSTO, ROLE_DOST_MIMAROPA];

/// Roles whose users are bound to a single province.
pub const PROVINCE_SCOPED_ROLES: &[&str] = &[ROLE_PROPONENT, ROLE_PSTO];

/// Validate that a role string is one of the accepted values.
pub fn validate_role(role: &str) -> Result<(), CoreError> {
    if VALID_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid role '{role}'. Must be one of: {}",
            VALID_ROLES.join(", ")
        )))
    }
}
