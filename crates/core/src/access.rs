//! Role and province guards applied before any workflow mutation.
//!
//! PSTO users only act on records whose proponent lives in the same
//! province; proponents only see their own records; DOST-MIMAROPA and admin
//! users see everything.

use crate::error::CoreError;
use crate::roles::{ROLE_ADMIN, ROLE_DOST_MIMAROPA, ROLE_PROPONENT, ROLE_PSTO};
use crate::types::DbId;

/// The authenticated user performing an operation, resolved from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: DbId,
    pub role: String,
    pub province: Option<String>,
}

impl Actor {
    pub fn new(user_id: DbId, role: impl Into<String>, province: Option<String>) -> Self {
        Self {
            user_id,
            role: role.into(),
            province,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn is_psto(&self) -> bool {
        self.role == ROLE_PSTO
    }

    pub fn is_dost_mimaropa(&self) -> bool {
        self.role == ROLE_DOST_MIMAROPA
    }

    pub fn is_proponent(&self) -> bool {
        self.role == ROLE_PROPONENT
    }

    /// Returns `true` if the actor holds any of the given roles.
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.contains(&self.role.as_str())
    }
}

/// Require the actor to hold one of `allowed` roles.
///
/// `action` is a short description used in the error message
/// (e.g. `"forward TNA reports"`).
pub fn require_role(actor: &Actor, allowed: &[&str], action: &str) -> Result<(), CoreError> {
    if actor.has_any_role(allowed) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Role '{}' is not allowed to {action}",
            actor.role
        )))
    }
}

/// Compare two province names, ignoring case and surrounding whitespace.
///
/// A missing province never matches anything, including another missing
/// province.
pub fn same_province(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            let (a, b) = (a.trim(), b.trim());
            !a.is_empty() && a.eq_ignore_ascii_case(b)
        }
        _ => false,
    }
}

/// Enforce province scoping for PSTO actors.
///
/// Non-PSTO actors pass unconditionally; role checks are the caller's job.
pub fn ensure_province_scope(
    actor: &Actor,
    proponent_province: Option<&str>,
) -> Result<(), CoreError> {
    if !actor.is_psto() {
        return Ok(());
    }
    if same_province(actor.province.as_deref(), proponent_province) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Access denied: record belongs to a proponent outside your province".into(),
        ))
    }
}

/// Read access to a proponent-owned record (TNA, funding request, application).
pub fn ensure_can_view(
    actor: &Actor,
    proponent_id: DbId,
    proponent_province: Option<&str>,
) -> Result<(), CoreError> {
    if actor.is_admin() || actor.is_dost_mimaropa() {
        return Ok(());
    }
    if actor.is_psto() {
        return ensure_province_scope(actor, proponent_province);
    }
    if actor.is_proponent() && actor.user_id == proponent_id {
        return Ok(());
    }
    Err(CoreError::Forbidden(
        "Access denied: you do not have access to this record".into(),
    ))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn psto(province: &str) -> Actor {
        Actor::new(10, ROLE_PSTO, Some(province.to_string()))
    }

    #[test]
    fn province_comparison_is_case_insensitive() {
        assert!(same_province(Some("Palawan"), Some(" palawan ")));
        assert!(!same_province(Some("Palawan"), Some("Romblon")));
    }

    #[test]
    fn missing_province_never_matches() {
        assert!(!same_province(None, None));
        assert!(!same_province(Some("Palawan"), None));
        assert!(!same_province(Some(""), Some("")));
    }

    #[test]
    fn psto_from_other_province_is_denied() {
        let result = ensure_province_scope(&psto("Palawan"), Some("Romblon"));
        assert_matches!(result, Err(CoreError::Forbidden(_)));
    }

    #[test]
    fn psto_from_same_province_is_allowed() {
        assert!(ensure_province_scope(&psto("Romblon"), Some("Romblon")).is_ok());
    }

    #[test]
    fn central_office_is_not_province_scoped() {
        let dost = Actor::new(2, ROLE_DOST_MIMAROPA, None);
        assert!(ensure_province_scope(&dost, Some("Marinduque")).is_ok());
        assert!(ensure_can_view(&dost, 99, Some("Marinduque")).is_ok());
    }

    #[test]
    fn proponent_only_sees_own_records() {
        let proponent = Actor::new(5, ROLE_PROPONENT, Some("Palawan".into()));
        assert!(ensure_can_view(&proponent, 5, Some("Palawan")).is_ok());
        assert_matches!(
            ensure_can_view(&proponent, 6, Some("Palawan")),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn require_role_names_the_action() {
        let err = require_role(&psto("Palawan"), &[ROLE_DOST_MIMAROPA], "review TNA reports")
            .unwrap_err();
        assert!(err.to_string().contains("review TNA reports"));
    }
}
