//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument. Status changes are guarded updates
//! (`WHERE id = $1 AND status = $expected`) that return `None` when the row
//! was missing or had already moved on.

pub mod application_repo;
pub mod funding_request_repo;
pub mod notification_repo;
pub mod tna_repo;
pub mod user_repo;

pub use application_repo::ApplicationRepo;
pub use funding_request_repo::FundingRequestRepo;
pub use notification_repo::NotificationRepo;
pub use tna_repo::TnaRepo;
pub use user_repo::UserRepo;

/// SQL predicate matching rows whose proponent lives in the province bound at
/// `$idx`, compared case-insensitively.
pub(crate) fn province_condition(idx: usize) -> String {
    format!(
        "proponent_id IN (SELECT id FROM users \
         WHERE LOWER(TRIM(province)) = LOWER(TRIM(${idx})))"
    )
}
