//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Page size used when `limit` is omitted.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// `limit` clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// `offset`, never negative.
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Query parameters for `GET /tna/list`.
#[derive(Debug, Default, Deserialize)]
pub struct TnaListParams {
    /// A single TNA status to filter on.
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for `GET /funding-requests`.
#[derive(Debug, Default, Deserialize)]
pub struct FundingListParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for `GET /notifications`.
#[derive(Debug, Default, Deserialize)]
pub struct NotificationListParams {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

macro_rules! paginated {
    ($($ty:ty),*) => {
        $(impl $ty {
            pub fn pagination(&self) -> PaginationParams {
                PaginationParams {
                    limit: self.limit,
                    offset: self.offset,
                }
            }
        })*
    };
}

paginated!(TnaListParams, FundingListParams, NotificationListParams);
