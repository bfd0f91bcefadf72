use crate::db_types::OrderStatusType;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Criteria for the admin order listing. Empty fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSearchFilter {
    pub status: Option<OrderStatusType>,
    /// Case-insensitive substring matched against the order id, order number and the shipping email and names.
    pub search: Option<String>,
}

impl OrderSearchFilter {
    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_search<S: Into<String>>(mut self, search: S) -> Self {
        let search = search.into();
        let search = search.trim();
        self.search = if search.is_empty() { None } else { Some(search.to_string()) };
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.search.is_none()
    }
}

/// Highest page number accepted. Anything above it is past the last row of any table anyway.
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

/// One-based page selection. Out of range values are clamped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_PAGE_SIZE }
    }
}

impl Pagination {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Self { page, limit }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// `ceil(total / limit)`
    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}
