//! Offset/limit pagination for list queries

/// Page size used when the caller does not ask for one, or asks for a
/// non-positive one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page a caller can request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A normalized, 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: i64,
    size: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Page {
    /// Build a page from already-parsed values, clamping them into range.
    pub fn new(number: i64, size: i64) -> Self {
        let number = number.max(1);
        let size = match size {
            s if s > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
            s if s <= 0 => DEFAULT_PAGE_SIZE,
            s => s,
        };

        Self { number, size }
    }

    /// Build a page from raw query-string values.
    ///
    /// Missing or unparsable values fall back to the defaults rather than
    /// failing the request.
    pub fn from_query(page: Option<&str>, page_size: Option<&str>) -> Self {
        let number = page.and_then(|p| p.trim().parse().ok()).unwrap_or(1);
        let size = page_size
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self::new(number, size)
    }

    pub fn number(&self) -> i64 {
        self.number
    }

    /// Rows per page, the SQL `LIMIT`.
    pub fn limit(&self) -> i64 {
        self.size
    }

    /// Rows to skip, the SQL `OFFSET`.
    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(self.size)
    }
}
