//! Page-based pagination shared by list queries.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build a request from optional query parameters, falling back to defaults.
    ///
    /// The result is not validated; call [`PageRequest::validate`] before use.
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.page == 0 {
            return Err(DomainError::validation("page must be >= 1"));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(DomainError::validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }

    /// Zero-based row offset of the first item on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
}

impl PageInfo {
    pub fn new(request: PageRequest, total_count: u64) -> Self {
        Self {
            page: request.page,
            page_size: request.page_size,
            total_count,
            total_pages: total_pages(total_count, request.page_size),
        }
    }
}

/// `ceil(total_count / page_size)`; zero when the page size is zero.
pub fn total_pages(total_count: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(u64::from(page_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(125, 50), 3);
        assert_eq!(total_pages(100, 50), 2);
        assert_eq!(total_pages(0, 50), 0);
        assert_eq!(total_pages(1, 50), 1);
    }

    #[test]
    fn offset_is_zero_based() {
        let req = PageRequest { page: 3, page_size: 20 };
        assert_eq!(req.offset(), 40);
        assert_eq!(req.limit(), 20);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        assert!(PageRequest { page: 0, page_size: 10 }.validate().is_err());
        assert!(PageRequest { page: 1, page_size: 0 }.validate().is_err());
        assert!(PageRequest { page: 1, page_size: MAX_PAGE_SIZE + 1 }.validate().is_err());
        assert!(PageRequest::default().validate().is_ok());
    }

    proptest! {
        #[test]
        fn pages_cover_every_item(total in 0u64..10_000, size in 1u32..=MAX_PAGE_SIZE) {
            let pages = total_pages(total, size);
            prop_assert!(pages * u64::from(size) >= total);
            if pages > 0 {
                prop_assert!((pages - 1) * u64::from(size) < total);
            }
        }
    }
}
