//! # Pagination
//!
//! Page/offset arithmetic for the read-only listing operations.

use crate::domain::errors::{DomainError, DomainResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-based page request.
///
/// # Examples
///
/// ```
/// use produce_market::domain::value_objects::pagination::Pagination;
///
/// let page = Pagination::new(3, 10).unwrap();
/// assert_eq!(page.offset(), 20);
/// assert!(Pagination::new(0, 10).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Pagination {
    page: u32,
    page_size: u32,
}

impl Pagination {
    /// Creates a page request.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPagination` if `page` is zero or
    /// `page_size` is outside `1..=MAX_PAGE_SIZE`.
    pub fn new(page: u32, page_size: u32) -> DomainResult<Self> {
        if page == 0 {
            return Err(DomainError::InvalidPagination(
                "page must be at least 1".to_string(),
            ));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(DomainError::InvalidPagination(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(Self { page, page_size })
    }

    /// Returns the 1-based page number.
    #[inline]
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Returns the page size.
    #[inline]
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the number of items to skip.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }

    /// Returns the page size as `usize` for slicing.
    #[inline]
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.page_size as usize
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
