//! Page requests and page results for listings.

use serde::Serialize;

use crate::config::PagingConfig;

/// Largest page size any listing will serve.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    size: i64,
}

impl PageRequest {
    /// Create a page request.
    ///
    /// Negative pages become page 0; the size is clamped to
    /// `1..=MAX_PAGE_SIZE`.
    pub fn new(page: i64, size: i64) -> Self {
        Self {
            page: page.max(0),
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// First page with the given size.
    pub fn first(size: i64) -> Self {
        Self::new(0, size)
    }

    /// Zero-based page number.
    pub fn page(&self) -> i64 {
        self.page
    }

    /// Page size.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Rows to skip (`page * size`).
    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }

    /// Request for the following page.
    pub fn next(&self) -> Self {
        Self::new(self.page.saturating_add(1), self.size)
    }
}

impl PagingConfig {
    /// Build a request, falling back to the configured default size and
    /// capping at the configured maximum.
    pub fn request(&self, page: i64, size: Option<i64>) -> PageRequest {
        let size = size
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size);
        PageRequest::new(page, size)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// The items in this page.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: i64,
    /// Zero-based page number.
    pub page: i64,
    /// Page size used for this query.
    pub size: i64,
}

impl<T> Page<T> {
    /// Assemble a page from its items, the total count and the request.
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page(),
            size: request.size(),
        }
    }

    /// Number of pages, `ceil(total / size)`.
    pub fn total_pages(&self) -> i64 {
        if self.size <= 0 {
            return 0;
        }
        (self.total + self.size - 1) / self.size
    }

    /// Check if there is a page after this one.
    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages()
    }

    /// Request for the next page, or None on the last page.
    pub fn next_page(&self) -> Option<PageRequest> {
        if self.has_next() {
            Some(PageRequest::new(self.page + 1, self.size))
        } else {
            None
        }
    }

    /// Transform the items, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(-3, 0);
        assert_eq!(req.page(), 0);
        assert_eq!(req.size(), 1);

        let req = PageRequest::new(2, 1000);
        assert_eq!(req.size(), MAX_PAGE_SIZE);
        assert_eq!(req.offset(), 200);
    }

    #[test]
    fn test_page_request_next() {
        let req = PageRequest::first(10).next();
        assert_eq!(req.page(), 1);
        assert_eq!(req.offset(), 10);
    }

    #[test]
    fn test_total_pages() {
        let page = Page::new(vec![1, 2, 3], 23, PageRequest::new(0, 10));
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        assert_eq!(page.next_page(), Some(PageRequest::new(1, 10)));

        let last = Page::new(vec![21, 22, 23], 23, PageRequest::new(2, 10));
        assert!(!last.has_next());
        assert_eq!(last.next_page(), None);
    }

    #[test]
    fn test_empty_page() {
        let page: Page<i32> = Page::new(vec![], 0, PageRequest::first(20));
        assert_eq!(page.total_pages(), 0);
        assert!(!page.has_next());
    }

    #[test]
    fn test_exact_multiple() {
        let page: Page<i32> = Page::new(vec![], 20, PageRequest::new(1, 10));
        assert_eq!(page.total_pages(), 2);
        assert!(!page.has_next());
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = Page::new(vec![1, 2], 5, PageRequest::new(1, 2)).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.total, 5);
        assert_eq!(page.page, 1);
        assert_eq!(page.size, 2);
    }

    #[test]
    fn test_config_request() {
        let config = PagingConfig {
            default_page_size: 15,
            max_page_size: 40,
        };
        assert_eq!(config.request(0, None).size(), 15);
        assert_eq!(config.request(1, Some(80)).size(), 40);
        assert_eq!(config.request(1, Some(5)).size(), 5);
    }
}
