/// Offset based page request for history queries
///
/// # Example
/// ```
/// use savings_core_db::repository::pagination::PageRequest;
///
/// let first = PageRequest::for_page(20, 1); // offset: 0
/// let second = PageRequest::for_page(20, 2); // offset: 20
/// assert_eq!(second.offset, 20);
/// assert_eq!(first.page_number(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum number of items to return
    pub limit: usize,
    /// Number of items to skip
    pub offset: usize,
}

impl PageRequest {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// Page request for a 1-based page number. Page 0 is treated as page 1.
    pub fn for_page(page_size: usize, page_number: usize) -> Self {
        let page_number = page_number.max(1);
        Self {
            limit: page_size,
            offset: (page_number - 1).saturating_mul(page_size),
        }
    }

    /// Like [`for_page`](Self::for_page) with the page size clamped to `1..=max_limit`.
    ///
    /// ```
    /// use savings_core_db::repository::pagination::PageRequest;
    ///
    /// let request = PageRequest::clamped(3, 500, 100);
    /// assert_eq!(request.limit, 100);
    /// assert_eq!(request.offset, 200);
    /// ```
    pub fn clamped(page_number: usize, limit: usize, max_limit: usize) -> Self {
        Self::for_page(limit.clamp(1, max_limit.max(1)), page_number)
    }

    /// Get the page number (1-based) for this request
    pub fn page_number(&self) -> usize {
        if self.limit == 0 {
            1
        } else {
            (self.offset / self.limit) + 1
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

/// Paginated response containing items and metadata
///
/// # Example
/// ```
/// use savings_core_db::repository::pagination::Page;
///
/// let page = Page::new(vec![1, 2, 3], 25, 10, 20);
///
/// assert_eq!(page.page_number(), 3);
/// assert_eq!(page.total_pages(), 3);
/// assert!(!page.has_more());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// The items in this page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: usize,
    /// Maximum number of items per page
    pub limit: usize,
    /// Number of items skipped before this page
    pub offset: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: usize, limit: usize, offset: usize) -> Self {
        Self {
            items,
            total,
            limit,
            offset,
        }
    }

    /// Slices an already ordered, complete result set.
    pub fn from_ordered(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len();
        let items = all
            .into_iter()
            .skip(request.offset)
            .take(request.limit)
            .collect();
        Self::new(items, total, request.limit, request.offset)
    }

    /// Check if there are more pages after this one
    pub fn has_more(&self) -> bool {
        self.offset + self.items.len() < self.total
    }

    /// Get the current page number (1-based)
    pub fn page_number(&self) -> usize {
        if self.limit == 0 {
            1
        } else {
            (self.offset / self.limit) + 1
        }
    }

    /// Get the total number of pages
    pub fn total_pages(&self) -> usize {
        if self.limit == 0 {
            1
        } else {
            self.total.div_ceil(self.limit)
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}
