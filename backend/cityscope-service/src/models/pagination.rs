//! Offset pagination shared by the feed, author-feed and reply listings.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Raw `page`/`limit` query parameters, parsed leniently by [`PageRequest`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Effective page window after defaults and clamping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Leading integer of `raw` (optional sign, then digits), ignoring the rest
fn leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Overlong digit runs saturate rather than fall back to the default
    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * value)
}

impl PageRequest {
    /// Absent or unparsable values take the defaults; `page` is at least 1 and
    /// `limit` is clamped to `1..=MAX_LIMIT`.
    pub fn new(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page.and_then(leading_int).unwrap_or(DEFAULT_PAGE).max(1);
        let limit = limit
            .and_then(leading_int)
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);
        Self { page, limit }
    }

    pub fn from_query(query: &PaginationQuery) -> Self {
        Self::new(query.page.as_deref(), query.limit.as_deref())
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Slice bounds into a collection of `len` items; empty past the end
    pub fn window(&self, len: usize) -> std::ops::Range<usize> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX).min(len);
        let end = start.saturating_add(self.limit as usize).min(len);
        start..end
    }
}

/// Pagination metadata returned next to every listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub limit: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(request: PageRequest, total_items: i64) -> Self {
        let total_pages = (total_items + request.limit - 1) / request.limit;
        Self {
            current_page: request.page,
            total_pages,
            total_items,
            limit: request.limit,
            has_next_page: request.page < total_pages,
            has_prev_page: request.page > 1,
        }
    }
}

/// One page of items plus its metadata
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: i64) -> Self {
        Self {
            items,
            pagination: Pagination::new(request, total_items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(PageRequest::new(None, None), PageRequest::default());
        assert_eq!(
            PageRequest::new(Some("abc"), Some("")),
            PageRequest::default()
        );
    }

    #[test]
    fn test_lenient_parsing() {
        let req = PageRequest::new(Some("2nd"), Some(" 15 items"));
        assert_eq!(req.page, 2);
        assert_eq!(req.limit, 15);
    }

    #[test]
    fn test_clamping() {
        let req = PageRequest::new(Some("0"), Some("0"));
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 1);

        let req = PageRequest::new(Some("-4"), Some("5000"));
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, MAX_LIMIT);

        let huge = PageRequest::new(Some("99999999999999999999999"), None);
        assert!(huge.page > 1);
        assert!(huge.offset() > 0);
    }

    #[test]
    fn test_fifteen_items_two_pages() {
        let first = PageRequest::new(Some("1"), Some("10"));
        let second = PageRequest::new(Some("2"), Some("10"));

        assert_eq!(first.window(15), 0..10);
        assert_eq!(second.window(15), 10..15);

        let meta = Pagination::new(first, 15);
        assert_eq!(meta.total_pages, 2);
        assert!(meta.has_next_page);
        assert!(!meta.has_prev_page);

        let meta = Pagination::new(second, 15);
        assert!(!meta.has_next_page);
        assert!(meta.has_prev_page);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let req = PageRequest::new(Some("7"), Some("10"));
        assert!(req.window(15).is_empty());

        let meta = Pagination::new(req, 15);
        assert_eq!(meta.current_page, 7);
        assert_eq!(meta.total_pages, 2);
        assert!(!meta.has_next_page);
    }

    #[test]
    fn test_empty_collection() {
        let meta = Pagination::new(PageRequest::default(), 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_prev_page);
    }
}
