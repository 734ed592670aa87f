//! Pagination utilities for facemeta-review
//!
//! Pages are 1-indexed. A page that starts past the end of the result set
//! (or is below 1) falls back to the first page rather than being clamped
//! to the last one.

/// Page size when none is requested
pub const DEFAULT_LIMIT: usize = 20;

/// Page number when none is requested
pub const DEFAULT_PAGE: i64 = 1;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Index of the first row to return
    pub offset: usize,
    /// Number of pages at this page size
    pub total_pages: usize,
    /// True when the requested page was out of range
    pub reset: bool,
}

/// Calculate the window for `requested_page` of size `limit`
///
/// # Examples
/// ```
/// use facemeta_review::pagination::calculate_pagination;
///
/// // 50 results at 20 per page = 3 pages (20 + 20 + 10)
/// let p = calculate_pagination(50, 2, 20);
/// assert_eq!(p.offset, 20);
/// assert_eq!(p.total_pages, 3);
///
/// // Out-of-range page falls back to the first page
/// let p = calculate_pagination(50, 9999, 20);
/// assert_eq!(p.offset, 0);
/// assert!(p.reset);
/// ```
pub fn calculate_pagination(total_results: usize, requested_page: i64, limit: usize) -> Pagination {
    let limit = limit.max(1);
    let total_pages = total_results.div_ceil(limit);

    let start = requested_page
        .checked_sub(1)
        .and_then(|p| usize::try_from(p).ok())
        .and_then(|p| p.checked_mul(limit));

    match start {
        Some(offset) if offset < total_results => Pagination {
            offset,
            total_pages,
            reset: false,
        },
        _ => Pagination {
            offset: 0,
            total_pages,
            reset: !(requested_page == 1 && total_results == 0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normal() {
        let p = calculate_pagination(250, 2, 100);
        assert_eq!(p.offset, 100);
        assert_eq!(p.total_pages, 3);
        assert!(!p.reset);
    }

    #[test]
    fn test_pagination_first_page() {
        let p = calculate_pagination(150, 1, 100);
        assert_eq!(p.offset, 0);
        assert_eq!(p.total_pages, 2);
        assert!(!p.reset);
    }

    #[test]
    fn test_pagination_last_partial_page() {
        let p = calculate_pagination(50, 3, 20);
        assert_eq!(p.offset, 40);
        assert_eq!(p.total_pages, 3);
    }

    #[test]
    fn test_pagination_out_of_bounds_high_resets() {
        let p = calculate_pagination(50, 9999, 20);
        assert_eq!(p.offset, 0);
        assert!(p.reset);
    }

    #[test]
    fn test_pagination_exact_boundary_resets() {
        // Page 3 of 40 rows at 20 per page starts at row 40, past the end
        let p = calculate_pagination(40, 3, 20);
        assert_eq!(p.offset, 0);
        assert_eq!(p.total_pages, 2);
        assert!(p.reset);
    }

    #[test]
    fn test_pagination_out_of_bounds_low() {
        for page in [0, -3, i64::MIN] {
            let p = calculate_pagination(150, page, 100);
            assert_eq!(p.offset, 0);
            assert!(p.reset);
        }
    }

    #[test]
    fn test_pagination_empty() {
        let p = calculate_pagination(0, 1, 20);
        assert_eq!(p.offset, 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.reset);
    }

    #[test]
    fn test_pagination_huge_page_does_not_overflow() {
        let p = calculate_pagination(10, i64::MAX, usize::MAX);
        assert_eq!(p.offset, 0);
        assert!(p.reset);
    }
}
