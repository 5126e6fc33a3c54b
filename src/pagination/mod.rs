//! Page windows over an ordered collection
//!
//! The paginator is pure: the current page only ever comes from the caller's
//! request, and any out-of-range request is clamped into `[1, total_pages]`
//! rather than rejected.

use serde::Serialize;

/// Fixed-size pagination over a base path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    base_path: String,
}

/// One page of a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageWindow<'a, T> {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items: &'a [T],
    pub prev_page: Option<usize>,
    pub next_page: Option<usize>,
}

impl Paginator {
    /// A `page_size` of 0 is treated as 1
    pub fn new(page_size: usize, base_path: impl Into<String>) -> Self {
        Self {
            page_size: page_size.max(1),
            base_path: base_path.into(),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Number of pages for `len` items, never less than 1
    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.page_size).max(1)
    }

    /// Window the collection at the requested page
    pub fn paginate<'a, T>(&self, items: &'a [T], requested: i64) -> PageWindow<'a, T> {
        let total_pages = self.total_pages(items.len());
        let current_page = clamp_page(requested, total_pages);

        let start = ((current_page - 1) * self.page_size).min(items.len());
        let end = (start + self.page_size).min(items.len());

        PageWindow {
            current_page,
            total_pages,
            total_items: items.len(),
            items: &items[start..end],
            prev_page: (current_page > 1).then(|| current_page - 1),
            next_page: (current_page < total_pages).then(|| current_page + 1),
        }
    }

    /// Link to a page: the base path for page 1, `{base}?page={n}` otherwise
    pub fn href(&self, page: usize) -> String {
        if page <= 1 {
            self.base_path.clone()
        } else {
            format!("{}?page={}", self.base_path, page)
        }
    }
}

fn clamp_page(requested: i64, total_pages: usize) -> usize {
    let total = i64::try_from(total_pages).unwrap_or(i64::MAX);
    // `clamp` keeps the result in 1..=total, which always fits in usize
    requested.clamp(1, total) as usize
}

/// Parse a `page` query value the lenient way browsers' `parseInt` does.
///
/// Leading whitespace and an optional sign are accepted, then the longest
/// digit prefix is read; anything after it is ignored. Overflow saturates.
/// Absent, non-numeric and zero values all mean page 1. Negative values are
/// returned as-is and clamped later by [`Paginator::paginate`].
pub fn parse_page_param(raw: Option<&str>) -> i64 {
    let raw = match raw {
        Some(raw) => raw.trim_start(),
        None => return 1,
    };

    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    let mut seen = false;
    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        seen = true;
        let digit = i64::from(b - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }

    if !seen || value == 0 {
        1
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: usize) -> Vec<usize> {
        (1..=n).collect()
    }

    #[test]
    fn test_pages_partition_the_collection() {
        for n in 0..=30 {
            let items = numbers(n);
            for size in 1..=7 {
                let paginator = Paginator::new(size, "/");
                let total = paginator.total_pages(n);
                let mut seen = Vec::new();
                for page in 1..=total {
                    let window = paginator.paginate(&items, page as i64);
                    assert_eq!(window.current_page, page);
                    assert!(window.items.len() <= size);
                    seen.extend_from_slice(window.items);
                }
                assert_eq!(seen, items, "n={} size={}", n, size);
            }
        }
    }

    #[test]
    fn test_total_pages() {
        let paginator = Paginator::new(4, "/");
        assert_eq!(paginator.total_pages(0), 1);
        assert_eq!(paginator.total_pages(4), 1);
        assert_eq!(paginator.total_pages(5), 2);
        assert_eq!(paginator.total_pages(10), 3);
    }

    #[test]
    fn test_low_requests_behave_like_page_one() {
        let items = numbers(10);
        let paginator = Paginator::new(4, "/");
        let first = paginator.paginate(&items, 1);
        for requested in [
            parse_page_param(Some("0")),
            parse_page_param(Some("-5")),
            parse_page_param(Some("abc")),
            parse_page_param(None),
        ] {
            assert_eq!(paginator.paginate(&items, requested), first);
        }
        assert_eq!(paginator.paginate(&items, i64::MIN), first);
    }

    #[test]
    fn test_high_request_clamps_to_last_page() {
        let items = numbers(10);
        let window = Paginator::new(4, "/").paginate(&items, 10_000);
        assert_eq!(window.current_page, 3);
        assert_eq!(window.items, &[9, 10]);
        assert_eq!(window.prev_page, Some(2));
        assert_eq!(window.next_page, None);
    }

    #[test]
    fn test_empty_collection() {
        let items: Vec<usize> = Vec::new();
        let window = Paginator::new(4, "/").paginate(&items, 3);
        assert_eq!(window.current_page, 1);
        assert_eq!(window.total_pages, 1);
        assert!(window.items.is_empty());
        assert_eq!(window.prev_page, None);
        assert_eq!(window.next_page, None);
        assert_eq!(window.total_pages, 1);
    }

    #[test]
    fn test_zero_page_size_is_coerced() {
        let paginator = Paginator::new(0, "/");
        assert_eq!(paginator.page_size(), 1);
        let items = numbers(3);
        assert_eq!(paginator.paginate(&items, 2).items, &[2]);
    }

    #[test]
    fn test_neighbours() {
        let items = numbers(12);
        let window = Paginator::new(4, "/").paginate(&items, 2);
        assert_eq!(window.prev_page, Some(1));
        assert_eq!(window.next_page, Some(3));
        assert_eq!(window.items, &[5, 6, 7, 8]);
    }

    #[test]
    fn test_href() {
        let paginator = Paginator::new(5, "/blog");
        assert_eq!(paginator.href(1), "/blog");
        assert_eq!(paginator.href(0), "/blog");
        assert_eq!(paginator.href(2), "/blog?page=2");
    }

    #[test]
    fn test_parse_page_param() {
        assert_eq!(parse_page_param(Some("2")), 2);
        assert_eq!(parse_page_param(Some("  3")), 3);
        assert_eq!(parse_page_param(Some("+4")), 4);
        assert_eq!(parse_page_param(Some("5abc")), 5);
        assert_eq!(parse_page_param(Some("1e3")), 1);
        assert_eq!(parse_page_param(Some("-5")), -5);
        assert_eq!(parse_page_param(Some("")), 1);
        assert_eq!(parse_page_param(Some("-")), 1);
        assert_eq!(parse_page_param(Some("0")), 1);
        assert_eq!(parse_page_param(Some("abc")), 1);
        assert_eq!(parse_page_param(None), 1);
        assert_eq!(parse_page_param(Some("99999999999999999999999")), i64::MAX);
        assert_eq!(parse_page_param(Some("-99999999999999999999999")), i64::MIN);
    }
}
