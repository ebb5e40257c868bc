use serde::Serialize;

pub const DEFAULT_PER_PAGE: usize = 10;
pub const MAX_PER_PAGE: usize = 100;

/// One page of an in-memory list. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Slices `items` into the requested page. `page` is clamped to at least 1,
/// `per_page` to `1..=MAX_PER_PAGE`; a page past the end is empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let page = page.max(1);
    let per_page = per_page.clamp(1, MAX_PER_PAGE);
    let total = items.len();
    let total_pages = total.div_ceil(per_page);

    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total);
    let items = if start >= total {
        vec![]
    } else {
        items[start..end].to_vec()
    };

    Page {
        items,
        page,
        per_page,
        total,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_requested_page() {
        let items: Vec<u32> = (1..=25).collect();

        let page = paginate(&items, 2, 10);

        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn last_page_is_partial() {
        let items: Vec<u32> = (1..=25).collect();

        let page = paginate(&items, 3, 10);

        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert!(!page.has_next());
    }

    #[test]
    fn out_of_range_page_is_empty() {
        let items = vec!["a", "b"];

        let page = paginate(&items, 5, 10);

        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn page_and_size_are_clamped() {
        let items: Vec<u32> = (1..=3).collect();

        let page = paginate(&items, 0, 0);

        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 1);
        assert_eq!(page.items, vec![1]);
    }
}
