use std::ops::{Range, RangeInclusive};

/// Most page-number controls shown at once.
pub const MAX_PAGE_LINKS: usize = 5;

pub fn total_pages(item_count: usize, per_page: usize) -> usize {
    item_count.div_ceil(per_page)
}

/// Index range of the 1-based `page` over a list of `item_count` items.
pub fn page_bounds(page: usize, per_page: usize, item_count: usize) -> Range<usize> {
    let start = page.saturating_sub(1).saturating_mul(per_page).min(item_count);
    let end = start.saturating_add(per_page).min(item_count);
    start..end
}

/// Pagination controls for one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub current: usize,
    pub total: usize,
}

impl Pager {
    /// `None` when everything fits on one page and no controls render.
    pub fn new(current: usize, total: usize) -> Option<Self> {
        (total > 1).then(|| Self {
            current: current.clamp(1, total),
            total,
        })
    }

    pub fn previous(&self) -> Option<usize> {
        (self.current > 1).then(|| self.current - 1)
    }

    pub fn next(&self) -> Option<usize> {
        (self.current < self.total).then(|| self.current + 1)
    }

    /// Window of up to `MAX_PAGE_LINKS` numbers starting two before the
    /// current page. Near the last page the window shrinks instead of shifting.
    pub fn numbers(&self) -> RangeInclusive<usize> {
        let start = self.current.saturating_sub(MAX_PAGE_LINKS / 2).max(1);
        let end = (start + MAX_PAGE_LINKS - 1).min(self.total);
        start..=end
    }
}
