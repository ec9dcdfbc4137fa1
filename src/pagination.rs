//! Fixed-size pages over an ordered sequence.
//!
//! [`Paginator`] is the pure slicing logic; [`PageState`] is the cursor the
//! controller keeps for "load more" style incremental display.

use serde::{Deserialize, Serialize};

/// Stateless page slicing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Paginator;

impl Paginator {
    /// Number of pages needed for `count` items; never less than one.
    ///
    /// `items_per_page` of zero is treated as one.
    pub fn total_pages(count: usize, items_per_page: usize) -> usize {
        count.div_ceil(items_per_page.max(1)).max(1)
    }

    /// Items on `page` (zero-based). Out-of-range pages are empty.
    pub fn slice<T>(items: &[T], page: usize, items_per_page: usize) -> &[T] {
        let items_per_page = items_per_page.max(1);
        let Some(start) = page.checked_mul(items_per_page) else {
            return &[];
        };
        if start >= items.len() {
            return &[];
        }
        let end = start.saturating_add(items_per_page).min(items.len());
        &items[start..end]
    }

    /// Items on pages `0..=page`, i.e. everything "load more" has revealed.
    pub fn through<T>(items: &[T], page: usize, items_per_page: usize) -> &[T] {
        let end = page
            .saturating_add(1)
            .saturating_mul(items_per_page.max(1))
            .min(items.len());
        &items[..end]
    }
}

/// Page cursor for a filtered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub current_page: usize,
    pub items_per_page: usize,
    pub total_pages: usize,
}

impl PageState {
    /// Cursor at page 0 of an empty result.
    ///
    /// `items_per_page` of zero is treated as one.
    pub fn new(items_per_page: usize) -> Self {
        Self {
            current_page: 0,
            items_per_page: items_per_page.max(1),
            total_pages: 1,
        }
    }

    /// Rewinds to page 0 and recomputes the page count for `count` items.
    pub fn reset(&mut self, count: usize) {
        self.current_page = 0;
        self.total_pages = Paginator::total_pages(count, self.items_per_page);
    }

    /// Changes the page size and rewinds.
    pub fn resize(&mut self, items_per_page: usize, count: usize) {
        self.items_per_page = items_per_page.max(1);
        self.reset(count);
    }

    pub fn is_last_page(&self) -> bool {
        self.current_page + 1 >= self.total_pages
    }

    pub fn has_more(&self) -> bool {
        !self.is_last_page()
    }

    /// Moves to the next page. Returns `false` (and stays put) on the last page.
    pub fn advance(&mut self) -> bool {
        if self.is_last_page() {
            return false;
        }
        self.current_page += 1;
        true
    }
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(20)
    }
}
