//! List controller — page and selection state for an interactive list view.
//!
//! DESIGN
//! ======
//! `derive_view` is stateless; this wrapper owns the mutable view state a
//! client keeps between interactions: the active filter/sort, the current
//! page, and the set of selected row ids for bulk actions.
//!
//! Changing the filter, the search text, or the sort resets the page to 1
//! (a stale page number must never point past the new filtered length) and
//! clears the selection (hidden selections on rows that are no longer
//! visible are worse than re-selecting). Selection survives plain page
//! navigation: `select_all` is scoped to the visible page, so accumulating
//! across pages is well defined.

use std::collections::HashSet;

use uuid::Uuid;

use crate::listing::{FilterSpec, ListView, Listable, Page, SortSpec, derive_view};

#[derive(Debug)]
pub struct ListController {
    filter: FilterSpec,
    sort: SortSpec,
    page: Page,
    selection: HashSet<Uuid>,
}

impl ListController {
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            filter: FilterSpec::new(),
            sort: SortSpec::default(),
            page: Page::new(1, page_size),
            selection: HashSet::new(),
        }
    }

    #[must_use]
    pub fn page(&self) -> Page {
        self.page
    }

    #[must_use]
    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    #[must_use]
    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    /// Replace the whole filter. Resets the page and clears the selection.
    pub fn set_filter(&mut self, filter: FilterSpec) {
        self.filter = filter;
        self.reset_view_state();
    }

    /// Replace only the search text. Resets the page and clears the selection.
    pub fn set_search(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.filter.search = if text.trim().is_empty() { None } else { Some(text) };
        self.reset_view_state();
    }

    /// Replace the sort. Resets the page and clears the selection.
    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
        self.reset_view_state();
    }

    /// Navigate to a page. Selection is kept.
    pub fn set_page(&mut self, number: usize) {
        self.page = Page::new(number, self.page.size);
    }

    fn reset_view_state(&mut self) {
        self.page = Page::new(1, self.page.size);
        self.selection.clear();
    }

    /// Derive the visible page, clamping back to page 1 if the current page
    /// no longer exists for the filtered length.
    pub fn view<T: Listable + Clone>(&mut self, records: &[T]) -> ListView<T> {
        let view = derive_view(records, &self.filter, &self.sort, self.page);
        if self.page.number > 1 && view.items.is_empty() {
            self.page = Page::new(1, self.page.size);
            return derive_view(records, &self.filter, &self.sort, self.page);
        }
        view
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    #[must_use]
    pub fn selected(&self) -> &HashSet<Uuid> {
        &self.selection
    }

    #[must_use]
    pub fn is_selected(&self, id: Uuid) -> bool {
        self.selection.contains(&id)
    }

    pub fn toggle(&mut self, id: Uuid) {
        if !self.selection.remove(&id) {
            self.selection.insert(id);
        }
    }

    /// Select or deselect exactly the currently visible page's ids.
    pub fn select_all(&mut self, visible_ids: &[Uuid], checked: bool) {
        if checked {
            self.selection.extend(visible_ids.iter().copied());
        } else {
            for id in visible_ids {
                self.selection.remove(id);
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
