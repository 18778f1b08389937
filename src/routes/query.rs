//! List query parsing — shared query-string surface for every list endpoint.
//!
//! DESIGN
//! ======
//! All tabular GET endpoints accept the same parameter names; each resource
//! maps the relevant subset onto a `FilterSpec`. The sentinel value
//! (`semua`/`all`, case-insensitive) and `days=0` disable their predicates,
//! matching the "all/any" dropdown options in the UI.

use serde::{Deserialize, Serialize};

use crate::listing::{Direction, FilterSpec, ListView, Listable, Page, SortSpec};

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

/// Query-string parameters understood by list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub role: Option<String>,
    /// Recency window in days; 0 or absent means all time.
    pub days: Option<i64>,
    #[serde(default)]
    pub low_stock: bool,
    /// Free-text search.
    pub q: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<Direction>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

fn is_sentinel(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.eq_ignore_ascii_case("semua") || v.eq_ignore_ascii_case("all")
}

impl ListQuery {
    fn base_filter(&self) -> FilterSpec {
        let mut filter = FilterSpec::new();
        if let Some(days) = self.days {
            if days > 0 {
                filter = filter.within_days("created_at", days);
            }
        }
        if let Some(q) = &self.q {
            filter = filter.search(q.clone());
        }
        filter
    }

    #[must_use]
    pub fn filter_for_orders(&self) -> FilterSpec {
        let mut filter = self.base_filter();
        if let Some(status) = &self.status {
            if !is_sentinel(status) {
                filter = filter.equals("status", status.clone());
            }
        }
        filter
    }

    #[must_use]
    pub fn filter_for_inventory(&self) -> FilterSpec {
        let mut filter = self.base_filter();
        if let Some(category) = &self.category {
            if !is_sentinel(category) {
                filter = filter.equals("category", category.clone());
            }
        }
        if self.low_stock {
            filter = filter.at_most_field("quantity", "min_stock");
        }
        filter
    }

    #[must_use]
    pub fn filter_for_staff(&self) -> FilterSpec {
        let mut filter = self.base_filter();
        if let Some(role) = &self.role {
            if !is_sentinel(role) {
                filter = filter.equals("role", role.clone());
            }
        }
        filter
    }

    /// Sort with a per-list default for when the client sends none.
    #[must_use]
    pub fn sort_spec(&self, default_key: &str, default_dir: Direction) -> SortSpec {
        match &self.sort {
            Some(key) if !key.trim().is_empty() => {
                SortSpec::by(key.clone(), self.dir.unwrap_or(default_dir))
            }
            _ => SortSpec::by(default_key, self.dir.unwrap_or(default_dir)),
        }
    }

    #[must_use]
    pub fn page(&self) -> Page {
        Page::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE),
        )
    }
}

/// JSON body of a list response.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub total_pages: usize,
    pub page: usize,
}

impl<T: Listable> ListResponse<T> {
    #[must_use]
    pub fn from_view(view: ListView<T>, page: Page) -> Self {
        Self {
            items: view.items,
            total_count: view.total_count,
            total_pages: view.total_pages,
            page: page.number,
        }
    }
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
