//! List engine — filter, sort, and paginate in-memory record collections.
//!
//! DESIGN
//! ======
//! Every tabular view (service orders, inventory, staff) is served from the
//! same derivation: AND all active predicates, stable type-aware sort, then
//! slice one page. The visible page is a pure function of
//! (records, filter, sort, page) — no hidden state affects ordering, so the
//! view can be recomputed from scratch after every change event.
//!
//! ERROR HANDLING
//! ==============
//! Records are never trusted to be complete. A missing field coerces to the
//! empty string / zero instead of panicking, both in predicates and in the
//! comparator.

pub mod controller;
pub mod merge;

use std::cmp::Ordering;

use serde::Deserialize;
use uuid::Uuid;

use crate::event::now_ms;

const MS_PER_DAY: i64 = 86_400_000;

// =============================================================================
// FIELD ACCESS
// =============================================================================

/// Typed view of one record field. `Missing` covers absent optional fields
/// and unknown keys.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    /// Milliseconds since Unix epoch.
    Time(i64),
    Missing,
}

impl FieldValue {
    /// Coerce to text for equality and search. Missing reads as empty.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Time(t) => t.to_string(),
            Self::Missing => String::new(),
        }
    }

    /// Coerce to a number. Missing and non-numeric text read as zero.
    #[must_use]
    pub fn as_number(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            #[allow(clippy::cast_precision_loss)]
            Self::Time(t) => *t as f64,
            Self::Text(s) => s.trim().parse().unwrap_or(0.0),
            Self::Missing => 0.0,
        }
    }

    /// Coerce to epoch milliseconds. Missing reads as zero.
    #[must_use]
    pub fn as_time_ms(&self) -> i64 {
        match self {
            Self::Time(t) => *t,
            #[allow(clippy::cast_possible_truncation)]
            Self::Number(n) => *n as i64,
            Self::Text(s) => s.trim().parse().unwrap_or(0),
            Self::Missing => 0,
        }
    }
}

/// A record that can participate in list derivation.
pub trait Listable {
    /// Fields searched by the free-text predicate, OR'd together.
    const SEARCH_FIELDS: &'static [&'static str];

    fn id(&self) -> Uuid;

    /// Typed field lookup. Unknown keys must return `FieldValue::Missing`.
    fn field(&self, key: &str) -> FieldValue;
}

// =============================================================================
// FILTER
// =============================================================================

/// One filter predicate. A disabled predicate ("all/any" sentinel in the UI)
/// is simply not present in the filter.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Exact text equality on a status/category field.
    Equals { field: String, value: String },
    /// Inclusive recency window: `field >= cutoff_ms`. The cutoff is fixed
    /// at construction so derivation stays deterministic.
    Since { field: String, cutoff_ms: i64 },
    /// `field <= limit`.
    AtMost { field: String, limit: f64 },
    /// `field <= limit_field` on the same record (low-stock check).
    AtMostField { field: String, limit_field: String },
}

impl Predicate {
    fn matches<T: Listable>(&self, record: &T) -> bool {
        match self {
            Self::Equals { field, value } => record.field(field).as_text() == *value,
            Self::Since { field, cutoff_ms } => record.field(field).as_time_ms() >= *cutoff_ms,
            Self::AtMost { field, limit } => record.field(field).as_number() <= *limit,
            Self::AtMostField { field, limit_field } => {
                record.field(field).as_number() <= record.field(limit_field).as_number()
            }
        }
    }
}

/// Active filter state for one list: predicates AND'd together, plus an
/// optional case-insensitive search OR'd over `Listable::SEARCH_FIELDS`.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    pub predicates: Vec<Predicate>,
    pub search: Option<String>,
}

impl FilterSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn equals(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Equals { field: field.into(), value: value.into() });
        self
    }

    /// Keep records whose `field` timestamp falls within the last `days`
    /// days, measured from now.
    #[must_use]
    pub fn within_days(mut self, field: impl Into<String>, days: i64) -> Self {
        let cutoff_ms = now_ms() - days.saturating_mul(MS_PER_DAY);
        self.predicates.push(Predicate::Since { field: field.into(), cutoff_ms });
        self
    }

    #[must_use]
    pub fn at_most(mut self, field: impl Into<String>, limit: f64) -> Self {
        self.predicates.push(Predicate::AtMost { field: field.into(), limit });
        self
    }

    #[must_use]
    pub fn at_most_field(mut self, field: impl Into<String>, limit_field: impl Into<String>) -> Self {
        self.predicates
            .push(Predicate::AtMostField { field: field.into(), limit_field: limit_field.into() });
        self
    }

    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.search = if text.trim().is_empty() { None } else { Some(text) };
        self
    }

    fn matches<T: Listable>(&self, record: &T) -> bool {
        if !self.predicates.iter().all(|p| p.matches(record)) {
            return false;
        }
        let Some(query) = &self.search else {
            return true;
        };
        let needle = query.to_lowercase();
        T::SEARCH_FIELDS
            .iter()
            .any(|field| record.field(field).as_text().to_lowercase().contains(&needle))
    }
}

// =============================================================================
// SORT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// `(key, direction)` sort state. `key = None` preserves input order.
#[derive(Debug, Clone, Default)]
pub struct SortSpec {
    pub key: Option<String>,
    pub direction: Direction,
}

impl SortSpec {
    #[must_use]
    pub fn by(key: impl Into<String>, direction: Direction) -> Self {
        Self { key: Some(key.into()), direction }
    }
}

/// Type-aware comparison of two field values. Text compares
/// case-insensitively; mixed presence coerces the missing side to ""/0.
fn compare_values(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Text(_), _) | (_, FieldValue::Text(_)) => {
            a.as_text().to_lowercase().cmp(&b.as_text().to_lowercase())
        }
        (FieldValue::Time(_), _) | (_, FieldValue::Time(_)) => a.as_time_ms().cmp(&b.as_time_ms()),
        _ => a.as_number().total_cmp(&b.as_number()),
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// 1-based page selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub size: usize,
}

impl Page {
    /// Page size is floored at 1 so `total_pages` is always well defined.
    #[must_use]
    pub fn new(number: usize, size: usize) -> Self {
        Self { number: number.max(1), size: size.max(1) }
    }
}

/// One derived page plus totals for the whole filtered sequence.
#[derive(Debug, Clone)]
pub struct ListView<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub total_pages: usize,
}

// =============================================================================
// DERIVATION
// =============================================================================

/// Filter and sort without paging. Used by exports, which emit the whole
/// filtered sequence.
#[must_use]
pub fn filter_and_sort<T: Listable + Clone>(records: &[T], filter: &FilterSpec, sort: &SortSpec) -> Vec<T> {
    let mut selected: Vec<T> = records.iter().filter(|r| filter.matches(*r)).cloned().collect();
    if let Some(key) = &sort.key {
        // Vec::sort_by is stable: equal elements keep their input order.
        selected.sort_by(|a, b| {
            let ord = compare_values(&a.field(key), &b.field(key));
            match sort.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        });
    }
    selected
}

/// Derive the visible page: filter → sort → slice.
///
/// An out-of-range page yields empty `items` with correct totals; callers
/// holding page state clamp back to 1 (see `controller`).
#[must_use]
pub fn derive_view<T: Listable + Clone>(
    records: &[T],
    filter: &FilterSpec,
    sort: &SortSpec,
    page: Page,
) -> ListView<T> {
    let selected = filter_and_sort(records, filter, sort);
    let total_count = selected.len();
    let total_pages = total_count.div_ceil(page.size);

    let start = page.number.saturating_sub(1).saturating_mul(page.size);
    let items = if start >= total_count {
        Vec::new()
    } else {
        selected[start..(start + page.size).min(total_count)].to_vec()
    };

    ListView { items, total_count, total_pages }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
