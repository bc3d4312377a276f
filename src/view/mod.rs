//! Operational data views.
//!
//! One engine backs the employee, order and inventory screens. A
//! [`ViewConfig`] says which foreign keys to enrich, which fields search and
//! filters read, what can be sorted and how big a page is; [`DataView`]
//! owns the fetched records plus the search/filter/sort/page state and
//! re-derives the visible page on every entry-point call.
//!
//! Derivation order: enrich -> filter -> sort -> paginate.

pub mod enrich;
pub mod filter;
pub mod paginate;
pub mod screens;
pub mod sort;

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::record::Record;
use crate::reference::ReferenceCollection;

pub use enrich::{EnrichmentRule, Enricher};
pub use filter::{FilterPredicate, FilterRules, FilterState};
pub use paginate::PageState;
pub use sort::{SortChange, SortDirection, SortState};

pub const DEFAULT_PAGE_SIZE: usize = 10;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-screen view configuration, assembled with the builder methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    pub name: String,
    pub enrichment: Vec<EnrichmentRule>,
    pub filters: FilterRules,
    pub sortable: BTreeSet<String>,
    pub default_sort: Option<SortState>,
    pub page_size: usize,
}

impl ViewConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enrichment: Vec::new(),
            filters: FilterRules::default(),
            sortable: BTreeSet::new(),
            default_sort: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Resolve `foreign_key` against the `dimension` reference collection
    /// into `target`, falling back to "Unknown <Dimension>".
    pub fn enrich(mut self, foreign_key: &str, target: &str, dimension: &str) -> Self {
        self.enrichment
            .push(EnrichmentRule::new(foreign_key, target, dimension));
        self
    }

    pub fn enrich_with_fallback(
        mut self,
        foreign_key: &str,
        target: &str,
        dimension: &str,
        fallback: &str,
    ) -> Self {
        self.enrichment
            .push(EnrichmentRule::new(foreign_key, target, dimension).with_fallback(fallback));
        self
    }

    pub fn search_fields(mut self, fields: &[&str]) -> Self {
        self.filters.search_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn equality_filter(mut self, dimension: &str, field: &str) -> Self {
        self.filters
            .equality
            .insert(dimension.to_string(), field.to_string());
        self
    }

    pub fn multi_filter(mut self, dimension: &str, field: &str) -> Self {
        self.filters
            .multi
            .insert(dimension.to_string(), field.to_string());
        self
    }

    pub fn sortable(mut self, fields: &[&str]) -> Self {
        self.sortable.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    /// Initial sort. The field becomes sortable if it was not already.
    pub fn default_sort(mut self, field: &str, direction: SortDirection) -> Self {
        self.sortable.insert(field.to_string());
        self.default_sort = Some(SortState::new(field, direction));
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    /// Reference dimensions this screen needs fetched.
    pub fn reference_dimensions(&self) -> Vec<String> {
        let mut dims: Vec<String> = Vec::new();
        for rule in &self.enrichment {
            if !dims.contains(&rule.dimension) {
                dims.push(rule.dimension.clone());
            }
        }
        dims
    }
}

// ---------------------------------------------------------------------------
// Derived view
// ---------------------------------------------------------------------------

/// What the UI renders: one page of enriched rows plus paging metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedView {
    pub rows: Vec<Record>,
    pub current_page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    /// Records left after search and filters.
    pub total_count: usize,
    pub unfiltered_count: usize,
    pub sort: Option<SortState>,
}

impl DerivedView {
    /// 1-based `(first, last)` row numbers shown on this page, `(0, 0)` when
    /// nothing matches. Feeds "Showing X to Y of N" captions.
    pub fn range(&self) -> (usize, usize) {
        if self.rows.is_empty() {
            return (0, 0);
        }
        let first = (self.current_page - 1) * self.page_size + 1;
        (first, first + self.rows.len() - 1)
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DataView {
    config: ViewConfig,
    records: Vec<Record>,
    references: HashMap<String, ReferenceCollection>,
    filters: FilterState,
    sort: Option<SortState>,
    page: PageState,
}

impl DataView {
    pub fn new(config: ViewConfig) -> Self {
        let sort = config.default_sort.clone();
        let page = PageState::new(config.page_size);
        Self {
            config,
            records: Vec::new(),
            references: HashMap::new(),
            filters: FilterState::default(),
            sort,
            page,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn reference(&self, dimension: &str) -> Option<&ReferenceCollection> {
        self.references.get(dimension)
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    pub fn page(&self) -> PageState {
        self.page
    }

    // -- data ---------------------------------------------------------------

    /// Accept a fresh entity fetch (mount, or after a write). Filters and
    /// sort survive; the page is re-clamped against the new count.
    pub fn replace_records(&mut self, records: Vec<Record>) -> DerivedView {
        debug!(view = %self.config.name, count = records.len(), "records replaced");
        self.records = records;
        self.derive()
    }

    /// Accept a fresh reference collection. Lookup maps are rebuilt from it
    /// on the next derivation.
    pub fn replace_reference(&mut self, collection: ReferenceCollection) -> DerivedView {
        debug!(
            view = %self.config.name,
            dimension = collection.dimension(),
            count = collection.len(),
            "reference replaced"
        );
        self.references
            .insert(collection.dimension().to_string(), collection);
        self.derive()
    }

    // -- entry points ---------------------------------------------------------

    pub fn view(&mut self) -> DerivedView {
        self.derive()
    }

    pub fn set_search(&mut self, text: &str) -> DerivedView {
        if self.filters.search != text {
            self.filters.search = text.to_string();
            self.page.first();
        }
        self.derive()
    }

    /// Single-select filter; `""` clears the dimension. Unknown dimensions
    /// are ignored.
    pub fn set_filter(&mut self, dimension: &str, value: &str) -> DerivedView {
        if !self.config.filters.equality.contains_key(dimension) {
            debug!(view = %self.config.name, dimension, "ignoring unknown filter dimension");
            return self.derive();
        }
        self.filters.set_equality(dimension, value);
        self.page.first();
        self.derive()
    }

    /// Toggle one value of a multi-select filter. An empty selection means
    /// no filtering on that dimension.
    pub fn toggle_multi_filter(&mut self, dimension: &str, value: &str) -> DerivedView {
        if !self.config.filters.multi.contains_key(dimension) {
            debug!(view = %self.config.name, dimension, "ignoring unknown multi-filter dimension");
            return self.derive();
        }
        self.filters.toggle_multi(dimension, value);
        self.page.first();
        self.derive()
    }

    pub fn clear_filters(&mut self) -> DerivedView {
        self.filters = FilterState::default();
        self.page.first();
        self.derive()
    }

    /// Column-header click. Unknown fields keep the previous sort.
    pub fn set_sort(&mut self, field: &str) -> DerivedView {
        if !self.config.sortable.contains(field) {
            debug!(view = %self.config.name, field, "ignoring unsortable field");
            return self.derive();
        }
        match self.sort.as_mut() {
            Some(sort) => {
                if sort.click(field) == SortChange::Switched {
                    self.page.first();
                }
            }
            None => {
                self.sort = Some(SortState::ascending(field));
                self.page.first();
            }
        }
        self.derive()
    }

    pub fn next_page(&mut self) -> DerivedView {
        let count = self.filtered_sorted().len();
        self.page.next(count);
        self.derive()
    }

    pub fn previous_page(&mut self) -> DerivedView {
        self.page.previous();
        self.derive()
    }

    pub fn go_to_page(&mut self, page: usize) -> DerivedView {
        let count = self.filtered_sorted().len();
        self.page.go_to(page, count);
        self.derive()
    }

    /// Back to configured defaults, dropping fetched data. Used when the
    /// owning screen or form closes.
    pub fn reset(&mut self) {
        self.records.clear();
        self.references.clear();
        self.filters = FilterState::default();
        self.sort = self.config.default_sort.clone();
        self.page = PageState::new(self.config.page_size);
    }

    // -- derivation -----------------------------------------------------------

    fn filtered_sorted(&self) -> Vec<Record> {
        let enricher = Enricher::new(&self.config.enrichment, &self.references);
        let predicate = FilterPredicate::new(&self.config.filters, &self.filters);
        let mut rows: Vec<Record> = self
            .records
            .iter()
            .map(|r| enricher.enrich(r))
            .filter(|r| predicate.matches(r))
            .collect();
        if let Some(sort) = &self.sort {
            sort.apply(&mut rows);
        }
        rows
    }

    fn derive(&mut self) -> DerivedView {
        let rows = self.filtered_sorted();
        self.page.clamp(rows.len());
        DerivedView {
            rows: self.page.slice(&rows).to_vec(),
            current_page: self.page.current_page,
            total_pages: self.page.total_pages(rows.len()),
            page_size: self.page.page_size,
            total_count: rows.len(),
            unfiltered_count: self.records.len(),
            sort: self.sort.clone(),
        }
    }
}
