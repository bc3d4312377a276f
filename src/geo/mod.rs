//! Checkout address selection: region -> province -> city -> barangay.
//!
//! [`AddressSelector`] is a small state machine with one [`LevelState`] per
//! level. Every selection goes through [`AddressSelector::begin_select`],
//! which clears all descendant levels before anything else happens, and
//! hands back a [`FetchTicket`] for the child level. A fetch result is only
//! applied through [`AddressSelector::complete_fetch`] if its ticket is still
//! the outstanding one for that level, so a late answer for a superseded
//! parent can never overwrite newer state.

pub mod psgc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoLevel {
    Region,
    Province,
    City,
    Barangay,
}

impl GeoLevel {
    pub const ALL: [GeoLevel; 4] = [
        GeoLevel::Region,
        GeoLevel::Province,
        GeoLevel::City,
        GeoLevel::Barangay,
    ];

    pub fn index(self) -> usize {
        match self {
            GeoLevel::Region => 0,
            GeoLevel::Province => 1,
            GeoLevel::City => 2,
            GeoLevel::Barangay => 3,
        }
    }

    pub fn parent(self) -> Option<GeoLevel> {
        match self {
            GeoLevel::Region => None,
            GeoLevel::Province => Some(GeoLevel::Region),
            GeoLevel::City => Some(GeoLevel::Province),
            GeoLevel::Barangay => Some(GeoLevel::City),
        }
    }

    pub fn child(self) -> Option<GeoLevel> {
        match self {
            GeoLevel::Region => Some(GeoLevel::Province),
            GeoLevel::Province => Some(GeoLevel::City),
            GeoLevel::City => Some(GeoLevel::Barangay),
            GeoLevel::Barangay => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GeoLevel::Region => "region",
            GeoLevel::Province => "province",
            GeoLevel::City => "city",
            GeoLevel::Barangay => "barangay",
        }
    }
}

/// One selectable geography unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeoOption {
    pub code: String,
    pub name: String,
}

impl GeoOption {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Remote geography reference service.
#[allow(async_fn_in_trait)]
pub trait GeographySource {
    /// Child options of `parent_code` at `level`. `Region` has no parent.
    async fn fetch_level(&self, level: GeoLevel, parent_code: Option<&str>)
        -> Result<Vec<GeoOption>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LevelState {
    pub selected: Option<String>,
    pub options: Vec<GeoOption>,
    /// Options were fetched successfully for the current parent.
    pub fetched: bool,
    #[serde(skip)]
    pending: Option<u64>,
}

impl LevelState {
    fn clear(&mut self) {
        *self = LevelState::default();
    }

    fn selected_option(&self) -> Option<GeoOption> {
        let code = self.selected.as_ref()?;
        let name = self
            .options
            .iter()
            .find(|o| &o.code == code)
            .map(|o| o.name.clone())
            .unwrap_or_else(|| code.clone());
        Some(GeoOption::new(code.clone(), name))
    }
}

/// Tag for one outstanding fetch: which level it fills, for which parent
/// selection, and the request id that must still be pending to apply it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub level: GeoLevel,
    pub parent_code: Option<String>,
    id: u64,
}

/// Result of handing a fetch response back to the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// The ticket was superseded; the response was dropped.
    Discarded,
    /// Nothing was fetched: unchanged selection, terminal level, or a
    /// selection that only cleared state.
    Skipped,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AddressSelector {
    levels: [LevelState; 4],
    #[serde(skip)]
    next_request: u64,
}

impl AddressSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, level: GeoLevel) -> &LevelState {
        &self.levels[level.index()]
    }

    pub fn levels(&self) -> &[LevelState; 4] {
        &self.levels
    }

    fn issue(&mut self, level: GeoLevel, parent_code: Option<String>) -> FetchTicket {
        self.next_request += 1;
        let id = self.next_request;
        self.levels[level.index()].pending = Some(id);
        FetchTicket {
            level,
            parent_code,
            id,
        }
    }

    fn clear_below(&mut self, level: GeoLevel) {
        for state in &mut self.levels[level.index() + 1..] {
            state.clear();
        }
    }

    /// Ticket for the root level. Regions have no parent and are always
    /// fetchable.
    pub fn begin_load_regions(&mut self) -> FetchTicket {
        self.issue(GeoLevel::Region, None)
    }

    /// Record a selection and reset everything below it.
    ///
    /// Returns the ticket for fetching the child level, or `None` when there
    /// is nothing to fetch: the selection is unchanged, the level is
    /// `Barangay`, the parent level has no selection yet, or `code` is empty
    /// (which clears the level instead).
    pub fn begin_select(&mut self, level: GeoLevel, code: &str) -> Option<FetchTicket> {
        if code.is_empty() {
            self.clear_level(level);
            return None;
        }
        if self.level(level).selected.as_deref() == Some(code) {
            return None;
        }
        if let Some(parent) = level.parent() {
            if self.level(parent).selected.is_none() {
                debug!(level = level.name(), "ignoring selection without a parent selection");
                return None;
            }
        }

        self.levels[level.index()].selected = Some(code.to_string());
        self.clear_below(level);
        let child = level.child()?;
        Some(self.issue(child, Some(code.to_string())))
    }

    /// Apply (or discard) the response for `ticket`.
    ///
    /// A failure leaves the level's options at their last-known value and is
    /// returned as [`Error::DataUnavailable`]; ancestor state is untouched.
    /// Responses for superseded tickets are dropped silently, failures
    /// included.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<GeoOption>>,
    ) -> Result<FetchOutcome> {
        let current_parent = ticket
            .level
            .parent()
            .and_then(|p| self.level(p).selected.clone());
        let state = &mut self.levels[ticket.level.index()];
        if state.pending != Some(ticket.id) || current_parent != ticket.parent_code {
            debug!(
                level = ticket.level.name(),
                parent = ?ticket.parent_code,
                "discarding stale geography response"
            );
            return Ok(FetchOutcome::Discarded);
        }
        state.pending = None;

        match result {
            Ok(options) => {
                debug!(level = ticket.level.name(), count = options.len(), "geography options loaded");
                state.options = options;
                state.fetched = true;
                Ok(FetchOutcome::Applied)
            }
            Err(err) => {
                // Child levels were emptied when their parent changed, so
                // this keeps them empty; a failed region reload keeps the
                // last-known regions.
                warn!(level = ticket.level.name(), error = %err, "geography fetch failed");
                Err(match err {
                    Error::DataUnavailable { .. } => err,
                    other => Error::unavailable(ticket.level.name(), other.to_string()),
                })
            }
        }
    }

    pub async fn load_regions<S: GeographySource>(&mut self, source: &S) -> Result<FetchOutcome> {
        let ticket = self.begin_load_regions();
        let result = source.fetch_level(GeoLevel::Region, None).await;
        self.complete_fetch(ticket, result)
    }

    /// Select `code` at `level` and fetch the child level's options.
    pub async fn select_level<S: GeographySource>(
        &mut self,
        source: &S,
        level: GeoLevel,
        code: &str,
    ) -> Result<FetchOutcome> {
        let Some(ticket) = self.begin_select(level, code) else {
            return Ok(FetchOutcome::Skipped);
        };
        let result = source
            .fetch_level(ticket.level, ticket.parent_code.as_deref())
            .await;
        self.complete_fetch(ticket, result)
    }

    pub async fn select_region<S: GeographySource>(&mut self, source: &S, code: &str) -> Result<FetchOutcome> {
        self.select_level(source, GeoLevel::Region, code).await
    }

    pub async fn select_province<S: GeographySource>(&mut self, source: &S, code: &str) -> Result<FetchOutcome> {
        self.select_level(source, GeoLevel::Province, code).await
    }

    pub async fn select_city<S: GeographySource>(&mut self, source: &S, code: &str) -> Result<FetchOutcome> {
        self.select_level(source, GeoLevel::City, code).await
    }

    /// Terminal level: nothing cascades.
    pub fn select_barangay(&mut self, code: &str) {
        let _ = self.begin_select(GeoLevel::Barangay, code);
    }

    /// Clear the selection at `level` and everything below it. The level's
    /// own options stay, since its parent did not change.
    pub fn clear_level(&mut self, level: GeoLevel) {
        self.levels[level.index()].selected = None;
        self.clear_below(level);
    }

    /// Back to the initial state. Loaded region options are kept.
    pub fn reset(&mut self) {
        self.clear_level(GeoLevel::Region);
    }

    /// Chosen `{code, name}` per selected level, region first.
    pub fn selection(&self) -> Vec<(GeoLevel, GeoOption)> {
        GeoLevel::ALL
            .iter()
            .filter_map(|&l| self.level(l).selected_option().map(|o| (l, o)))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.levels.iter().all(|l| l.selected.is_some())
    }

    /// "Barangay, City, Province, Region" for the checkout summary.
    pub fn formatted_address(&self) -> String {
        self.selection()
            .into_iter()
            .rev()
            .map(|(_, o)| o.name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
