//! Screen controller: owns one [`DataView`] and the source feeding it for
//! the lifetime of a mounted screen.
//!
//! Independent fetches fail independently. Whatever succeeded is applied,
//! everything else keeps its last-known value and comes back as a
//! `DataUnavailable` report for the UI's notification layer.

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::source::{EntitySource, ReferenceSource};
use crate::view::{DataView, DerivedView, ViewConfig};

/// Outcome of [`ScreenController::mount`].
#[derive(Debug)]
pub struct MountReport {
    pub view: DerivedView,
    pub failures: Vec<Error>,
}

impl MountReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct ScreenController<S> {
    view: DataView,
    source: S,
}

impl<S: EntitySource + ReferenceSource> ScreenController<S> {
    pub fn new(config: ViewConfig, source: S) -> Self {
        Self {
            view: DataView::new(config),
            source,
        }
    }

    /// Entry points (search, filters, sort, paging) live on the view.
    pub fn view(&mut self) -> &mut DataView {
        &mut self.view
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch every reference collection the view enriches against, then the
    /// entities.
    pub async fn mount(&mut self) -> MountReport {
        let name = self.view.config().name.clone();
        let mut failures = Vec::new();

        for dimension in self.view.config().reference_dimensions() {
            match self.source.fetch_reference(&dimension).await {
                Ok(collection) => {
                    self.view.replace_reference(collection);
                }
                Err(err) => {
                    warn!(screen = %name, dimension = %dimension, error = %err, "reference fetch failed");
                    failures.push(as_unavailable(&dimension, err));
                }
            }
        }

        if let Err(err) = self.reload_entities().await {
            failures.push(err);
        }

        let view = self.view.view();
        info!(
            screen = %name,
            records = view.unfiltered_count,
            failures = failures.len(),
            "screen mounted"
        );
        MountReport { view, failures }
    }

    /// Re-read entities after the UI performed a create/update/delete.
    pub async fn refresh_after_write(&mut self) -> Result<DerivedView> {
        self.reload_entities().await?;
        Ok(self.view.view())
    }

    /// Discard fetched data and reset view state.
    pub fn close(&mut self) {
        self.view.reset();
    }

    async fn reload_entities(&mut self) -> Result<()> {
        let name = self.view.config().name.clone();
        match self.source.fetch_entities().await {
            Ok(records) => {
                self.view.replace_records(records);
                Ok(())
            }
            Err(err) => {
                warn!(screen = %name, error = %err, "entity fetch failed");
                Err(as_unavailable(&name, err))
            }
        }
    }
}

fn as_unavailable(what: &str, err: Error) -> Error {
    match err {
        Error::DataUnavailable { .. } => err,
        other => Error::unavailable(what, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::reference::{ReferenceCollection, ReferenceEntry};
    use crate::view::screens;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeBackend {
        employees: RefCell<Vec<Record>>,
        roles_down: Cell<bool>,
        entities_down: Cell<bool>,
    }

    impl EntitySource for FakeBackend {
        async fn fetch_entities(&self) -> Result<Vec<Record>> {
            if self.entities_down.get() {
                return Err(Error::unavailable("employees", "Cannot reach server"));
            }
            Ok(self.employees.borrow().clone())
        }
    }

    impl ReferenceSource for FakeBackend {
        async fn fetch_reference(&self, dimension: &str) -> Result<ReferenceCollection> {
            if self.roles_down.get() {
                return Err(Error::InvalidPayload("role: expected an array of rows".into()));
            }
            Ok(ReferenceCollection::new(
                dimension,
                vec![ReferenceEntry::new("1", "Manager"), ReferenceEntry::new("2", "Staff")],
            ))
        }
    }

    fn employee(id: i64, first: &str, last: &str, role: i64) -> Record {
        Record::new()
            .with("id", id)
            .with("first_name", first)
            .with("last_name", last)
            .with("role_id", role)
    }

    fn backend() -> FakeBackend {
        let backend = FakeBackend::default();
        *backend.employees.borrow_mut() = vec![
            employee(1, "Ana", "Cruz", 1),
            employee(2, "Ben", "Abad", 2),
        ];
        backend
    }

    #[tokio::test]
    async fn test_mount_enriches_and_sorts() {
        let mut screen = ScreenController::new(screens::employees(), backend());
        let report = screen.mount().await;
        assert!(report.is_complete());
        assert_eq!(report.view.rows[0].text("last_name"), "Abad");
        assert_eq!(report.view.rows[0].text("role_name"), "Staff");
    }

    #[tokio::test]
    async fn test_reference_failure_still_renders_entities() {
        let source = backend();
        source.roles_down.set(true);
        let mut screen = ScreenController::new(screens::employees(), source);
        let report = screen.mount().await;
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].is_data_unavailable());
        assert_eq!(report.view.total_count, 2);
        assert_eq!(report.view.rows[0].text("role_name"), "Unknown Role");
    }

    #[tokio::test]
    async fn test_refresh_after_write_picks_up_new_rows() {
        let mut screen = ScreenController::new(screens::employees(), backend());
        screen.mount().await;
        screen
            .source()
            .employees
            .borrow_mut()
            .push(employee(3, "Carla", "Aquino", 1));
        let view = screen.refresh_after_write().await.unwrap();
        assert_eq!(view.total_count, 3);
        assert_eq!(view.rows[0].text("last_name"), "Abad");
        assert_eq!(view.rows[1].text("last_name"), "Aquino");
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_last_known_records() {
        let mut screen = ScreenController::new(screens::employees(), backend());
        screen.mount().await;
        screen.source().entities_down.set(true);
        let err = screen.refresh_after_write().await.unwrap_err();
        assert!(err.is_data_unavailable());
        assert_eq!(screen.view().view().total_count, 2);
    }

    #[tokio::test]
    async fn test_close_resets_state() {
        let mut screen = ScreenController::new(screens::employees(), backend());
        screen.mount().await;
        screen.view().set_search("ana");
        screen.close();
        assert!(screen.view().records().is_empty());
        assert!(screen.view().filters().is_empty());
    }
}
