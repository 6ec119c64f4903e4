use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gridwatch_core::{Cell, Grid, StoreError, StorePort, TableId, TableStore};
use gridwatch_logging::{watch_debug, watch_info, watch_warn};

use crate::fetch::ResultFetcher;
use crate::{CellReport, FailureKind, FetchError, RefreshEvent, RefreshOutcome, RefreshReport};

pub const DEFAULT_CELL_TIMEOUT: Duration = Duration::from_secs(5);

/// Receives per-cell progress while a grid is refreshed.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: RefreshEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn emit(&self, _event: RefreshEvent) {}
}

pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

/// Drives fetch + diff + count for every cell of a grid, one cell at a time.
pub struct RefreshEngine<F: ResultFetcher> {
    fetcher: F,
    cell_timeout: Duration,
    clock: Clock,
}

impl<F: ResultFetcher> RefreshEngine<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            cell_timeout: DEFAULT_CELL_TIMEOUT,
            clock: Arc::new(|| Utc::now().to_rfc3339()),
        }
    }

    /// Upper bound for one fetch. Expiry counts as a fetch failure.
    pub fn with_cell_timeout(mut self, timeout: Duration) -> Self {
        self.cell_timeout = timeout;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Fetches the cell's live results and records the ones it has not seen.
    ///
    /// On failure the hit count becomes unknown and the seen set is left
    /// exactly as it was.
    pub async fn refresh_cell(&self, cell: &mut Cell) -> RefreshOutcome {
        let url = cell.query_url().to_string();
        let attempt =
            tokio::time::timeout(self.cell_timeout, self.fetcher.fetch_results(&url)).await;
        let fetched = match attempt {
            Ok(Ok(results)) => results,
            Ok(Err(error)) => {
                cell.mark_unknown();
                return RefreshOutcome::Degraded { error };
            }
            Err(_) => {
                cell.mark_unknown();
                return RefreshOutcome::Degraded {
                    error: FetchError::new(
                        FailureKind::Timeout,
                        format!("no response within {:?}", self.cell_timeout),
                    ),
                };
            }
        };

        let mut batch = HashSet::new();
        let new_items: Vec<_> = fetched
            .iter()
            .filter(|result| batch.insert(result.identifier.as_str()))
            .filter(|result| !cell.seen().contains(&result.identifier))
            .cloned()
            .collect();

        let counted = cell.record_results(fetched.iter().map(|r| r.identifier.as_str()));
        debug_assert_eq!(counted, new_items.len());

        RefreshOutcome::Updated {
            new_items,
            fetched: fetched.len(),
        }
    }

    /// Refreshes every cell in row-major order. A failing cell is reported
    /// and skipped; cells already processed keep their new state.
    pub async fn refresh_all_cells(
        &self,
        grid: &mut Grid,
        sink: &dyn ProgressSink,
    ) -> RefreshReport {
        let mut cells = Vec::with_capacity(grid.cell_count());

        for ((row, column), cell) in grid.cells_mut() {
            let url = cell.query_url().to_string();
            sink.emit(RefreshEvent::CellStarted {
                row,
                column,
                url: url.clone(),
            });

            let outcome = self.refresh_cell(cell).await;
            match &outcome {
                RefreshOutcome::Updated { new_items, fetched } => {
                    watch_debug!(
                        "Cell ({}, {}) {} new of {} fetched",
                        row,
                        column,
                        new_items.len(),
                        fetched
                    );
                }
                RefreshOutcome::Degraded { error } => {
                    watch_warn!(
                        "Cell ({}, {}) refresh failed for {}: {}",
                        row,
                        column,
                        url,
                        error
                    );
                }
            }

            sink.emit(RefreshEvent::CellFinished {
                row,
                column,
                new_items: outcome.new_count(),
            });
            cells.push(CellReport {
                row,
                column,
                url,
                outcome,
            });
        }

        RefreshReport {
            cells,
            finished_utc: (self.clock)(),
        }
    }

    /// Refreshes one table of the store in place, then persists the store.
    pub async fn refresh_table<P: StorePort>(
        &self,
        store: &mut TableStore<P>,
        id: TableId,
        sink: &dyn ProgressSink,
    ) -> Result<RefreshReport, StoreError> {
        let table = store.table_mut(id)?;
        let report = self.refresh_all_cells(&mut table.grid, sink).await;
        watch_info!(
            "Refreshed table {}: {} cell(s) ok, {} degraded, {} new item(s)",
            id,
            report.refreshed(),
            report.degraded(),
            report.total_new()
        );
        store.commit()?;
        Ok(report)
    }
}
