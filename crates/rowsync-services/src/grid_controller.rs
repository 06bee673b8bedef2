//! Grid controller
//!
//! Owns the grid state behind a mutex and drives the two collaborators that
//! can suspend: the data source and the sync backend.

use std::sync::Arc;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use parking_lot::Mutex;
use rowsync_core::{
    Column, DataQuery, DataState, Direction, EditField, Filter, GridConfig, GridEvent, GridModel,
    GridState, ReconcileSummary, Row, RowId, SortSpec, SyncProgress, Value, new_row_model,
};

use crate::data_source::DataSource;
use crate::error::{ServiceError, ServiceResult};
use crate::logging::TimingGuard;
use crate::sync_backend::{ProgressReporter, SyncBackend};

type Subscribers = Arc<Mutex<Vec<UnboundedSender<GridEvent>>>>;

/// Async front of one editable grid.
///
/// Every edit runs under a single lock acquisition; the lock is released
/// before awaiting the data source or the sync backend, so edits stay
/// possible while a sync is in flight.
pub struct GridController<M> {
    state: Arc<Mutex<GridState<M>>>,
    data_source: Arc<dyn DataSource<M>>,
    backend: Arc<dyn SyncBackend<M>>,
    subscribers: Subscribers,
}

impl<M: GridModel> GridController<M> {
    pub fn new(
        config: GridConfig,
        columns: Vec<Column>,
        data_source: Arc<dyn DataSource<M>>,
        backend: Arc<dyn SyncBackend<M>>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(GridState::new(config, columns))),
            data_source,
            backend,
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Receive every grid event emitted from now on
    pub fn subscribe(&self) -> UnboundedReceiver<GridEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    // ============ Read state ============

    pub fn data_state(&self) -> DataState<M> {
        self.state.lock().data_state()
    }

    pub fn row(&self, row_id: RowId) -> Option<Row<M>> {
        self.state.lock().row(row_id).cloned()
    }

    pub fn edit_field(&self) -> Option<EditField> {
        self.state.lock().edit_field().cloned()
    }

    pub fn needs_save(&self) -> bool {
        self.state.lock().needs_save()
    }

    pub fn has_validation_errors(&self) -> bool {
        self.state.lock().has_validation_errors()
    }

    pub fn sync_progress(&self) -> Option<SyncProgress> {
        self.state.lock().sync_progress()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().is_loading()
    }

    pub fn query(&self) -> DataQuery {
        self.state.lock().query().clone()
    }

    // ============ Row edits ============

    pub fn update_row(&self, row_id: RowId, model: M) -> ServiceResult<bool> {
        Ok(self.with_state(|s| s.update_row(row_id, model))?)
    }

    pub fn update_field(&self, row_id: RowId, field: &str, value: Value) -> ServiceResult<bool> {
        Ok(self.with_state(|s| s.update_field(row_id, field, value))?)
    }

    pub fn add_row(&self, model: M) -> ServiceResult<RowId> {
        Ok(self.with_state(|s| s.add_row(model))?)
    }

    pub fn delete_row(&self, row_id: RowId) -> ServiceResult<bool> {
        Ok(self.with_state(|s| s.delete_row(row_id))?)
    }

    pub fn revert_row(&self, row_id: RowId) -> ServiceResult<()> {
        Ok(self.with_state(|s| s.revert_row(row_id))?)
    }

    pub fn revert_rows(&self, row_ids: &[RowId]) {
        self.with_state(|s| s.revert_rows(row_ids))
    }

    pub fn revert_all(&self) {
        self.with_state(|s| s.revert_all())
    }

    pub fn toggle_detail(&self, row_id: RowId) -> ServiceResult<bool> {
        Ok(self.with_state(|s| s.toggle_detail(row_id))?)
    }

    pub fn set_edit_field(&self, edit_field: Option<EditField>) -> ServiceResult<()> {
        Ok(self.with_state(|s| s.set_edit_field(edit_field))?)
    }

    pub fn advance_edit_field(&self, direction: Direction) -> ServiceResult<Option<EditField>> {
        Ok(self.with_state(|s| s.advance_edit_field(direction).map(|ef| ef.cloned()))?)
    }

    /// Flag that a sync should run; see [`GridController::process_save_request`]
    pub fn request_sync(&self) {
        self.with_state(|s| s.request_save())
    }

    // ============ Loading ============

    /// Load the page described by `query`, replacing all rows
    #[tracing::instrument(skip(self))]
    pub async fn load(&self, query: DataQuery) -> ServiceResult<()> {
        let generation = self.with_state(|s| s.begin_load(query.clone()))?;

        match self.data_source.fetch(&query).await {
            Ok(page) => {
                let count = page.data.len();
                let total_count = page.total_count;
                let applied = self.with_state(|s| s.complete_load(generation, page));
                if applied {
                    tracing::info!(count, total_count, "Page loaded");
                }
                Ok(())
            }
            Err(e) => {
                self.with_state(|s| s.fail_load(generation));
                tracing::error!(error = %e, "Data load failed");
                Err(ServiceError::LoadFailed(e.to_string()))
            }
        }
    }

    /// Reload the current page
    pub async fn reload(&self) -> ServiceResult<()> {
        self.load(self.query()).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_page(&self, page: usize) -> ServiceResult<()> {
        let mut query = self.query();
        query.pagination.page = page;
        self.load(query).await
    }

    /// Change the sort order and go back to the first page
    #[tracing::instrument(skip(self))]
    pub async fn set_sort(&self, sort: Vec<SortSpec>) -> ServiceResult<()> {
        let mut query = self.query();
        query.sort = sort;
        query.pagination.page = 0;
        self.load(query).await
    }

    /// Change the filters and go back to the first page
    #[tracing::instrument(skip(self))]
    pub async fn set_filters(&self, filters: Vec<Filter>) -> ServiceResult<()> {
        let mut query = self.query();
        query.filters = filters;
        query.pagination.page = 0;
        self.load(query).await
    }

    // ============ Synchronization ============

    /// Submit every dirty row to the sync backend and reconcile the results.
    ///
    /// The in-flight marker is cleared however this returns, including when
    /// the future is dropped mid-sync.
    #[tracing::instrument(skip(self))]
    pub async fn sync_changes(&self) -> ServiceResult<ReconcileSummary> {
        let batch = self.with_state(|s| s.begin_sync())?;
        let _finish = FinishSync { controller: self };

        if batch.is_empty() {
            tracing::debug!("Nothing to sync");
            return Ok(ReconcileSummary::default());
        }

        let _timer = TimingGuard::new("sync_changes");
        let total = batch.len();
        let subscribers = self.subscribers.clone();
        let state = self.state.clone();
        let reporter = ProgressReporter::new(
            self.state.clone(),
            Arc::new(move || publish(&state, &subscribers)),
        );

        match self.backend.sync_changes(batch, reporter).await {
            Ok(results) => {
                let summary = self.with_state(|s| s.apply_sync_results(&results));
                if summary.is_clean() {
                    tracing::info!(
                        total,
                        committed = summary.committed.len(),
                        removed = summary.removed.len(),
                        superseded = summary.superseded.len(),
                        "Sync completed"
                    );
                } else {
                    tracing::warn!(
                        total,
                        failed = summary.failed.len(),
                        "Sync completed with rejected rows"
                    );
                }
                Ok(summary)
            }
            Err(e) => {
                tracing::error!(error = %e, total, "Sync rejected by backend");
                Err(ServiceError::SyncFailed(e.to_string()))
            }
        }
    }

    /// Run a sync if one was requested.
    ///
    /// The request is consumed even when the sync is skipped because rows
    /// are invalid or nothing is dirty. Returns `None` when no sync ran.
    #[tracing::instrument(skip(self))]
    pub async fn process_save_request(&self) -> ServiceResult<Option<ReconcileSummary>> {
        let ready = {
            let mut state = self.state.lock();
            if !state.take_save_request() {
                return Ok(None);
            }
            if state.has_validation_errors() {
                tracing::debug!("Save request skipped: rows have validation errors");
                false
            } else {
                state.needs_save()
            }
        };

        if !ready {
            return Ok(None);
        }
        self.sync_changes().await.map(Some)
    }

    /// Run `f` under the lock, then forward the events it queued
    fn with_state<R>(&self, f: impl FnOnce(&mut GridState<M>) -> R) -> R {
        let result = f(&mut self.state.lock());
        publish(&self.state, &self.subscribers);
        result
    }
}

impl<M: GridModel + Default> GridController<M> {
    /// Add a row built from the column default values
    pub fn add_new_row(&self) -> ServiceResult<RowId> {
        Ok(self.with_state(|s| {
            let model = new_row_model::<M>(s.columns());
            s.add_row(model)
        })?)
    }
}

struct FinishSync<'a, M: GridModel> {
    controller: &'a GridController<M>,
}

impl<M: GridModel> Drop for FinishSync<'_, M> {
    fn drop(&mut self) {
        self.controller.with_state(|s| s.finish_sync());
    }
}

fn publish<M: GridModel>(state: &Mutex<GridState<M>>, subscribers: &Subscribers) {
    let events = state.lock().drain_events();
    if events.is_empty() {
        return;
    }
    let mut subscribers = subscribers.lock();
    subscribers.retain(|tx| events.iter().all(|e| tx.unbounded_send(e.clone()).is_ok()));
}
