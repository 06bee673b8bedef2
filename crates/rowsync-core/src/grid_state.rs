//! Grid state and row-edit operations
//!
//! [`GridState`] owns the row collection, the edit cursor and the aggregate
//! flags of one grid instance. Every mutation goes through a method here so
//! that row numbering, `needs_save` and the validation flag are recomputed
//! in the same step. State changes are queued as [`GridEvent`]s and handed
//! out by [`GridState::drain_events`].

use std::collections::VecDeque;

use crate::column::{Column, navigable_fields};
use crate::config::GridConfig;
use crate::cursor::{Direction, EditField, next_edit_field};
use crate::error::{GridError, Result};
use crate::events::GridEvent;
use crate::model::GridModel;
use crate::query::{DataPage, DataQuery, DataState, Pagination};
use crate::row::{DELETED_ROW_NUMBER, Row, RowId, SyncAction};
use crate::sync::{ReconcileSummary, SyncChange, SyncProgress, SyncResult, collect_changes, reconcile};
use crate::types::Value;
use crate::validation::validate_model;


/// Events kept for a host that does not drain them; older ones are dropped
pub const MAX_PENDING_EVENTS: usize = 1024;

/// State of one grid instance.
///
/// Hosts driving a `GridState` directly must call
/// [`GridState::drain_events`] after each operation. Undrained events are
/// capped at [`MAX_PENDING_EVENTS`], dropping the oldest.
pub struct GridState<M> {
    config: GridConfig,
    columns: Vec<Column>,
    rows: Vec<Row<M>>,
    total_count: usize,
    query: DataQuery,
    edit_field: Option<EditField>,
    needs_save: bool,
    has_validation_errors: bool,
    save_requested: bool,
    sync_progress: Option<SyncProgress>,
    is_loading: bool,
    load_generation: u64,
    /// Batch submitted by the last `begin_sync`
    in_flight: Vec<SyncChange<M>>,
    events: VecDeque<GridEvent>,
}

impl<M: GridModel> GridState<M> {
    pub fn new(config: GridConfig, columns: Vec<Column>) -> Self {
        let query = DataQuery {
            pagination: Pagination::new(0, config.page_size),
            ..DataQuery::default()
        };
        Self {
            config,
            columns,
            rows: Vec::new(),
            total_count: 0,
            query,
            edit_field: None,
            needs_save: false,
            has_validation_errors: false,
            save_requested: false,
            sync_progress: None,
            is_loading: false,
            load_generation: 0,
            in_flight: Vec::new(),
            events: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row<M>] {
        &self.rows
    }

    pub fn row(&self, row_id: RowId) -> Option<&Row<M>> {
        self.rows.iter().find(|r| r.row_id == row_id)
    }

    pub fn data_state(&self) -> DataState<M> {
        DataState {
            total_count: self.total_count,
            data: self.rows.clone(),
        }
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn query(&self) -> &DataQuery {
        &self.query
    }

    pub fn edit_field(&self) -> Option<&EditField> {
        self.edit_field.as_ref()
    }

    pub fn needs_save(&self) -> bool {
        self.needs_save
    }

    pub fn has_validation_errors(&self) -> bool {
        self.has_validation_errors
    }

    pub fn sync_progress(&self) -> Option<SyncProgress> {
        self.sync_progress
    }

    pub fn is_sync_in_progress(&self) -> bool {
        self.sync_progress.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Page, sort and filter changes are refused while edits are pending or
    /// a sync is iterating the rows
    pub fn can_change_view(&self) -> bool {
        !self.needs_save && !self.is_sync_in_progress()
    }

    /// Take the events queued since the last call
    pub fn drain_events(&mut self) -> Vec<GridEvent> {
        self.events.drain(..).collect()
    }

    // ---- Loading ----

    /// Start loading `query`. Returns the generation the result must carry.
    pub fn begin_load(&mut self, query: DataQuery) -> Result<u64> {
        if !self.can_change_view() {
            return Err(GridError::NavigationLocked);
        }
        self.query = query;
        self.is_loading = true;
        self.load_generation += 1;
        Ok(self.load_generation)
    }

    /// Replace the rows with a loaded page.
    ///
    /// Returns `false` and leaves the grid untouched when a newer load was
    /// started after `generation`.
    pub fn complete_load(&mut self, generation: u64, page: DataPage<M>) -> bool {
        if generation != self.load_generation {
            tracing::debug!(
                generation,
                current = self.load_generation,
                "Discarding stale data load"
            );
            return false;
        }
        self.is_loading = false;
        self.load_rows(page);
        true
    }

    /// Clear the loading flag after a failed fetch
    pub fn fail_load(&mut self, generation: u64) {
        if generation == self.load_generation {
            self.is_loading = false;
        }
    }

    /// Seed the grid with freshly loaded, unchanged rows
    pub fn load_rows(&mut self, page: DataPage<M>) {
        self.rows = page.data.into_iter().map(Row::loaded).collect();
        self.in_flight.clear();
        self.total_count = page.total_count;
        self.needs_save = false;
        self.save_requested = false;
        self.renumber();
        self.refresh_validation_flag();
        self.set_cursor(None);
        self.emit(GridEvent::RowsLoaded {
            count: self.rows.len(),
            total_count: self.total_count,
        });
    }

    // ---- Row-edit operations ----

    /// Replace the model of a row.
    ///
    /// Returns `false` without touching anything when `model` equals the
    /// row's current model.
    pub fn update_row(&mut self, row_id: RowId, model: M) -> Result<bool> {
        self.ensure_editable()?;
        let index = self.index_of(row_id)?;

        let row = &mut self.rows[index];
        if row.model == model {
            return Ok(false);
        }
        let next = row.sync_action.next(SyncAction::Updated)?;
        row.model = model;
        row.sync_action = next;

        self.renumber();
        self.validate_row(index);
        self.needs_save = true;
        tracing::debug!(row_id = %row_id, sync_action = %next, "Row updated");
        self.emit(GridEvent::RowUpdated(row_id));
        self.autosave();
        Ok(true)
    }

    /// Set a single field of a row through [`GridState::update_row`]
    pub fn update_field(&mut self, row_id: RowId, field: &str, value: Value) -> Result<bool> {
        let mut model = self
            .row(row_id)
            .ok_or(GridError::RowNotFound(row_id))?
            .model
            .clone();
        model.set(field, value);
        self.update_row(row_id, model)
    }

    /// Insert a new row pending creation and select it for editing
    pub fn add_row(&mut self, model: M) -> Result<RowId> {
        self.ensure_editable()?;

        let row = Row::added(model);
        let row_id = row.row_id;
        let index = if self.config.add_to_bottom() {
            self.rows.push(row);
            self.rows.len() - 1
        } else {
            self.rows.insert(0, row);
            0
        };

        self.renumber();
        self.validate_row(index);
        self.needs_save = true;
        tracing::debug!(row_id = %row_id, index, "Row added");
        self.emit(GridEvent::RowAdded(row_id));
        self.set_cursor(Some(EditField::row(row_id)));
        self.autosave();
        Ok(row_id)
    }

    /// Mark a row for deletion.
    ///
    /// Returns `false` when the row is already marked. Added rows are marked
    /// too; they leave the collection on sync or revert.
    pub fn delete_row(&mut self, row_id: RowId) -> Result<bool> {
        self.ensure_editable()?;
        let index = self.index_of(row_id)?;

        let row = &mut self.rows[index];
        let next = match row.sync_action {
            SyncAction::Deleted => return Ok(false),
            SyncAction::Updated => row.sync_action.next(SyncAction::Deleted)?,
            SyncAction::Unchanged | SyncAction::Added => SyncAction::Deleted,
        };
        row.sync_action = next;
        row.row_number = DELETED_ROW_NUMBER;
        row.validation_errors.clear();

        self.renumber();
        self.refresh_validation_flag();
        self.needs_save = true;
        if self.edit_field.as_ref().is_some_and(|ef| ef.row_id == row_id) {
            self.set_cursor(None);
        }
        tracing::debug!(row_id = %row_id, "Row marked for deletion");
        self.emit(GridEvent::RowDeleted(row_id));
        self.autosave();
        Ok(true)
    }

    /// Revert one row to its last loaded or synced state
    pub fn revert_row(&mut self, row_id: RowId) -> Result<()> {
        self.index_of(row_id)?;
        self.revert_rows(&[row_id]);
        Ok(())
    }

    /// Revert rows to their last loaded or synced state.
    ///
    /// Rows that were never persisted are dropped. Unknown ids are ignored.
    pub fn revert_rows(&mut self, row_ids: &[RowId]) {
        let mut reverted = Vec::new();

        for row_id in row_ids {
            let Some(index) = self.rows.iter().position(|r| r.row_id == *row_id) else {
                continue;
            };
            let (action, is_new) = (self.rows[index].sync_action, self.rows[index].is_new);
            match action {
                SyncAction::Unchanged => continue,
                SyncAction::Added => {
                    self.rows.remove(index);
                }
                SyncAction::Deleted if is_new => {
                    self.rows.remove(index);
                }
                SyncAction::Updated | SyncAction::Deleted => {
                    let row = &mut self.rows[index];
                    row.model = row.original_model.clone();
                    row.sync_action = SyncAction::Unchanged;
                    row.validation_errors.clear();
                }
            }
            reverted.push(*row_id);
        }

        self.renumber();
        self.needs_save = self.rows.iter().any(|r| r.is_dirty());
        self.refresh_validation_flag();
        let cursor_lost = self
            .edit_field
            .as_ref()
            .is_some_and(|cursor| self.row(cursor.row_id).is_none());
        if cursor_lost {
            self.set_cursor(None);
        }

        if !reverted.is_empty() {
            tracing::debug!(count = reverted.len(), "Rows reverted");
            self.emit(GridEvent::RowsReverted(reverted));
        }
    }

    /// Revert every dirty row
    pub fn revert_all(&mut self) {
        let dirty: Vec<RowId> = self
            .rows
            .iter()
            .filter(|r| r.is_dirty())
            .map(|r| r.row_id)
            .collect();
        self.revert_rows(&dirty);
    }

    /// Flip the detail-row expansion of a row, returning the new state
    pub fn toggle_detail(&mut self, row_id: RowId) -> Result<bool> {
        let index = self.index_of(row_id)?;
        let row = &mut self.rows[index];
        row.show_detail = !row.show_detail;
        let shown = row.show_detail;
        self.emit(GridEvent::DetailToggled(row_id));
        Ok(shown)
    }

    // ---- Edit cursor ----

    /// Point the edit cursor at a row and field, or clear it with `None`
    pub fn set_edit_field(&mut self, edit_field: Option<EditField>) -> Result<()> {
        if let Some(target) = &edit_field {
            self.ensure_editable()?;
            let row = self
                .row(target.row_id)
                .ok_or(GridError::RowNotFound(target.row_id))?;
            if row.is_deleted() {
                return Err(GridError::RowDeleted(target.row_id));
            }
            if let Some(field) = target.field.as_deref() {
                if !navigable_fields(&self.columns).contains(&field) {
                    return Err(GridError::FieldNotEditable(field.to_string()));
                }
            }
        }
        self.set_cursor(edit_field);
        Ok(())
    }

    /// Move the edit cursor one editable field forward or backward
    pub fn advance_edit_field(&mut self, direction: Direction) -> Result<Option<&EditField>> {
        if self.edit_field.is_none() {
            return Ok(None);
        }
        let next = next_edit_field(self.edit_field.as_ref(), &self.columns, &self.rows, direction)?;
        self.set_cursor(next);
        Ok(self.edit_field.as_ref())
    }

    // ---- Synchronization ----

    /// Ask for a sync at the next opportunity
    pub fn request_save(&mut self) {
        if !self.save_requested {
            self.save_requested = true;
            self.emit(GridEvent::SaveRequested);
        }
    }

    /// Consume a pending save request
    pub fn take_save_request(&mut self) -> bool {
        std::mem::take(&mut self.save_requested)
    }

    pub fn is_save_requested(&self) -> bool {
        self.save_requested
    }

    /// Snapshot the dirty rows into a batch and mark a sync as in flight
    pub fn begin_sync(&mut self) -> Result<Vec<SyncChange<M>>> {
        self.ensure_editable()?;
        if self.is_sync_in_progress() {
            return Err(GridError::SyncInProgress);
        }
        let invalid = self
            .rows
            .iter()
            .filter(|r| !r.is_deleted() && r.has_errors())
            .count();
        if invalid > 0 {
            return Err(GridError::ValidationPending(invalid));
        }

        let batch = collect_changes(&self.rows);
        self.in_flight = batch.clone();
        let progress = SyncProgress::new(0, batch.len());
        self.sync_progress = Some(progress);
        self.save_requested = false;
        tracing::debug!(total = batch.len(), "Sync started");
        self.emit(GridEvent::SyncStarted { total: batch.len() });
        self.emit(GridEvent::SyncProgress(progress));
        Ok(batch)
    }

    /// Record progress of the sync in flight and merge any interim results
    pub fn report_progress(
        &mut self,
        progress: SyncProgress,
        interim: Option<&[SyncResult<M>]>,
    ) -> ReconcileSummary {
        if self.is_sync_in_progress() {
            self.sync_progress = Some(progress);
            self.emit(GridEvent::SyncProgress(progress));
        }
        match interim {
            Some(results) => self.apply_sync_results(results),
            None => ReconcileSummary::default(),
        }
    }

    /// Merge sync results into the rows.
    ///
    /// Committed rows are re-keyed; the edit cursor follows them to their new
    /// id and is cleared if its row was removed. Rows edited after
    /// `begin_sync` keep their local changes and stay dirty.
    pub fn apply_sync_results(&mut self, results: &[SyncResult<M>]) -> ReconcileSummary {
        let summary = reconcile(&mut self.rows, results, &self.in_flight);

        if let Some(cursor) = self.edit_field.clone() {
            if summary.removed.contains(&cursor.row_id) {
                self.set_cursor(None);
            } else if let Some((_, new_id)) =
                summary.committed.iter().find(|(old, _)| *old == cursor.row_id)
            {
                self.set_cursor(Some(EditField {
                    row_id: *new_id,
                    field: cursor.field,
                }));
            }
        }

        self.total_count = (self.total_count + summary.inserted).saturating_sub(summary.purged);
        self.renumber();
        self.refresh_validation_flag();
        tracing::debug!(
            committed = summary.committed.len(),
            removed = summary.removed.len(),
            failed = summary.failed.len(),
            skipped = summary.skipped,
            superseded = summary.superseded.len(),
            "Sync results applied"
        );
        summary
    }

    /// Clear the in-flight marker. Must run whether or not the sync succeeded.
    pub fn finish_sync(&mut self) {
        self.sync_progress = None;
        let remaining = self.rows.iter().filter(|r| r.is_dirty()).count();
        self.needs_save = remaining > 0;
        self.emit(GridEvent::SyncFinished { remaining });
    }

    // ---- Internals ----

    fn ensure_editable(&self) -> Result<()> {
        if self.config.is_editable() {
            Ok(())
        } else {
            Err(GridError::NotEditable)
        }
    }

    fn index_of(&self, row_id: RowId) -> Result<usize> {
        self.rows
            .iter()
            .position(|r| r.row_id == row_id)
            .ok_or(GridError::RowNotFound(row_id))
    }

    fn renumber(&mut self) {
        let mut number = 0;
        for row in &mut self.rows {
            if row.is_deleted() {
                row.row_number = DELETED_ROW_NUMBER;
            } else {
                number += 1;
                row.row_number = number;
            }
        }
    }

    fn validate_row(&mut self, index: usize) {
        let errors = validate_model(&self.rows[index].model, &self.columns);
        self.rows[index].validation_errors = errors;
        self.refresh_validation_flag();
    }

    fn refresh_validation_flag(&mut self) {
        let has_errors = self.rows.iter().any(|r| r.has_errors());
        if has_errors != self.has_validation_errors {
            self.has_validation_errors = has_errors;
            self.emit(GridEvent::ValidationChanged(has_errors));
        }
    }

    fn set_cursor(&mut self, edit_field: Option<EditField>) {
        if self.edit_field != edit_field {
            self.edit_field = edit_field.clone();
            self.emit(GridEvent::EditFieldChanged(edit_field));
        }
    }

    fn autosave(&mut self) {
        if self.config.autosave() {
            self.request_save();
        }
    }

    fn emit(&mut self, event: GridEvent) {
        if self.events.len() == MAX_PENDING_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}
