//! Sync batch types and result reconciliation

use serde::{Deserialize, Serialize};

use crate::model::GridModel;
use crate::row::{Row, RowId, SyncAction};

/// One dirty row submitted to the backing store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncChange<M> {
    pub row_id: RowId,
    pub model: M,
    pub sync_action: SyncAction,
}

/// Outcome of one submitted change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResult<M> {
    pub row_id: RowId,
    /// Model as persisted; may carry server-assigned values
    pub model: M,
    pub sync_action: SyncAction,
    pub success: bool,
    /// Failure message for display, never interpreted
    pub error: Option<String>,
}

impl<M> SyncResult<M> {
    pub fn succeeded(change: SyncChange<M>) -> Self {
        Self {
            row_id: change.row_id,
            model: change.model,
            sync_action: change.sync_action,
            success: true,
            error: None,
        }
    }

    pub fn failed(change: SyncChange<M>, error: impl Into<String>) -> Self {
        Self {
            row_id: change.row_id,
            model: change.model,
            sync_action: change.sync_action,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Progress of the sync currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgress {
    pub current: usize,
    pub total: usize,
}

impl SyncProgress {
    pub fn new(current: usize, total: usize) -> Self {
        Self { current, total }
    }
}

/// What one reconciliation pass did to the row collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileSummary {
    /// Committed rows as (retired id, issued id)
    pub committed: Vec<(RowId, RowId)>,
    /// Rows removed after a confirmed delete
    pub removed: Vec<RowId>,
    /// Rows whose change was rejected and stay dirty
    pub failed: Vec<RowId>,
    /// Successful results whose row was already reconciled
    pub skipped: usize,
    /// Committed rows that were pending insertion
    pub inserted: usize,
    /// Removed rows that had existed in the backing store
    pub purged: usize,
    /// Committed rows edited again while the sync ran, by issued id. They
    /// keep their local changes and stay dirty.
    pub superseded: Vec<RowId>,
}

impl ReconcileSummary {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn merge(&mut self, other: ReconcileSummary) {
        self.committed.extend(other.committed);
        self.removed.extend(other.removed);
        self.failed.extend(other.failed);
        self.skipped += other.skipped;
        self.inserted += other.inserted;
        self.purged += other.purged;
        self.superseded.extend(other.superseded);
    }
}

/// Collect every dirty row into a sync batch, in collection order
pub fn collect_changes<M: GridModel>(rows: &[Row<M>]) -> Vec<SyncChange<M>> {
    rows.iter()
        .filter(|row| row.is_dirty())
        .map(|row| SyncChange {
            row_id: row.row_id,
            model: row.model.clone(),
            sync_action: row.sync_action,
        })
        .collect()
}

/// Merge sync results into the row collection.
///
/// Results are looked up by row id; a miss means the row was reconciled by an
/// earlier pass and is skipped, which makes repeated passes idempotent.
/// Committed rows get a fresh id while keeping their position, row number and
/// detail flag. Failed results leave their row untouched.
///
/// `submitted` is the batch the results answer. A row whose model or action
/// no longer matches its submitted change was edited while the sync ran: the
/// persisted model becomes its revert target but the local edit is kept.
pub fn reconcile<M: GridModel>(
    rows: &mut Vec<Row<M>>,
    results: &[SyncResult<M>],
    submitted: &[SyncChange<M>],
) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();

    for result in results {
        if !result.success {
            tracing::debug!(row_id = %result.row_id, error = ?result.error, "Sync rejected row");
            summary.failed.push(result.row_id);
            continue;
        }

        let Some(index) = rows.iter().position(|r| r.row_id == result.row_id) else {
            summary.skipped += 1;
            continue;
        };

        let edited_since = submitted
            .iter()
            .find(|c| c.row_id == result.row_id)
            .is_some_and(|c| {
                c.model != rows[index].model || c.sync_action != rows[index].sync_action
            });

        if result.sync_action == SyncAction::Deleted && !edited_since {
            let row = rows.remove(index);
            if !row.is_new {
                summary.purged += 1;
            }
            summary.removed.push(result.row_id);
            continue;
        }

        let row = &mut rows[index];
        let new_id = RowId::new();
        if result.sync_action == SyncAction::Deleted {
            // Delete was reverted locally but the store already dropped the row
            if !row.is_new {
                summary.purged += 1;
            }
            row.sync_action = SyncAction::Added;
            row.is_new = true;
        } else {
            if row.is_new {
                summary.inserted += 1;
            }
            row.original_model = result.model.clone();
            row.is_new = false;
            if edited_since {
                row.sync_action = if row.is_deleted() {
                    SyncAction::Deleted
                } else if row.model == row.original_model {
                    SyncAction::Unchanged
                } else {
                    SyncAction::Updated
                };
            } else {
                row.model = result.model.clone();
                row.sync_action = SyncAction::Unchanged;
                row.validation_errors.clear();
            }
        }
        row.row_id = new_id;
        summary.committed.push((result.row_id, new_id));
        if row.is_dirty() {
            tracing::debug!(
                row_id = %new_id,
                sync_action = %row.sync_action,
                "Row edited during sync keeps local changes"
            );
            summary.superseded.push(new_id);
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;
    use pretty_assertions::assert_eq;

    fn dirty_rows() -> Vec<Row<Record>> {
        let mut rows: Vec<Row<Record>> = (1..=4)
            .map(|i| Row::loaded(Record::new().with("key", i as i64)))
            .collect();
        rows[0].sync_action = SyncAction::Updated;
        rows[0].model = Record::new().with("key", 1).with("name", "edited");
        rows[1].sync_action = SyncAction::Deleted;
        rows[1].row_number = -1;
        rows.push(Row::added(Record::new().with("key", 9)));
        for (i, row) in rows.iter_mut().enumerate() {
            if !row.is_deleted() {
                row.row_number = i as i64 + 1;
            }
        }
        rows
    }

    #[test]
    fn batch_contains_only_dirty_rows() {
        let rows = dirty_rows();
        let batch = collect_changes(&rows);
        let actions: Vec<_> = batch.iter().map(|c| c.sync_action).collect();
        assert_eq!(actions, vec![SyncAction::Updated, SyncAction::Deleted, SyncAction::Added]);
        assert_eq!(batch[0].row_id, rows[0].row_id);
    }

    #[test]
    fn successful_update_gets_fresh_identity() {
        let mut rows = dirty_rows();
        let before = rows[0].clone();
        let persisted = before.model.clone().with("version", 2);
        let result = SyncResult {
            row_id: before.row_id,
            model: persisted.clone(),
            sync_action: SyncAction::Updated,
            success: true,
            error: None,
        };

        let summary = reconcile(&mut rows, &[result], &[]);

        let row = &rows[0];
        assert_ne!(row.row_id, before.row_id);
        assert_eq!(summary.committed, vec![(before.row_id, row.row_id)]);
        assert_eq!(row.model, persisted);
        assert_eq!(row.original_model, persisted);
        assert_eq!(row.sync_action, SyncAction::Unchanged);
        assert_eq!(row.row_number, before.row_number);
        assert_eq!(row.show_detail, before.show_detail);
    }

    #[test]
    fn confirmed_delete_removes_exactly_one_row() {
        let mut rows = dirty_rows();
        let batch = collect_changes(&rows);
        let deleted = batch[1].clone();
        let count = rows.len();

        let summary = reconcile(&mut rows, &[SyncResult::succeeded(deleted.clone())], &batch);

        assert_eq!(rows.len(), count - 1);
        assert_eq!(summary.removed, vec![deleted.row_id]);
        assert_eq!(summary.purged, 1);
        assert!(rows.iter().all(|r| r.row_id != deleted.row_id));
    }

    #[test]
    fn failed_result_leaves_row_untouched() {
        let mut rows = dirty_rows();
        let before = rows.clone();
        let batch = collect_changes(&rows);
        let results: Vec<_> = batch
            .iter()
            .cloned()
            .map(|c| SyncResult::failed(c, "constraint violation"))
            .collect();

        let summary = reconcile(&mut rows, &results, &batch);

        assert_eq!(rows, before);
        assert_eq!(summary.failed.len(), 3);
        assert!(!summary.is_clean());
    }

    #[test]
    fn second_pass_is_idempotent() {
        let mut rows = dirty_rows();
        let batch = collect_changes(&rows);
        let results: Vec<_> = batch.iter().cloned().map(SyncResult::succeeded).collect();

        let first = reconcile(&mut rows, &results, &batch);
        let after_first = rows.clone();
        let second = reconcile(&mut rows, &results, &batch);

        assert_eq!(first.committed.len(), 2);
        assert_eq!(first.inserted, 1);
        assert_eq!(second.skipped, 3);
        assert_eq!(rows, after_first);
    }

    #[test]
    fn edit_made_during_sync_survives_commit() {
        let mut rows = dirty_rows();
        let batch = collect_changes(&rows);
        let results: Vec<_> = batch.iter().cloned().map(SyncResult::succeeded).collect();
        let submitted = batch[0].model.clone();
        let local = submitted.clone().with("name", "edited again");
        rows[0].model = local.clone();

        let summary = reconcile(&mut rows, &results[..1], &batch);

        let row = &rows[0];
        assert_eq!(summary.superseded, vec![row.row_id]);
        assert_eq!(row.model, local);
        assert_eq!(row.original_model, submitted);
        assert_eq!(row.sync_action, SyncAction::Updated);
    }

    #[test]
    fn delete_made_during_sync_stays_pending() {
        let mut rows = dirty_rows();
        let batch = collect_changes(&rows);
        let results: Vec<_> = batch.iter().cloned().map(SyncResult::succeeded).collect();
        let added_index = rows.len() - 1;
        rows[0].sync_action = SyncAction::Deleted;
        rows[added_index].sync_action = SyncAction::Deleted;

        let summary = reconcile(&mut rows, &[results[0].clone(), results[2].clone()], &batch);

        assert_eq!(summary.superseded.len(), 2);
        assert_eq!(summary.inserted, 1);
        assert!(rows[0].is_deleted());
        assert!(!rows[added_index].is_new);
        assert!(rows[added_index].is_deleted());
    }

    #[test]
    fn reverted_delete_is_reinserted() {
        let mut rows = dirty_rows();
        let batch = collect_changes(&rows);
        let deleted = batch[1].clone();
        rows[1].sync_action = SyncAction::Unchanged;

        let summary = reconcile(&mut rows, &[SyncResult::succeeded(deleted)], &batch);

        assert!(summary.removed.is_empty());
        assert_eq!(summary.purged, 1);
        assert_eq!(rows[1].sync_action, SyncAction::Added);
        assert!(rows[1].is_new);
        assert_eq!(summary.superseded, vec![rows[1].row_id]);
    }
}
