//! Row entity model and the sync-action lattice

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::error::{GridError, Result};
use crate::model::GridModel;
use crate::validation::FieldError;

/// Row number carried by rows marked for deletion
pub const DELETED_ROW_NUMBER: i64 = -1;

/// Stable client-side identity of a row.
///
/// Issued when a row is materialised and re-issued after every successful
/// sync of an add or update, so dependents can tell a freshly persisted row
/// from the one they last saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(Uuid);

impl RowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pending change classification of a row relative to the backing store
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SyncAction {
    #[default]
    Unchanged,
    Added,
    Updated,
    Deleted,
}

impl SyncAction {
    /// Compute the action a row moves to when `requested` is applied to it.
    ///
    /// Requesting `Unchanged` never downgrades a dirty row; only revert and
    /// sync reconciliation reset a row, and they do so directly. Deleting an
    /// added row and editing a deleted row are rejected here.
    pub fn next(self, requested: SyncAction) -> Result<SyncAction> {
        use crate::row::SyncAction::{Added, Deleted, Unchanged, Updated};

        match (self, requested) {
            (current, Unchanged) => Ok(current),
            (Unchanged, Updated) => Ok(Updated),
            (Added, Updated) => Ok(Added),
            (Updated, Updated) => Ok(Updated),
            (Updated, Deleted) => Ok(Deleted),
            (from, to) => Err(GridError::IllegalTransition { from, to }),
        }
    }

    /// Whether a row in this state belongs in the next sync batch
    pub fn is_dirty(self) -> bool {
        self != SyncAction::Unchanged
    }
}

/// One materialised record and its edit state
#[derive(Debug, Clone, PartialEq)]
pub struct Row<M> {
    pub row_number: i64,
    pub row_id: RowId,
    pub model: M,
    pub original_model: M,
    pub sync_action: SyncAction,
    pub validation_errors: Vec<FieldError>,
    pub show_detail: bool,
    /// Created locally and never confirmed by the backing store
    pub is_new: bool,
}

impl<M: GridModel> Row<M> {
    /// A row freshly loaded from the data source
    pub fn loaded(model: M) -> Self {
        Self {
            row_number: 0,
            row_id: RowId::new(),
            original_model: model.clone(),
            model,
            sync_action: SyncAction::Unchanged,
            validation_errors: Vec::new(),
            show_detail: false,
            is_new: false,
        }
    }

    /// A row created locally, pending insertion
    pub fn added(model: M) -> Self {
        Self {
            sync_action: SyncAction::Added,
            is_new: true,
            ..Self::loaded(model)
        }
    }
}

impl<M> Row<M> {
    pub fn is_deleted(&self) -> bool {
        self.sync_action == SyncAction::Deleted
    }

    pub fn is_dirty(&self) -> bool {
        self.sync_action.is_dirty()
    }

    pub fn has_errors(&self) -> bool {
        !self.validation_errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;
    use crate::row::SyncAction::{Added, Deleted, Unchanged, Updated};

    #[test]
    fn legal_transitions() {
        assert_eq!(Unchanged.next(Unchanged), Ok(Unchanged));
        assert_eq!(Unchanged.next(Updated), Ok(Updated));
        assert_eq!(Added.next(Updated), Ok(Added));
        assert_eq!(Updated.next(Updated), Ok(Updated));
        assert_eq!(Updated.next(Deleted), Ok(Deleted));
    }

    #[test]
    fn unchanged_request_keeps_current_state() {
        for current in [Unchanged, Added, Updated, Deleted] {
            assert_eq!(current.next(Unchanged), Ok(current));
        }
    }

    #[test]
    fn rejects_edit_of_deleted_row() {
        assert_eq!(
            Deleted.next(Updated),
            Err(GridError::IllegalTransition {
                from: Deleted,
                to: Updated
            })
        );
    }

    #[test]
    fn rejects_delete_of_added_row() {
        assert!(matches!(
            Added.next(Deleted),
            Err(GridError::IllegalTransition { from: Added, to: Deleted })
        ));
    }

    #[test]
    fn rejects_remaining_combinations() {
        assert!(Unchanged.next(Deleted).is_err());
        assert!(Unchanged.next(Added).is_err());
        assert!(Updated.next(Added).is_err());
        assert!(Deleted.next(Deleted).is_err());
    }

    #[test]
    fn sync_action_string_form() {
        assert_eq!(Updated.to_string(), "updated");
        assert_eq!("deleted".parse::<SyncAction>().unwrap(), Deleted);
    }

    #[test]
    fn added_row_starts_with_identical_snapshot() {
        let model = Record::new().with("key", 0).with("name", "new");
        let row = Row::added(model.clone());
        assert_eq!(row.sync_action, Added);
        assert!(row.is_new);
        assert_eq!(row.original_model, model);
        assert_eq!(row.model, model);
        assert!(!row.show_detail);
    }

    #[test]
    fn loaded_rows_get_distinct_ids() {
        let a = Row::loaded(Record::new());
        let b = Row::loaded(Record::new());
        assert_ne!(a.row_id, b.row_id);
        assert_eq!(a.sync_action, Unchanged);
    }
}
