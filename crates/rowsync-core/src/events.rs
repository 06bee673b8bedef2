//! Change notifications emitted by the grid

use crate::cursor::EditField;
use crate::row::RowId;
use crate::sync::SyncProgress;

/// Emitted after a grid operation changed observable state
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    RowsLoaded { count: usize, total_count: usize },
    RowUpdated(RowId),
    RowAdded(RowId),
    RowDeleted(RowId),
    RowsReverted(Vec<RowId>),
    DetailToggled(RowId),
    EditFieldChanged(Option<EditField>),
    ValidationChanged(bool),
    SyncStarted { total: usize },
    SyncProgress(SyncProgress),
    /// `remaining` counts rows still dirty after reconciliation
    SyncFinished { remaining: usize },
    SaveRequested,
}
