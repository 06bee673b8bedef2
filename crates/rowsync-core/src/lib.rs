//! rowsync core - Row-edit state machine for editable data grids
//!
//! This crate holds the synchronous part of the grid and does no I/O. It
//! defines:
//!
//! - `GridState` - Row collection, edit cursor and aggregate flags
//! - `SyncAction` - Per-row change lattice
//! - `Column` / `Editor` - Column descriptors and field editors
//! - `Validator` - Declarative field checks
//! - `reconcile` - Merging sync results back into the rows
//! - Common types like `Value`, `Record`, `DataQuery`, etc.

mod column;
mod config;
mod cursor;
mod error;
mod events;
mod grid_state;
mod model;
mod query;
mod row;
pub mod sync;
mod types;
pub mod validation;

pub use column::*;
pub use config::*;
pub use cursor::*;
pub use error::*;
pub use events::*;
pub use grid_state::{GridState, MAX_PENDING_EVENTS};
pub use model::*;
pub use query::*;
pub use row::*;
pub use sync::{ReconcileSummary, SyncChange, SyncProgress, SyncResult};
pub use types::*;
pub use validation::{Check, FieldError, Validator, validate_model};
