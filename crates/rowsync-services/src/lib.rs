//! rowsync services - Async controller for editable data grids
//!
//! This crate sits between a host UI and the synchronous state machine in
//! `rowsync-core`. It loads pages from a data source, forwards edits to the
//! grid state and pushes dirty rows to a sync backend.
//!
//! # Architecture
//!
//! ```text
//! Host UI
//!     ↓
//! GridController (rowsync-services) ← This crate
//!     ↓                    ↓
//! GridState (core)   DataSource / SyncBackend (host-provided)
//! ```
//!
//! # Design Principles
//!
//! 1. **No lock across await** - Edits stay responsive while a sync runs
//! 2. **Events, not polling** - Hosts `subscribe()` to state changes
//! 3. **Failures are data** - Rejected rows stay dirty and keep their edits

mod data_source;
mod error;
mod grid_controller;
pub mod logging;
mod sync_backend;

pub use data_source::DataSource;
pub use error::{ServiceError, ServiceResult};
pub use grid_controller::GridController;
pub use sync_backend::{ProgressReporter, SyncBackend};
