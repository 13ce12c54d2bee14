//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use qtop::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{QtopError, Result};

// Backend boundary
pub use crate::source::model::{
    DataSnapshot, JobInfo, OverviewStats, ProcessInfo, QueueInfo, WorkerInfo,
};
pub use crate::source::{
    ActionError, FetchError, JobActionService, JobSet, MonitoringDataSource,
};

// Dashboard
pub use crate::tui::cache::{ConnectionStatus, DataCache};
pub use crate::tui::event_loop::Dashboard;
pub use crate::tui::view::{View, ViewportState};
