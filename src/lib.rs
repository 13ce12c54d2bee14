#![forbid(unsafe_code)]

//! qtop — full-screen terminal dashboard for background job-queue
//! backends.
//!
//! Renders a continuously refreshing, navigable view of queues, worker
//! processes, in-flight jobs, and the retry/scheduled/dead sets, while
//! accepting keyboard input for navigation and remote actions. A
//! background thread polls the backend; the foreground thread owns the
//! terminal, so frames never tear and input is never lost mid-refresh.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use qtop::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use qtop::source::demo::DemoBackend;
//! use qtop::tui::event_loop::Dashboard;
//! ```

pub mod prelude;

pub mod core;
pub mod logger;
pub mod source;
pub mod tui;
