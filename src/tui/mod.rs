//! The terminal dashboard: rendering, pagination, input, and the
//! two-thread refresh model.
//!
//! Data flow: [`poller`] → [`cache`] → (the event loop watches the
//! version) → [`render`] → screen. Input flows the other way:
//! [`input`] mutates [`view`] state or calls the remote action service,
//! then forces a repaint.

pub mod cache;
pub mod event_loop;
pub mod input;
pub mod poller;
pub mod render;
pub mod status;
pub mod terminal_guard;
pub mod text;
pub mod view;
