//! Dashboard lifecycle: terminal setup, poller spawn, the input/render
//! loop, and unconditional teardown.
//!
//! Two concurrent activities exist: the poll thread and this loop. They
//! share only the data cache, the single-flight guard, and the view cell.
//! The loop blocks on input with a 100 ms timeout so it also observes
//! cache-version changes, status-message expiry, and the shutdown flag
//! with bounded latency. Whatever way the loop exits — quit key, signal,
//! or terminal failure — the poller gets a bounded join and the terminal
//! is restored by the guard's drop.

#![allow(missing_docs)]

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event};
use crossterm::queue;
use signal_hook::consts::{SIGINT, SIGTERM};

use crate::core::config::Config;
use crate::core::errors::{QtopError, Result};
use crate::logger::jsonl::{EventType, JsonlLogger, LogEntry, Severity};
use crate::source::{JobActionService, MonitoringDataSource};
use crate::tui::cache::{DataCache, PollGuard, ViewCell};
use crate::tui::input::{decode, Dispatcher, Outcome};
use crate::tui::poller::PollScheduler;
use crate::tui::render::{render, FrameInput};
use crate::tui::status::StatusMessage;
use crate::tui::terminal_guard::TerminalGuard;
use crate::tui::view::{View, ViewportState};

/// How long the loop waits for input before checking shared state.
const INPUT_POLL: Duration = Duration::from_millis(100);

/// How long shutdown waits for the poll thread before proceeding with
/// terminal restoration anyway.
const POLLER_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// The external collaborators and settings the dashboard runs against.
pub struct Dashboard {
    pub source: Arc<dyn MonitoringDataSource>,
    pub actions: Arc<dyn JobActionService>,
    pub config: Config,
}

impl Dashboard {
    /// Run the dashboard until the user quits or a signal arrives.
    ///
    /// Cleanup is unconditional: the poller is stopped and the terminal
    /// restored on every exit path, including errors raised mid-loop.
    pub fn run(&self) -> Result<()> {
        // The signal path only flips this atomic; all I/O happens here.
        let shutdown = Arc::new(AtomicBool::new(false));
        for signal in [SIGINT, SIGTERM] {
            signal_hook::flag::register(signal, Arc::clone(&shutdown))
                .map_err(|e| QtopError::terminal("registering signal handler", e))?;
        }

        let mut logger = self.open_logger();
        logger.write(&LogEntry::new(EventType::DashboardStart, Severity::Info));

        let running = Arc::new(AtomicBool::new(true));
        let cache = Arc::new(DataCache::default());
        let poll_guard = Arc::new(PollGuard::default());
        let view_cell = Arc::new(ViewCell::default());
        view_cell.set(View::Main, None);

        let guard = TerminalGuard::new()?;

        let poller = PollScheduler {
            source: Arc::clone(&self.source),
            cache: Arc::clone(&cache),
            guard: Arc::clone(&poll_guard),
            view_cell: Arc::clone(&view_cell),
            running: Arc::clone(&running),
            interval: self.config.refresh_interval(),
            job_limit: self.config.dashboard.job_page_size,
            logger: self.open_logger(),
        }
        .spawn()
        .map_err(|e| QtopError::Runtime {
            details: format!("failed to spawn poll thread: {e}"),
        })?;

        let result = self.run_loop(&cache, &view_cell, &shutdown, &mut logger);

        // Teardown, regardless of how the loop ended.
        running.store(false, Ordering::Relaxed);
        let joined = poller.join_timeout(POLLER_JOIN_TIMEOUT);
        let mut stop = LogEntry::new(EventType::DashboardStop, Severity::Info);
        stop.details = Some(if joined {
            "poller joined".to_string()
        } else {
            "poller join timed out".to_string()
        });
        logger.write(&stop);
        drop(guard);
        result
    }

    fn open_logger(&self) -> JsonlLogger {
        self.config
            .log
            .file
            .as_deref()
            .map_or_else(JsonlLogger::disabled, JsonlLogger::open)
    }

    #[allow(clippy::too_many_lines)]
    fn run_loop(
        &self,
        cache: &Arc<DataCache>,
        view_cell: &Arc<ViewCell>,
        shutdown: &Arc<AtomicBool>,
        logger: &mut JsonlLogger,
    ) -> Result<()> {
        let mut stdout = io::stdout();
        let mut viewports = ViewportState::default();
        let mut message: Option<StatusMessage> = None;
        let mut last_version: Option<u64> = None;
        let mut message_was_visible = false;

        loop {
            if shutdown.load(Ordering::Relaxed) {
                return Ok(());
            }

            let mut force_render = false;
            let has_input = event::poll(INPUT_POLL)
                .map_err(|e| QtopError::terminal("polling input", e))?;
            if has_input {
                match event::read().map_err(|e| QtopError::terminal("reading input", e))? {
                    Event::Key(key) => {
                        if let Some(command) = decode(&key) {
                            let (_, rows) =
                                TerminalGuard::size().unwrap_or((80, 24));
                            let mut dispatcher = Dispatcher {
                                source: self.source.as_ref(),
                                actions: self.actions.as_ref(),
                                cache: cache.as_ref(),
                                view_cell: view_cell.as_ref(),
                                logger,
                                job_limit: self.config.dashboard.job_page_size,
                                page: ViewportState::default_page(rows as usize),
                            };
                            if dispatcher.apply(command, &mut viewports, &mut message)
                                == Outcome::Quit
                            {
                                return Ok(());
                            }
                        }
                        force_render = true;
                    }
                    Event::Resize(_, _) => force_render = true,
                    _ => {}
                }
            }

            let (snapshot, version) = cache.current();
            let now = Instant::now();
            let message_visible = message.as_ref().is_some_and(|m| m.visible(now));
            let version_changed = last_version != Some(version);
            let message_expired = message_was_visible && !message_visible;
            if frame_due(cache, force_render, version_changed, message_expired) {
                let (cols, rows) = TerminalGuard::size()?;
                let frame = FrameInput {
                    snapshot: snapshot.as_deref(),
                    status: cache.status(),
                    message: message.as_ref(),
                    width: cols as usize,
                    height: rows as usize,
                    now,
                };
                let lines = render(&mut viewports, &frame);
                draw(&mut stdout, &lines)
                    .map_err(|e| QtopError::terminal("writing frame", e))?;
                last_version = Some(version);
            }
            message_was_visible = message_visible;
        }
    }
}

/// Decide whether this iteration paints. The stale flag is consumed
/// unconditionally: a render forced by input or a version change covers
/// the same repaint, so leaving the flag set would only buy one
/// redundant frame next iteration.
fn frame_due(
    cache: &DataCache,
    force: bool,
    version_changed: bool,
    message_expired: bool,
) -> bool {
    let stale = cache.take_stale();
    force || version_changed || stale || message_expired
}

/// Overwrite the frame in place: absolute cursor positioning per row, no
/// clear. Every line is already exactly terminal-width, so stale content
/// cannot leak through.
fn draw(stdout: &mut io::Stdout, lines: &[String]) -> io::Result<()> {
    for (row, line) in lines.iter().enumerate() {
        queue!(stdout, MoveTo(0, u16::try_from(row).unwrap_or(u16::MAX)))?;
        stdout.write_all(line.as_bytes())?;
    }
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_due_consumes_the_stale_flag_even_when_forced() {
        let cache = DataCache::default();
        cache.mark_stale();
        assert!(frame_due(&cache, true, false, false));
        assert!(!cache.take_stale(), "stale flag must be consumed");

        cache.mark_stale();
        assert!(frame_due(&cache, false, false, false));
        assert!(!frame_due(&cache, false, false, false));
    }

    #[test]
    fn frame_due_triggers_on_each_reason_alone() {
        let cache = DataCache::default();
        assert!(!frame_due(&cache, false, false, false));
        assert!(frame_due(&cache, true, false, false));
        assert!(frame_due(&cache, false, true, false));
        assert!(frame_due(&cache, false, false, true));
    }
}
