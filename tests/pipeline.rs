//! End-to-end pipeline tests over the simulated backend: poll → cache →
//! dispatch → render, without a real terminal.

use std::sync::Arc;
use std::time::Instant;

use qtop::logger::jsonl::JsonlLogger;
use qtop::prelude::*;
use qtop::source::demo::DemoBackend;
use qtop::tui::cache::{PollGuard, ViewCell};
use qtop::tui::input::{decode, Command, Dispatcher, Outcome};
use qtop::tui::poller::fetch_snapshot;
use qtop::tui::render::{render, FrameInput};
use qtop::tui::status::StatusMessage;
use qtop::tui::text::visible_len;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

struct Harness {
    backend: Arc<DemoBackend>,
    cache: Arc<DataCache>,
    view_cell: Arc<ViewCell>,
    logger: JsonlLogger,
    viewports: ViewportState,
    message: Option<StatusMessage>,
}

impl Harness {
    fn new() -> Self {
        Self {
            backend: Arc::new(DemoBackend::new()),
            cache: Arc::new(DataCache::default()),
            view_cell: Arc::new(ViewCell::default()),
            logger: JsonlLogger::disabled(),
            viewports: ViewportState::default(),
            message: None,
        }
    }

    fn poll(&self) {
        let snapshot =
            fetch_snapshot(self.backend.as_ref(), 50, self.view_cell.active_queue()).unwrap();
        self.cache.publish(snapshot);
    }

    fn press(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Outcome {
        let command = decode(&KeyEvent::new(code, modifiers)).expect("bound key");
        self.dispatch(command)
    }

    fn dispatch(&mut self, command: Command) -> Outcome {
        let mut dispatcher = Dispatcher {
            source: self.backend.as_ref(),
            actions: self.backend.as_ref(),
            cache: &self.cache,
            view_cell: &self.view_cell,
            logger: &mut self.logger,
            job_limit: 50,
            page: 16,
        };
        dispatcher.apply(command, &mut self.viewports, &mut self.message)
    }

    fn frame(&mut self, width: usize, height: usize) -> Vec<String> {
        let (snapshot, _) = self.cache.current();
        let input = FrameInput {
            snapshot: snapshot.as_deref(),
            status: self.cache.status(),
            message: self.message.as_ref(),
            width,
            height,
            now: Instant::now(),
        };
        render(&mut self.viewports, &input)
    }
}

#[test]
fn every_key_bound_view_renders_exactly_sized_frames() {
    let mut h = Harness::new();
    h.poll();
    for code in ['m', 'q', 'p', 'w', 'r', 's', 'd'] {
        h.press(KeyCode::Char(code), KeyModifiers::NONE);
        let lines = h.frame(80, 24);
        assert_eq!(lines.len(), 24);
        for line in &lines {
            assert_eq!(visible_len(line), 80);
        }
    }
}

#[test]
fn queue_activation_round_trip() {
    let mut h = Harness::new();
    h.poll();
    h.press(KeyCode::Char('q'), KeyModifiers::NONE);
    assert_eq!(h.viewports.current(), View::Queues);

    // Enter on the top row ("default" in the demo world).
    h.press(KeyCode::Enter, KeyModifiers::NONE);
    assert_eq!(h.viewports.current(), View::QueueJobs);
    let (snapshot, _) = h.cache.current();
    assert_eq!(
        snapshot.unwrap().queue_jobs.as_ref().unwrap().queue,
        "default"
    );
    assert_eq!(h.view_cell.active_queue(), Some("default".to_string()));

    // While the view is open, polls keep fetching the listing.
    h.poll();
    let (snapshot, _) = h.cache.current();
    assert!(snapshot.unwrap().queue_jobs.is_some());

    // Escape backs out; the next poll drops the listing from the snapshot.
    h.press(KeyCode::Esc, KeyModifiers::NONE);
    assert_eq!(h.viewports.current(), View::Queues);
    h.poll();
    let (snapshot, _) = h.cache.current();
    assert!(snapshot.unwrap().queue_jobs.is_none());
}

#[test]
fn retry_flow_updates_backend_and_reports() {
    let mut h = Harness::new();
    h.poll();
    h.press(KeyCode::Char('r'), KeyModifiers::NONE);
    let before = h.backend.retry_jobs(50).unwrap().len();
    assert!(before > 0);

    h.press(KeyCode::Char('r'), KeyModifiers::CONTROL);
    assert!(h
        .message
        .as_ref()
        .unwrap()
        .text()
        .starts_with("Retried job "));
    assert_eq!(h.backend.retry_jobs(50).unwrap().len(), before - 1);
    assert!(h.cache.take_stale());
}

#[test]
fn empty_retry_set_never_reaches_the_service() {
    let mut h = Harness::new();
    h.backend.delete_all(JobSet::Retries).unwrap();
    h.poll();
    h.press(KeyCode::Char('r'), KeyModifiers::NONE);
    h.press(KeyCode::Char('r'), KeyModifiers::CONTROL);
    assert_eq!(h.message.as_ref().unwrap().text(), "No jobs to retry");
}

#[test]
fn selection_survives_view_switches_and_shrinking_data() {
    let mut h = Harness::new();
    h.poll();
    h.press(KeyCode::Char('d'), KeyModifiers::NONE);
    h.press(KeyCode::Down, KeyModifiers::NONE);
    h.press(KeyCode::Down, KeyModifiers::NONE);
    h.press(KeyCode::Char('m'), KeyModifiers::NONE);
    h.press(KeyCode::Char('d'), KeyModifiers::NONE);
    assert_eq!(h.viewports.entry().selected_index, 2);

    // Clear the set; the next render clamps the stranded selection.
    h.backend.delete_all(JobSet::Dead).unwrap();
    h.poll();
    let _ = h.frame(80, 24);
    assert_eq!(h.viewports.entry().selected_index, 0);
}

#[test]
fn single_flight_guard_under_contention() {
    let guard = Arc::new(PollGuard::default());
    let mut acquired = 0;
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let guard = Arc::clone(&guard);
            std::thread::spawn(move || usize::from(guard.try_acquire()))
        })
        .collect();
    for handle in handles {
        acquired += handle.join().unwrap();
    }
    assert_eq!(acquired, 1, "exactly one concurrent acquire may win");
}

#[test]
fn status_message_lifecycle_in_frames() {
    let mut h = Harness::new();
    h.poll();
    h.press(KeyCode::Char('r'), KeyModifiers::NONE);
    h.press(KeyCode::Char('r'), KeyModifiers::CONTROL);
    let lines = h.frame(100, 24);
    let wanted = h.message.as_ref().unwrap().text().to_string();
    assert!(lines.iter().any(|l| l.contains(&wanted)));
}
