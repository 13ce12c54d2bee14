//! Keyboard decoding and command application.
//!
//! Two stages, both pure enough to unit test: [`decode`] maps one
//! crossterm key event (crossterm performs the raw-byte and ESC-timeout
//! disambiguation while the terminal is in raw mode) to a [`Command`];
//! [`apply`] runs the command against the viewport state, the cache, and
//! the remote action service.
//!
//! Every remote action follows the same guard ladder: ignore the key when
//! it means nothing in the current view; complain via status message when
//! there is no snapshot, the list is empty, the selection is out of
//! range, or the row has no identifier; otherwise call the service and
//! report success or failure as a status message. Nothing propagates.

#![allow(missing_docs)]

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::logger::jsonl::{EventType, JsonlLogger, LogEntry, Severity};
use crate::source::model::DataSnapshot;
use crate::source::{JobActionService, JobSet, MonitoringDataSource};
use crate::tui::cache::{DataCache, ViewCell};
use crate::tui::status::StatusMessage;
use crate::tui::view::{View, ViewportState};

/// A decoded user intention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SwitchView(View),
    PrevView,
    NextView,
    Up,
    Down,
    PageUp,
    PageDown,
    /// Enter: open the row under the cursor (queues view only).
    Activate,
    /// Escape: back out one level.
    Back,
    RetrySelected,
    DeleteSelected,
    RetryAll,
    DeleteAll,
    QuietProcess,
    StopProcess,
    Quit,
}

/// Whether the event loop keeps running after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

/// Map a key event to a command. Returns `None` for keys with no binding
/// and for release/repeat artifacts.
#[must_use]
pub fn decode(key: &KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    match key.code {
        KeyCode::Char(c) if ctrl => match c.to_ascii_lowercase() {
            'c' => Some(Command::Quit),
            'r' => Some(Command::RetrySelected),
            'x' => Some(Command::DeleteSelected),
            'q' => Some(Command::QuietProcess),
            'k' => Some(Command::StopProcess),
            _ => None,
        },
        KeyCode::Char(c) if alt => match c.to_ascii_lowercase() {
            'r' => Some(Command::RetryAll),
            'x' => Some(Command::DeleteAll),
            _ => None,
        },
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'm' => Some(Command::SwitchView(View::Main)),
            'q' => Some(Command::SwitchView(View::Queues)),
            'p' => Some(Command::SwitchView(View::Processes)),
            'w' => Some(Command::SwitchView(View::Workers)),
            'r' => Some(Command::SwitchView(View::Retries)),
            's' => Some(Command::SwitchView(View::Scheduled)),
            'd' => Some(Command::SwitchView(View::Dead)),
            _ => None,
        },
        KeyCode::Up => Some(Command::Up),
        KeyCode::Down => Some(Command::Down),
        KeyCode::Left => Some(Command::PrevView),
        KeyCode::Right => Some(Command::NextView),
        KeyCode::PageUp => Some(Command::PageUp),
        KeyCode::PageDown => Some(Command::PageDown),
        KeyCode::Enter => Some(Command::Activate),
        KeyCode::Esc => Some(Command::Back),
        _ => None,
    }
}

/// The six remote actions, narrowed from [`Command`] so execution can
/// match exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    RetrySelected,
    DeleteSelected,
    RetryAll,
    DeleteAll,
    Quiet,
    Stop,
}

impl Action {
    const fn of(command: Command) -> Option<Self> {
        match command {
            Command::RetrySelected => Some(Self::RetrySelected),
            Command::DeleteSelected => Some(Self::DeleteSelected),
            Command::RetryAll => Some(Self::RetryAll),
            Command::DeleteAll => Some(Self::DeleteAll),
            Command::QuietProcess => Some(Self::Quiet),
            Command::StopProcess => Some(Self::Stop),
            _ => None,
        }
    }

    /// Views in which the action is meaningful. Elsewhere the key is
    /// silently ignored.
    const fn valid_in(self, view: View) -> bool {
        match self {
            Self::RetrySelected | Self::RetryAll | Self::DeleteAll => {
                matches!(view, View::Retries | View::Dead)
            }
            Self::DeleteSelected => {
                matches!(view, View::Retries | View::Dead | View::QueueJobs)
            }
            Self::Quiet | Self::Stop => matches!(view, View::Processes),
        }
    }

    /// Name recorded in the event log.
    const fn name(self) -> &'static str {
        match self {
            Self::RetrySelected => "retry_job",
            Self::DeleteSelected => "delete_job",
            Self::RetryAll => "retry_all",
            Self::DeleteAll => "delete_all",
            Self::Quiet => "quiet_process",
            Self::Stop => "stop_process",
        }
    }
}

/// Shared handles a command application needs.
pub struct Dispatcher<'a> {
    pub source: &'a dyn MonitoringDataSource,
    pub actions: &'a dyn JobActionService,
    pub cache: &'a DataCache,
    pub view_cell: &'a ViewCell,
    pub logger: &'a mut JsonlLogger,
    /// Limit for the out-of-band queue-jobs fetch on row activation.
    pub job_limit: usize,
    /// Page size for PageUp/PageDown, derived from the terminal height.
    pub page: usize,
}

impl Dispatcher<'_> {
    /// Apply one command. `message` is replaced whenever the command has
    /// something to report.
    pub fn apply(
        &mut self,
        command: Command,
        viewports: &mut ViewportState,
        message: &mut Option<StatusMessage>,
    ) -> Outcome {
        match command {
            Command::Quit => return Outcome::Quit,
            Command::SwitchView(view) => self.switch(viewports, view),
            Command::PrevView => self.switch(viewports, viewports.current().prev()),
            Command::NextView => self.switch(viewports, viewports.current().next()),
            Command::Back => {
                let target = if viewports.current() == View::QueueJobs {
                    View::Queues
                } else {
                    View::Main
                };
                self.switch(viewports, target);
            }
            Command::Up => viewports.select_up(),
            Command::Down => viewports.select_down(),
            Command::PageUp => viewports.page_up(self.page),
            Command::PageDown => viewports.page_down(self.page),
            Command::Activate => self.activate_queue(viewports, message),
            Command::RetrySelected
            | Command::DeleteSelected
            | Command::RetryAll
            | Command::DeleteAll
            | Command::QuietProcess
            | Command::StopProcess => self.run_action(command, viewports, message),
        }
        Outcome::Continue
    }

    fn switch(&self, viewports: &mut ViewportState, view: View) {
        viewports.set_current(view);
        self.view_cell.set(view, None);
    }

    /// Enter on the queues view: fetch the top visible queue's pending
    /// jobs, merge them into the cache, and open the queue-jobs view.
    fn activate_queue(&mut self, viewports: &mut ViewportState, message: &mut Option<StatusMessage>) {
        if viewports.current() != View::Queues {
            return;
        }
        let Some(snapshot) = self.snapshot_or_report(message) else {
            return;
        };
        if snapshot.queues.is_empty() {
            *message = Some(StatusMessage::new("No queues"));
            return;
        }
        let index = viewports.entry().scroll_offset.min(snapshot.queues.len() - 1);
        let queue = snapshot.queues[index].name.clone();
        match self.source.queue_jobs(&queue, self.job_limit) {
            Ok(jobs) => {
                self.cache.merge_queue_jobs(&queue, jobs);
                viewports.set_current(View::QueueJobs);
                self.view_cell.set(View::QueueJobs, Some(queue));
            }
            Err(e) => {
                *message = Some(StatusMessage::new(format!("Fetch failed: {e}")));
            }
        }
    }

    fn run_action(
        &mut self,
        command: Command,
        viewports: &mut ViewportState,
        message: &mut Option<StatusMessage>,
    ) {
        let Some(action) = Action::of(command) else {
            return;
        };
        let view = viewports.current();
        // Ignore keys that mean nothing here; only reachable combinations
        // get as far as the data guards.
        if !action.valid_in(view) {
            return;
        }
        let Some(snapshot) = self.snapshot_or_report(message) else {
            return;
        };
        let report = self.execute(action, view, viewports, &snapshot);
        match report {
            Ok(success) => {
                self.cache.mark_stale();
                self.logger.write(
                    &LogEntry::new(EventType::ActionComplete, Severity::Info)
                        .action(action.name())
                        .target(success.clone()),
                );
                *message = Some(StatusMessage::new(success));
            }
            Err(failure) => {
                self.logger.write(
                    &LogEntry::new(EventType::ActionFailed, Severity::Warning)
                        .action(action.name())
                        .error_message(failure.clone()),
                );
                *message = Some(StatusMessage::new(failure));
            }
        }
    }

    /// Run one guarded action. `Ok` carries the success message, `Err`
    /// the complaint to display; both end up as status messages.
    fn execute(
        &self,
        action: Action,
        view: View,
        viewports: &ViewportState,
        snapshot: &DataSnapshot,
    ) -> std::result::Result<String, String> {
        let set = match view {
            View::Dead => JobSet::Dead,
            _ => JobSet::Retries,
        };
        match action {
            Action::RetryAll => {
                let jobs = job_list(snapshot, view);
                if jobs.is_empty() {
                    return Err("No jobs to retry".to_string());
                }
                self.actions
                    .retry_all(set)
                    .map_err(|e| format!("Retry all failed: {e}"))?;
                Ok(format!("Requested retry of all {set} jobs"))
            }
            Action::DeleteAll => {
                let jobs = job_list(snapshot, view);
                if jobs.is_empty() {
                    return Err("No jobs to delete".to_string());
                }
                self.actions
                    .delete_all(set)
                    .map_err(|e| format!("Delete all failed: {e}"))?;
                Ok(format!("Deleted all {set} jobs"))
            }
            Action::RetrySelected => {
                let id = self.selected_job_id(snapshot, view, viewports, "retry")?;
                self.actions
                    .retry_job(&id, set)
                    .map_err(|e| format!("Retry failed: {e}"))?;
                Ok(format!("Retried job {id}"))
            }
            Action::DeleteSelected => {
                if view == View::QueueJobs {
                    let (queue, id) = self.selected_queue_job(snapshot, viewports)?;
                    self.actions
                        .delete_queue_job(&queue, &id)
                        .map_err(|e| format!("Delete failed: {e}"))?;
                    return Ok(format!("Deleted job {id} from {queue}"));
                }
                let id = self.selected_job_id(snapshot, view, viewports, "delete")?;
                self.actions
                    .delete_job(&id, set)
                    .map_err(|e| format!("Delete failed: {e}"))?;
                Ok(format!("Deleted job {id}"))
            }
            Action::Quiet | Action::Stop => {
                if snapshot.processes.is_empty() {
                    return Err("No processes".to_string());
                }
                let index = viewports.entry_for(View::Processes).selected_index;
                let process = snapshot
                    .processes
                    .get(index)
                    .ok_or_else(|| "Selection out of range".to_string())?;
                let identity = process.identity.clone();
                if action == Action::Quiet {
                    self.actions
                        .quiet_process(&identity)
                        .map_err(|e| format!("Quiet failed: {e}"))?;
                    Ok(format!("Quieted {identity}"))
                } else {
                    self.actions
                        .stop_process(&identity)
                        .map_err(|e| format!("Stop failed: {e}"))?;
                    Ok(format!("Stopped {identity}"))
                }
            }
        }
    }

    fn selected_job_id(
        &self,
        snapshot: &DataSnapshot,
        view: View,
        viewports: &ViewportState,
        verb: &str,
    ) -> std::result::Result<String, String> {
        let jobs = job_list(snapshot, view);
        if jobs.is_empty() {
            return Err(format!("No jobs to {verb}"));
        }
        let index = viewports.entry_for(view).selected_index;
        let job = jobs
            .get(index)
            .ok_or_else(|| "Selection out of range".to_string())?;
        job.id
            .clone()
            .ok_or_else(|| "Job has no id".to_string())
    }

    fn selected_queue_job(
        &self,
        snapshot: &DataSnapshot,
        viewports: &ViewportState,
    ) -> std::result::Result<(String, String), String> {
        let listing = snapshot
            .queue_jobs
            .as_ref()
            .ok_or_else(|| "No jobs to delete".to_string())?;
        if listing.jobs.is_empty() {
            return Err("No jobs to delete".to_string());
        }
        let index = viewports.entry_for(View::QueueJobs).selected_index;
        let job = listing
            .jobs
            .get(index)
            .ok_or_else(|| "Selection out of range".to_string())?;
        let id = job.id.clone().ok_or_else(|| "Job has no id".to_string())?;
        Ok((listing.queue.clone(), id))
    }

    fn snapshot_or_report(
        &self,
        message: &mut Option<StatusMessage>,
    ) -> Option<std::sync::Arc<DataSnapshot>> {
        let (snapshot, _) = self.cache.current();
        if snapshot.is_none() {
            *message = Some(StatusMessage::new("No data yet"));
        }
        snapshot
    }
}

fn job_list<'a>(snapshot: &'a DataSnapshot, view: View) -> &'a [crate::source::model::JobInfo] {
    match view {
        View::Retries => &snapshot.retries,
        View::Dead => &snapshot.dead,
        View::Scheduled => &snapshot.scheduled,
        _ => &[],
    }
}
