//! Frame composition.
//!
//! `render` turns one data snapshot plus the per-view viewport state into
//! exactly `height` lines of exactly `width` visible columns each. That
//! exact-size contract is what lets the event loop overwrite lines in
//! place without ever clearing the screen, which is what keeps redraw
//! flicker-free.
//!
//! Layout, top to bottom: header bar, view body, status-message line,
//! key-binding footer.

#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use std::time::Instant;

use chrono::{DateTime, Local, Utc};
use colored::Colorize;

use crate::source::model::{DataSnapshot, JobInfo, ProcessInfo, QueueInfo, WorkerInfo};
use crate::tui::cache::ConnectionStatus;
use crate::tui::status::StatusMessage;
use crate::tui::text::{pad_to_width, truncate, visible_len};
use crate::tui::view::{View, ViewportState};

/// One row of a detail table: the plain text (reversed wholesale when the
/// row is selected) and the colored variant used otherwise.
struct Row {
    plain: String,
    styled: String,
}

impl Row {
    fn uncolored(plain: String) -> Self {
        Self {
            styled: plain.clone(),
            plain,
        }
    }
}

/// Everything the renderer needs for one frame.
pub struct FrameInput<'a> {
    pub snapshot: Option<&'a DataSnapshot>,
    pub status: ConnectionStatus,
    pub message: Option<&'a StatusMessage>,
    pub width: usize,
    pub height: usize,
    pub now: Instant,
}

/// Compose a full frame for the current view.
///
/// Always returns exactly `height` lines of exactly `width` visible
/// columns. Clamps the current view's viewport against the data actually
/// drawn, so offsets stay valid as list sizes change between polls.
pub fn render(viewports: &mut ViewportState, input: &FrameInput<'_>) -> Vec<String> {
    let (width, height) = (input.width, input.height);
    let mut lines = Vec::with_capacity(height);
    if height == 0 {
        return lines;
    }
    lines.push(header_line(viewports.current(), input));

    let body_rows = height.saturating_sub(3);
    let mut body = match input.snapshot {
        None => {
            let mut waiting = vec![String::new(); body_rows];
            if body_rows > 1 {
                waiting[1] = format!("  Waiting for data ({})…", input.status.label());
            }
            waiting
        }
        Some(snapshot) => render_body(viewports, snapshot, width, body_rows),
    };
    body.resize(body_rows, String::new());
    for line in body {
        lines.push(pad_to_width(&line, width));
    }

    if height > 2 {
        lines.push(message_line(input));
    }
    if height > 1 {
        lines.push(footer_line(viewports.current(), width));
    }
    lines.truncate(height);
    while lines.len() < height {
        lines.push(" ".repeat(width));
    }
    lines
}

fn header_line(view: View, input: &FrameInput<'_>) -> String {
    let status = match input.status {
        ConnectionStatus::Connected => input.status.label().green(),
        ConnectionStatus::Error => input.status.label().red(),
        _ => input.status.label().yellow(),
    };
    let clock = Local::now().format("%H:%M:%S");
    let left = format!(" qtop │ {}", view.title()).bold().cyan().to_string();
    let right = format!("{status} │ {clock} ");
    let gap = input
        .width
        .saturating_sub(visible_len(&left) + visible_len(&right));
    pad_to_width(&format!("{left}{}{right}", " ".repeat(gap)), input.width)
}

fn message_line(input: &FrameInput<'_>) -> String {
    let text = input
        .message
        .filter(|m| m.visible(input.now))
        .map(|m| format!(" {}", m.text()).yellow().to_string())
        .unwrap_or_default();
    pad_to_width(&text, input.width)
}

fn footer_line(view: View, width: usize) -> String {
    let hints = match view {
        View::Queues => {
            " m:main q/p/w/r/s/d:views  ↑↓:move  ⏎:open queue  Esc:back  ^C:quit"
        }
        View::Processes => {
            " m:main q/p/w/r/s/d:views  ↑↓:select  ^Q:quiet  ^K:stop  Esc:back  ^C:quit"
        }
        View::Retries | View::Dead => {
            " m:main q/p/w/r/s/d:views  ↑↓:select  ^R:retry  ^X:delete  M-r/M-x:all  ^C:quit"
        }
        View::QueueJobs => " ↑↓:select  ^X:delete  Esc:back to queues  ^C:quit",
        _ => " m:main q/p/w/r/s/d:views  ←→:switch  ↑↓:move  PgUp/PgDn:page  Esc:back  ^C:quit",
    };
    pad_to_width(&truncate(hints, width).dimmed().to_string(), width)
}

fn render_body(
    viewports: &mut ViewportState,
    snapshot: &DataSnapshot,
    width: usize,
    body_rows: usize,
) -> Vec<String> {
    match viewports.current() {
        View::Main => {
            // The summary has no scrollable list of its own.
            viewports.clamp(0, body_rows);
            render_main(snapshot, width, body_rows)
        }
        view => {
            let (headings, rows) = match view {
                View::Queues => queue_table(snapshot, width),
                View::Processes => process_table(snapshot, width),
                View::Workers => worker_table(snapshot, width),
                View::Retries => job_table(&snapshot.retries, width, true),
                View::Scheduled => job_table(&snapshot.scheduled, width, false),
                View::Dead => job_table(&snapshot.dead, width, true),
                View::QueueJobs | View::Main => {
                    let jobs = snapshot
                        .queue_jobs
                        .as_ref()
                        .map(|qj| qj.jobs.as_slice())
                        .unwrap_or_default();
                    job_table(jobs, width, false)
                }
            };
            render_table(viewports, headings, rows, width, body_rows)
        }
    }
}

/// Generic scrollable table: headings, clamped window of rows, trailing
/// `N more` indicator when the data runs past the window.
fn render_table(
    viewports: &mut ViewportState,
    headings: String,
    rows: Vec<Row>,
    width: usize,
    body_rows: usize,
) -> Vec<String> {
    let mut out = Vec::with_capacity(body_rows);
    if body_rows == 0 {
        return out;
    }
    out.push(headings.bold().to_string());

    let table_rows = body_rows - 1;
    let mut visible = table_rows;
    if rows.len() > table_rows {
        // One row is given up for the `N more` indicator.
        visible = table_rows.saturating_sub(1);
    }
    viewports.clamp(rows.len(), visible);
    let entry = viewports.entry();
    let selectable = viewports.current().selectable();

    let end = (entry.scroll_offset + visible).min(rows.len());
    for (i, row) in rows[entry.scroll_offset..end].iter().enumerate() {
        let index = entry.scroll_offset + i;
        if selectable && index == entry.selected_index {
            out.push(pad_to_width(&row.plain, width).reversed().to_string());
        } else {
            out.push(row.styled.clone());
        }
    }
    if rows.is_empty() && table_rows > 0 {
        out.push("  (empty)".dimmed().to_string());
    }
    if end < rows.len() {
        out.push(
            format!("  … {} more", rows.len() - end)
                .dimmed()
                .to_string(),
        );
    }
    out
}

// ──────────────────── main (summary) view ────────────────────

fn render_main(snapshot: &DataSnapshot, width: usize, body_rows: usize) -> Vec<String> {
    let mut out = Vec::with_capacity(body_rows);
    let o = &snapshot.overview;
    out.push(String::new());
    out.push(format!(
        "  Processed {:<14} Failed {:<12} Enqueued {:<12}",
        group_digits(o.processed),
        group_digits(o.failed),
        group_digits(o.enqueued),
    ));
    out.push(format!(
        "  Scheduled {:<14} Retries {:<11} Dead {:<8} Latency {:.1}s",
        group_digits(o.scheduled),
        group_digits(o.retries),
        group_digits(o.dead),
        o.latency_secs,
    ));
    let (busy, total) = snapshot.utilization();
    out.push(format!("  Busy {busy}/{total} {}", utilization_bar(busy, total, 24)));
    out.push(String::new());

    // Processes and workers share whatever is left below the counters.
    // Two heading lines come out of the remainder first.
    let remaining = body_rows.saturating_sub(out.len() + 2);
    let (proc_rows, worker_rows) =
        split_rows(remaining, snapshot.processes.len(), snapshot.workers.len());

    out.push(
        format!("  Processes ({})", snapshot.processes.len())
            .bold()
            .to_string(),
    );
    push_section(
        &mut out,
        snapshot.processes.iter().map(|p| process_row(p, width).styled),
        snapshot.processes.len(),
        proc_rows,
    );
    out.push(
        format!("  Workers ({})", snapshot.workers.len())
            .bold()
            .to_string(),
    );
    push_section(
        &mut out,
        snapshot.workers.iter().map(|w| worker_row(w, width).styled),
        snapshot.workers.len(),
        worker_rows,
    );
    out.truncate(body_rows);
    out
}

fn push_section(
    out: &mut Vec<String>,
    rows: impl Iterator<Item = String>,
    total: usize,
    budget: usize,
) {
    let shown = if total > budget {
        budget.saturating_sub(1)
    } else {
        total
    };
    out.extend(rows.take(shown));
    if total > shown {
        out.push(format!("  … {} more", total - shown).dimmed().to_string());
    }
}

/// Split `available` rows between two lists. Both fit: give each exactly
/// what it needs. Otherwise split proportionally to list size with a
/// floor of 3 rows per non-empty section, clamped to what is available.
fn split_rows(available: usize, a: usize, b: usize) -> (usize, usize) {
    if a + b <= available {
        return (a, b);
    }
    const FLOOR: usize = 3;
    let total = a + b;
    let mut share_a = (available * a + total / 2) / total;
    share_a = share_a.max(FLOOR.min(a)).min(available);
    let floor_b = FLOOR.min(b);
    if available.saturating_sub(share_a) < floor_b {
        share_a = available.saturating_sub(floor_b);
    }
    (share_a, available - share_a)
}

fn utilization_bar(busy: u64, total: u64, bar_width: usize) -> String {
    let ratio = if total == 0 {
        0.0
    } else {
        busy as f64 / total as f64
    };
    let filled = ((ratio * bar_width as f64).round() as usize).min(bar_width);
    let bar = format!(
        "[{}{}] {:.0}%",
        "█".repeat(filled),
        "░".repeat(bar_width - filled),
        ratio * 100.0
    );
    if ratio >= 0.9 {
        bar.red().to_string()
    } else if ratio >= 0.7 {
        bar.yellow().to_string()
    } else {
        bar.green().to_string()
    }
}

fn group_digits(n: u64) -> String {
    let raw = n.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ──────────────────── per-entity tables ────────────────────

fn queue_table(snapshot: &DataSnapshot, width: usize) -> (String, Vec<Row>) {
    let name_w = name_column(width, 34);
    let headings = format!("  {:<name_w$}  {:>8}  {:>9}  {}", "QUEUE", "SIZE", "LATENCY", "STATE");
    let rows = snapshot
        .queues
        .iter()
        .map(|q| queue_row(q, name_w))
        .collect();
    (headings, rows)
}

fn queue_row(q: &QueueInfo, name_w: usize) -> Row {
    let plain = format!(
        "  {:<name_w$}  {:>8}  {:>8.2}s  {}",
        truncate(&q.name, name_w),
        group_digits(q.size),
        q.latency_secs,
        if q.paused { "paused" } else { "active" },
    );
    let styled = if q.paused {
        let state = "paused".yellow().to_string();
        format!(
            "  {:<name_w$}  {:>8}  {:>8.2}s  {state}",
            truncate(&q.name, name_w),
            group_digits(q.size),
            q.latency_secs,
        )
    } else {
        plain.clone()
    };
    Row { plain, styled }
}

fn process_table(snapshot: &DataSnapshot, width: usize) -> (String, Vec<Row>) {
    let headings = format!("  {:<30}  {:>7}  {:<20}  {}", "IDENTITY", "BUSY", "QUEUES", "STATE");
    let rows = snapshot
        .processes
        .iter()
        .map(|p| process_row(p, width))
        .collect();
    (headings, rows)
}

fn process_row(p: &ProcessInfo, width: usize) -> Row {
    let queues = truncate(&p.queues.join(","), name_column(width, 48)).into_owned();
    let busy = format!("{}/{}", p.busy, p.concurrency);
    let plain = format!(
        "  {:<30}  {:>7}  {:<20}  {}",
        truncate(&p.identity, 30),
        busy,
        queues,
        if p.quiet { "quiet" } else { "" },
    );
    let styled = if p.quiet {
        format!(
            "  {:<30}  {:>7}  {:<20}  {}",
            truncate(&p.identity, 30),
            busy,
            queues,
            "quiet".yellow(),
        )
    } else {
        plain.clone()
    };
    Row { plain, styled }
}

fn worker_table(snapshot: &DataSnapshot, width: usize) -> (String, Vec<Row>) {
    let headings = format!(
        "  {:<26}  {:<8}  {:<10}  {:<20}  {:<8}  {}",
        "PROCESS", "TID", "QUEUE", "CLASS", "ELAPSED", "ARGS"
    );
    let rows = snapshot
        .workers
        .iter()
        .map(|w| worker_row(w, width))
        .collect();
    (headings, rows)
}

fn worker_row(w: &WorkerInfo, width: usize) -> Row {
    let args_w = name_column(width, 82);
    Row::uncolored(format!(
        "  {:<26}  {:<8}  {:<10}  {:<20}  {:<8}  {}",
        truncate(&w.process_identity, 26),
        truncate(&w.thread_id, 8),
        truncate(&w.queue, 10),
        truncate(&w.job_class, 20),
        elapsed_since(w.run_at),
        truncate(&w.job_args, args_w),
    ))
}

fn job_table(jobs: &[JobInfo], width: usize, with_error: bool) -> (String, Vec<Row>) {
    let headings = if with_error {
        format!(
            "  {:<19}  {:>3}  {:<10}  {:<20}  {}",
            "WHEN", "RC", "QUEUE", "CLASS", "ERROR"
        )
    } else {
        format!(
            "  {:<19}  {:<10}  {:<20}  {}",
            "WHEN", "QUEUE", "CLASS", "ARGS"
        )
    };
    let rows = jobs.iter().map(|j| job_row(j, width, with_error)).collect();
    (headings, rows)
}

fn job_row(j: &JobInfo, width: usize, with_error: bool) -> Row {
    let when = j.at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
    if with_error {
        let tail_w = name_column(width, 64);
        let error_class = j.error_class.as_deref().unwrap_or("");
        let error = truncate(
            &format!(
                "{error_class}: {}",
                j.error_message.as_deref().unwrap_or("")
            ),
            tail_w,
        )
        .into_owned();
        let plain = format!(
            "  {when}  {:>3}  {:<10}  {:<20}  {error}",
            j.retry_count,
            truncate(&j.queue, 10),
            truncate(&j.job_class, 20),
        );
        let styled = format!(
            "  {when}  {:>3}  {:<10}  {:<20}  {}",
            j.retry_count,
            truncate(&j.queue, 10),
            truncate(&j.job_class, 20),
            error.red(),
        );
        Row { plain, styled }
    } else {
        let args_w = name_column(width, 60);
        Row::uncolored(format!(
            "  {when}  {:<10}  {:<20}  {}",
            truncate(&j.queue, 10),
            truncate(&j.job_class, 20),
            truncate(&j.args, args_w),
        ))
    }
}

/// Width left for a flexible trailing column after `fixed` columns, with
/// a sane minimum so narrow terminals still show something.
const fn name_column(width: usize, fixed: usize) -> usize {
    let flex = width.saturating_sub(fixed);
    if flex < 8 { 8 } else { flex }
}

fn elapsed_since(at: DateTime<Utc>) -> String {
    let secs = (Utc::now() - at).num_seconds().max(0);
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    }
}
