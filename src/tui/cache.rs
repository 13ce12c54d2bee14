//! Shared state between the poll thread and the input/render thread.
//!
//! Exactly three things cross the thread boundary: the snapshot cache,
//! the single-flight poll guard, and the current-view cell the poller
//! consults to decide whether queue jobs need fetching. All are either
//! mutex-protected or atomic; there is no nested locking anywhere.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::source::model::{DataSnapshot, JobInfo, QueueJobs};
use crate::tui::view::View;

/// Health of the backend connection, shown in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No fetch has completed yet.
    #[default]
    Connecting,
    /// A fetch is in flight.
    Updating,
    /// Last fetch succeeded.
    Connected,
    /// Last fetch failed; the previous snapshot stays on screen.
    Error,
}

impl ConnectionStatus {
    /// Header label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Updating => "updating",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }
}

#[derive(Default)]
struct CacheInner {
    snapshot: Option<Arc<DataSnapshot>>,
    version: u64,
    status: ConnectionStatus,
}

/// The single current snapshot plus a monotonically increasing version.
///
/// Readers always observe a self-consistent `(snapshot, version)` pair;
/// publishing replaces the snapshot wholesale under the lock.
#[derive(Default)]
pub struct DataCache {
    inner: Mutex<CacheInner>,
    stale: AtomicBool,
}

impl DataCache {
    /// Atomically replace the snapshot and bump the version by one.
    pub fn publish(&self, snapshot: DataSnapshot) {
        let mut inner = self.inner.lock();
        inner.snapshot = Some(Arc::new(snapshot));
        inner.version += 1;
    }

    /// Atomic read of the current snapshot and its version.
    #[must_use]
    pub fn current(&self) -> (Option<Arc<DataSnapshot>>, u64) {
        let inner = self.inner.lock();
        (inner.snapshot.clone(), inner.version)
    }

    /// Current connection status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.inner.lock().status
    }

    /// Update the connection status, bumping the version on change so the
    /// render loop repaints the header.
    pub fn set_status(&self, status: ConnectionStatus) {
        let mut inner = self.inner.lock();
        if inner.status != status {
            inner.status = status;
            inner.version += 1;
        }
    }

    /// Attach a queue-jobs listing fetched outside the poll cycle to the
    /// current snapshot. Other fields keep their identity; the version is
    /// bumped so the merge is picked up even mid-interval.
    pub fn merge_queue_jobs(&self, queue: &str, jobs: Vec<JobInfo>) {
        let mut inner = self.inner.lock();
        let mut snapshot = inner
            .snapshot
            .as_deref()
            .cloned()
            .unwrap_or_default();
        snapshot.queue_jobs = Some(QueueJobs {
            queue: queue.to_string(),
            jobs,
        });
        inner.snapshot = Some(Arc::new(snapshot));
        inner.version += 1;
    }

    /// Force the next render even without a version bump. Set after a
    /// successful mutating action so stale rows repaint immediately.
    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::Release);
    }

    /// Consume the stale flag.
    pub fn take_stale(&self) -> bool {
        self.stale.swap(false, Ordering::AcqRel)
    }
}

/// Single-flight guard: at most one fetch in flight, overlapping attempts
/// are skipped rather than queued. Independent of the version counter.
#[derive(Default)]
pub struct PollGuard {
    in_progress: AtomicBool,
}

impl PollGuard {
    /// Try to claim the in-flight slot. Returns false when a fetch is
    /// already running.
    pub fn try_acquire(&self) -> bool {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the slot after the fetch completes or fails.
    pub fn release(&self) {
        self.in_progress.store(false, Ordering::Release);
    }

    /// Whether a fetch is currently in flight.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }
}

/// Current view (and activated queue name) published by the event loop
/// for the poller, which fetches queue jobs only while the queue-jobs
/// view is open.
#[derive(Default)]
pub struct ViewCell {
    view: AtomicU8,
    queue: Mutex<Option<String>>,
}

impl ViewCell {
    /// Record the view the user is looking at.
    pub fn set(&self, view: View, queue: Option<String>) {
        *self.queue.lock() = queue;
        self.view.store(view as u8, Ordering::Release);
    }

    /// The queue name to fetch jobs for, when the queue-jobs view is open.
    #[must_use]
    pub fn active_queue(&self) -> Option<String> {
        if View::from_index(self.view.load(Ordering::Acquire)) == Some(View::QueueJobs) {
            self.queue.lock().clone()
        } else {
            None
        }
    }
}
