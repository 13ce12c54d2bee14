//! Background poll scheduler.
//!
//! One OS thread pulls full snapshots from the backend at the configured
//! interval and publishes them into the cache. Fetch failures are never
//! fatal: the status flips to `Error`, the last good snapshot stays
//! published, and the next cycle retries. Only the shared running flag
//! stops the loop.

#![allow(missing_docs)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::logger::jsonl::{EventType, JsonlLogger, LogEntry, Severity};
use crate::source::model::{DataSnapshot, QueueJobs};
use crate::source::{FetchError, MonitoringDataSource};
use crate::tui::cache::{ConnectionStatus, DataCache, PollGuard, ViewCell};

/// Sleep slice so a running-flag flip is observed within ~100 ms instead
/// of a full refresh interval.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Everything the poll thread needs, bundled for the spawn call.
pub struct PollScheduler {
    pub source: Arc<dyn MonitoringDataSource>,
    pub cache: Arc<DataCache>,
    pub guard: Arc<PollGuard>,
    pub view_cell: Arc<ViewCell>,
    pub running: Arc<AtomicBool>,
    pub interval: Duration,
    pub job_limit: usize,
    pub logger: JsonlLogger,
}

/// Handle for the spawned poll thread with a bounded join.
pub struct PollerHandle {
    join: JoinHandle<()>,
    done_rx: Receiver<()>,
}

impl PollerHandle {
    /// Wait up to `timeout` for the poller to observe the flipped running
    /// flag and exit. Returns false on timeout; the caller proceeds with
    /// terminal restoration either way and the thread dies with the
    /// process.
    pub fn join_timeout(self, timeout: Duration) -> bool {
        if self.done_rx.recv_timeout(timeout).is_ok() {
            let _ = self.join.join();
            true
        } else {
            false
        }
    }
}

impl PollScheduler {
    /// Start the poll thread. The first cycle runs immediately.
    pub fn spawn(self) -> std::io::Result<PollerHandle> {
        let (done_tx, done_rx) = bounded(1);
        let join = thread::Builder::new()
            .name("qtop-poller".to_string())
            .spawn(move || self.run(&done_tx))?;
        Ok(PollerHandle { join, done_rx })
    }

    fn run(mut self, done_tx: &Sender<()>) {
        while self.running.load(Ordering::Relaxed) {
            self.poll_once();
            self.sleep_sliced();
        }
        let _ = done_tx.try_send(());
    }

    /// One guarded fetch/publish cycle.
    fn poll_once(&mut self) {
        // Skip the cycle entirely when a fetch is already in flight.
        if !self.guard.try_acquire() {
            return;
        }
        self.cache.set_status(ConnectionStatus::Updating);
        let started = Instant::now();
        let fetched = fetch_snapshot(
            self.source.as_ref(),
            self.job_limit,
            self.view_cell.active_queue(),
        );
        match fetched {
            Ok(snapshot) => {
                self.cache.publish(snapshot);
                self.cache.set_status(ConnectionStatus::Connected);
                let (_, version) = self.cache.current();
                let mut entry = LogEntry::new(EventType::PollComplete, Severity::Info)
                    .version(version);
                entry.duration_ms =
                    Some(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX));
                self.logger.write(&entry);
            }
            Err(e) => {
                self.cache.set_status(ConnectionStatus::Error);
                self.logger.write(
                    &LogEntry::new(EventType::PollFailed, Severity::Error)
                        .error_message(e.to_string()),
                );
            }
        }
        self.guard.release();
    }

    fn sleep_sliced(&self) {
        let deadline = Instant::now() + self.interval;
        while self.running.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }
}

/// Pull one complete snapshot from the backend.
///
/// The queue-jobs listing is included only while that view is active;
/// any single failed call fails the whole cycle (partial snapshots are
/// never published).
pub fn fetch_snapshot(
    source: &dyn MonitoringDataSource,
    job_limit: usize,
    active_queue: Option<String>,
) -> Result<DataSnapshot, FetchError> {
    let overview = source.overview()?;
    let queues = source.queues()?;
    let processes = source.processes()?;
    let workers = source.workers()?;
    let retries = source.retry_jobs(job_limit)?;
    let scheduled = source.scheduled_jobs(job_limit)?;
    let dead = source.dead_jobs(job_limit)?;
    let queue_jobs = match active_queue {
        Some(queue) => Some(QueueJobs {
            jobs: source.queue_jobs(&queue, job_limit)?,
            queue,
        }),
        None => None,
    };
    Ok(DataSnapshot {
        overview,
        queues,
        processes,
        workers,
        retries,
        scheduled,
        dead,
        queue_jobs,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use crate::source::demo::DemoBackend;
    use crate::source::model::{JobInfo, OverviewStats, ProcessInfo, QueueInfo, WorkerInfo};
    use crate::tui::view::View;

    use super::*;

    /// Backend that fails every call, for self-healing tests.
    struct FailingSource {
        calls: AtomicUsize,
    }

    impl MonitoringDataSource for FailingSource {
        fn overview(&self) -> Result<OverviewStats, FetchError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Err(FetchError::Timeout)
        }
        fn queues(&self) -> Result<Vec<QueueInfo>, FetchError> {
            Err(FetchError::Timeout)
        }
        fn processes(&self) -> Result<Vec<ProcessInfo>, FetchError> {
            Err(FetchError::Timeout)
        }
        fn workers(&self) -> Result<Vec<WorkerInfo>, FetchError> {
            Err(FetchError::Timeout)
        }
        fn retry_jobs(&self, _: usize) -> Result<Vec<JobInfo>, FetchError> {
            Err(FetchError::Timeout)
        }
        fn scheduled_jobs(&self, _: usize) -> Result<Vec<JobInfo>, FetchError> {
            Err(FetchError::Timeout)
        }
        fn dead_jobs(&self, _: usize) -> Result<Vec<JobInfo>, FetchError> {
            Err(FetchError::Timeout)
        }
        fn queue_jobs(&self, _: &str, _: usize) -> Result<Vec<JobInfo>, FetchError> {
            Err(FetchError::Timeout)
        }
    }

    fn scheduler(
        source: Arc<dyn MonitoringDataSource>,
        cache: &Arc<DataCache>,
        running: &Arc<AtomicBool>,
    ) -> PollScheduler {
        PollScheduler {
            source,
            cache: Arc::clone(cache),
            guard: Arc::new(PollGuard::default()),
            view_cell: Arc::new(ViewCell::default()),
            running: Arc::clone(running),
            interval: Duration::from_millis(10),
            job_limit: 25,
            logger: JsonlLogger::disabled(),
        }
    }

    #[test]
    fn fetch_snapshot_includes_queue_jobs_only_when_active() {
        let backend = DemoBackend::new();
        let plain = fetch_snapshot(&backend, 25, None).unwrap();
        assert!(plain.queue_jobs.is_none());
        assert!(!plain.queues.is_empty());

        let scoped = fetch_snapshot(&backend, 25, Some("default".to_string())).unwrap();
        assert_eq!(scoped.queue_jobs.unwrap().queue, "default");
    }

    #[test]
    fn skipped_cycle_when_guard_is_held() {
        let cache = Arc::new(DataCache::default());
        let running = Arc::new(AtomicBool::new(true));
        let mut sched = scheduler(Arc::new(DemoBackend::new()), &cache, &running);
        sched.guard.try_acquire();
        sched.poll_once();
        // Guard was held: nothing published, guard still held.
        assert_eq!(cache.current().1, 0);
        assert!(sched.guard.is_held());
        sched.guard.release();
        sched.poll_once();
        assert!(cache.current().0.is_some());
        assert!(!sched.guard.is_held());
    }

    #[test]
    fn failed_fetch_keeps_last_snapshot_and_flags_error() {
        let cache = Arc::new(DataCache::default());
        let running = Arc::new(AtomicBool::new(true));

        let mut good = scheduler(Arc::new(DemoBackend::new()), &cache, &running);
        good.poll_once();
        let (snapshot, version) = cache.current();
        assert!(snapshot.is_some());

        let mut bad = scheduler(
            Arc::new(FailingSource {
                calls: AtomicUsize::new(0),
            }),
            &cache,
            &running,
        );
        bad.poll_once();
        let (kept, _) = cache.current();
        assert_eq!(kept, snapshot, "failed fetch must not replace the snapshot");
        assert_eq!(cache.status(), ConnectionStatus::Error);
        assert!(cache.current().1 > version, "status change bumps version");
    }

    #[test]
    fn running_flag_stops_the_thread_promptly() {
        let cache = Arc::new(DataCache::default());
        let running = Arc::new(AtomicBool::new(true));
        let sched = PollScheduler {
            interval: Duration::from_secs(3600),
            ..scheduler(Arc::new(DemoBackend::new()), &cache, &running)
        };
        let handle = sched.spawn().unwrap();
        // Give it time to enter the long sleep.
        thread::sleep(Duration::from_millis(50));
        running.store(false, Ordering::Relaxed);
        assert!(handle.join_timeout(Duration::from_secs(2)));
        assert!(cache.current().0.is_some());
    }

    #[test]
    fn view_cell_scopes_the_poll() {
        let cache = Arc::new(DataCache::default());
        let running = Arc::new(AtomicBool::new(true));
        let mut sched = scheduler(Arc::new(DemoBackend::new()), &cache, &running);
        sched
            .view_cell
            .set(View::QueueJobs, Some("critical".to_string()));
        sched.poll_once();
        let (snapshot, _) = cache.current();
        assert_eq!(
            snapshot.unwrap().queue_jobs.as_ref().unwrap().queue,
            "critical"
        );
    }
}
