//! Plain data records handed across the backend boundary.
//!
//! Backends normalize whatever wire shapes they speak into these fixed
//! types before anything enters the dashboard core; the core never
//! branches on backend-specific record shapes.

#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate counters displayed on the main view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct OverviewStats {
    pub processed: u64,
    pub failed: u64,
    pub enqueued: u64,
    pub scheduled: u64,
    pub retries: u64,
    pub dead: u64,
    /// Oldest-job age of the busiest queue, in seconds.
    pub latency_secs: f64,
}

/// One queue row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueInfo {
    pub name: String,
    pub size: u64,
    pub latency_secs: f64,
    pub paused: bool,
}

/// One worker process row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    /// Globally unique process identity (hostname:pid:nonce).
    pub identity: String,
    pub hostname: String,
    pub pid: u32,
    pub concurrency: u32,
    pub busy: u32,
    pub queues: Vec<String>,
    pub quiet: bool,
    pub started_at: DateTime<Utc>,
}

/// One in-flight job row, normalized from the backend's worker records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerInfo {
    pub process_identity: String,
    pub thread_id: String,
    pub queue: String,
    pub job_class: String,
    /// Rendered argument list, already flattened to one string.
    pub job_args: String,
    pub run_at: DateTime<Utc>,
}

/// One job row from a retry/scheduled/dead set or a queue listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    /// Backend job identifier. Absent for malformed payloads; actions on
    /// such rows are rejected before reaching the backend.
    pub id: Option<String>,
    pub job_class: String,
    pub args: String,
    pub queue: String,
    pub error_class: Option<String>,
    pub error_message: Option<String>,
    /// Next-run time for retries/scheduled, death time for dead jobs,
    /// enqueue time for queue listings.
    pub at: DateTime<Utc>,
    pub retry_count: u32,
}

/// Job list for one named queue, fetched while the queue-jobs view is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueJobs {
    pub queue: String,
    pub jobs: Vec<JobInfo>,
}

/// One immutable, complete capture of monitored state.
///
/// Snapshots are published wholesale; nothing ever mutates one in place
/// except [`queue_jobs`](Self::queue_jobs) replacement under the cache
/// lock when a listing is fetched out of band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DataSnapshot {
    pub overview: OverviewStats,
    pub queues: Vec<QueueInfo>,
    pub processes: Vec<ProcessInfo>,
    pub workers: Vec<WorkerInfo>,
    pub retries: Vec<JobInfo>,
    pub scheduled: Vec<JobInfo>,
    pub dead: Vec<JobInfo>,
    /// Present only while the queue-jobs view is active.
    pub queue_jobs: Option<QueueJobs>,
}

impl DataSnapshot {
    /// Total and busy thread counts across all processes.
    #[must_use]
    pub fn utilization(&self) -> (u64, u64) {
        let total = self.processes.iter().map(|p| u64::from(p.concurrency)).sum();
        let busy = self.processes.iter().map(|p| u64::from(p.busy)).sum();
        (busy, total)
    }
}
