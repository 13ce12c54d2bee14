//! Backend boundary: the traits the dashboard core consumes and the
//! error taxonomies that cross them.
//!
//! The core treats the monitoring backend as two capabilities: a
//! read-only [`MonitoringDataSource`] polled for snapshots, and a
//! [`JobActionService`] for remote mutations. Both are object-safe so the
//! event loop and poller can share `Arc<dyn …>` handles.

use std::fmt;

use thiserror::Error;

pub mod demo;
pub mod model;

use model::{JobInfo, OverviewStats, ProcessInfo, QueueInfo, WorkerInfo};

/// Transient failure while reading from the backend.
///
/// Never fatal: the poll scheduler marks the connection `Error`, keeps
/// the last good snapshot on screen, and retries next cycle.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Could not reach the backend.
    #[error("connection failure: {details}")]
    Connection {
        /// Backend-reported failure description.
        details: String,
    },
    /// The backend answered with something undecodable.
    #[error("malformed backend payload: {details}")]
    Payload {
        /// What failed to decode.
        details: String,
    },
    /// The backend did not answer in time.
    #[error("backend request timed out")]
    Timeout,
}

/// Failure of a remote mutation. Surfaced as a transient status message,
/// never propagated across the view state machine.
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    /// The named entity no longer exists on the backend.
    #[error("not found: {target}")]
    NotFound {
        /// Job id, process identity, or queue name that was missing.
        target: String,
    },
    /// The backend rejected the job-set name.
    #[error("unknown job set: {set}")]
    UnknownSource {
        /// The set name the backend rejected.
        set: String,
    },
    /// Any other backend-side failure.
    #[error("backend failure: {details}")]
    Backend {
        /// Backend-reported failure description.
        details: String,
    },
}

/// Which server-side job set a retry/delete action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobSet {
    /// Jobs awaiting automatic retry.
    Retries,
    /// Jobs scheduled for a future run.
    Scheduled,
    /// Jobs that exhausted their retries.
    Dead,
}

impl JobSet {
    /// Wire name of the set.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Retries => "retry",
            Self::Scheduled => "schedule",
            Self::Dead => "dead",
        }
    }
}

impl fmt::Display for JobSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only monitoring queries. Each call returns plain data records or
/// a transient [`FetchError`]; implementations perform whatever wire
/// protocol and shape normalization their backend needs.
pub trait MonitoringDataSource: Send + Sync {
    /// Aggregate counters for the main view.
    fn overview(&self) -> Result<OverviewStats, FetchError>;
    /// All known queues.
    fn queues(&self) -> Result<Vec<QueueInfo>, FetchError>;
    /// All live worker processes.
    fn processes(&self) -> Result<Vec<ProcessInfo>, FetchError>;
    /// All in-flight jobs, normalized to [`WorkerInfo`].
    fn workers(&self) -> Result<Vec<WorkerInfo>, FetchError>;
    /// First `limit` jobs of the retry set.
    fn retry_jobs(&self, limit: usize) -> Result<Vec<JobInfo>, FetchError>;
    /// First `limit` jobs of the scheduled set.
    fn scheduled_jobs(&self, limit: usize) -> Result<Vec<JobInfo>, FetchError>;
    /// First `limit` jobs of the dead set.
    fn dead_jobs(&self, limit: usize) -> Result<Vec<JobInfo>, FetchError>;
    /// First `limit` pending jobs of one named queue.
    fn queue_jobs(&self, name: &str, limit: usize) -> Result<Vec<JobInfo>, FetchError>;
}

/// Remote mutations triggered from the dashboard.
pub trait JobActionService: Send + Sync {
    /// Move one job from `source` back onto its queue.
    fn retry_job(&self, id: &str, source: JobSet) -> Result<(), ActionError>;
    /// Remove one job from `source`.
    fn delete_job(&self, id: &str, source: JobSet) -> Result<(), ActionError>;
    /// Re-enqueue every job in `source`.
    fn retry_all(&self, source: JobSet) -> Result<(), ActionError>;
    /// Clear every job in `source`.
    fn delete_all(&self, source: JobSet) -> Result<(), ActionError>;
    /// Ask a process to stop accepting new work.
    fn quiet_process(&self, identity: &str) -> Result<(), ActionError>;
    /// Ask a process to shut down.
    fn stop_process(&self, identity: &str) -> Result<(), ActionError>;
    /// Remove one pending job from a named queue.
    fn delete_queue_job(&self, queue: &str, id: &str) -> Result<(), ActionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_set_wire_names() {
        assert_eq!(JobSet::Retries.as_str(), "retry");
        assert_eq!(JobSet::Scheduled.as_str(), "schedule");
        assert_eq!(JobSet::Dead.as_str(), "dead");
        assert_eq!(JobSet::Dead.to_string(), "dead");
    }

    #[test]
    fn errors_render_their_targets() {
        let e = ActionError::NotFound {
            target: "jid-42".into(),
        };
        assert!(e.to_string().contains("jid-42"));
    }
}
