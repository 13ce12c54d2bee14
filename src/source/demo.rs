//! Simulated backend for demos and integration tests.
//!
//! `DemoBackend` implements both boundary traits over an in-memory world
//! that drifts a little on every poll, so the dashboard can be exercised
//! end to end without a live backend. Actions mutate the world the way a
//! real backend would: retrying a dead job re-enqueues it, quieting a
//! process flips its flag, and unknown targets come back `NotFound`.

#![allow(clippy::cast_possible_truncation)]

use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use rand::Rng;

use super::model::{JobInfo, OverviewStats, ProcessInfo, QueueInfo, WorkerInfo};
use super::{ActionError, FetchError, JobActionService, JobSet, MonitoringDataSource};

const JOB_CLASSES: &[&str] = &[
    "OrderMailer",
    "InvoiceExport",
    "ThumbnailJob",
    "SearchReindex",
    "WebhookDelivery",
    "NightlyRollup",
];

const QUEUE_NAMES: &[&str] = &["default", "critical", "mailers", "low"];

struct DemoWorld {
    overview: OverviewStats,
    queues: Vec<QueueInfo>,
    processes: Vec<ProcessInfo>,
    retries: Vec<JobInfo>,
    scheduled: Vec<JobInfo>,
    dead: Vec<JobInfo>,
    next_jid: u64,
}

/// In-process simulated backend.
pub struct DemoBackend {
    world: Mutex<DemoWorld>,
}

impl DemoBackend {
    /// Build a world with a few queues, two processes, and a handful of
    /// jobs in each failure set.
    #[must_use]
    pub fn new() -> Self {
        let mut world = DemoWorld {
            overview: OverviewStats {
                processed: 1_284_055,
                failed: 4_211,
                enqueued: 0,
                scheduled: 0,
                retries: 0,
                dead: 0,
                latency_secs: 0.4,
            },
            queues: QUEUE_NAMES
                .iter()
                .enumerate()
                .map(|(i, name)| QueueInfo {
                    name: (*name).to_string(),
                    size: (i as u64 + 1) * 7,
                    latency_secs: 0.2 * (i as f64 + 1.0),
                    paused: false,
                })
                .collect(),
            processes: (0..2)
                .map(|i| ProcessInfo {
                    identity: format!("worker-{i}.internal:40{i}:9f{i}a"),
                    hostname: format!("worker-{i}.internal"),
                    pid: 400 + i,
                    concurrency: 10,
                    busy: 3 + i,
                    queues: vec!["default".to_string(), "critical".to_string()],
                    quiet: false,
                    started_at: Utc::now() - ChronoDuration::hours(6),
                })
                .collect(),
            retries: Vec::new(),
            scheduled: Vec::new(),
            dead: Vec::new(),
            next_jid: 1,
        };
        for i in 0..12 {
            let job = make_job(&mut world.next_jid, i);
            match i % 3 {
                0 => world.retries.push(job),
                1 => world.scheduled.push(job),
                _ => world.dead.push(job),
            }
        }
        sync_counters(&mut world);
        Self {
            world: Mutex::new(world),
        }
    }

    fn set_of(world: &mut DemoWorld, source: JobSet) -> &mut Vec<JobInfo> {
        match source {
            JobSet::Retries => &mut world.retries,
            JobSet::Scheduled => &mut world.scheduled,
            JobSet::Dead => &mut world.dead,
        }
    }
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn make_job(next_jid: &mut u64, seed: usize) -> JobInfo {
    let jid = *next_jid;
    *next_jid += 1;
    JobInfo {
        id: Some(format!("jid-{jid:08x}")),
        job_class: JOB_CLASSES[seed % JOB_CLASSES.len()].to_string(),
        args: format!("[{}, \"batch-{seed}\"]", seed * 13),
        queue: QUEUE_NAMES[seed % QUEUE_NAMES.len()].to_string(),
        error_class: Some("Timeout::Error".to_string()),
        error_message: Some(format!("execution expired after {}s", 5 + seed)),
        at: Utc::now() + ChronoDuration::minutes(seed as i64 * 3),
        retry_count: (seed % 5) as u32,
    }
}

fn sync_counters(world: &mut DemoWorld) {
    world.overview.retries = world.retries.len() as u64;
    world.overview.scheduled = world.scheduled.len() as u64;
    world.overview.dead = world.dead.len() as u64;
    world.overview.enqueued = world.queues.iter().map(|q| q.size).sum();
}

/// Nudge the world so successive polls show movement.
fn drift(world: &mut DemoWorld) {
    let mut rng = rand::rng();
    world.overview.processed += rng.random_range(5..40);
    world.overview.latency_secs = rng.random_range(0.05..2.5);
    for queue in &mut world.queues {
        let delta: i64 = rng.random_range(-3..5);
        queue.size = queue.size.saturating_add_signed(delta);
        queue.latency_secs = (queue.latency_secs + rng.random_range(-0.1..0.1)).max(0.0);
    }
    for process in &mut world.processes {
        process.busy = if process.quiet {
            process.busy.saturating_sub(1)
        } else {
            rng.random_range(0..=process.concurrency)
        };
    }
    sync_counters(world);
}

impl MonitoringDataSource for DemoBackend {
    fn overview(&self) -> Result<OverviewStats, FetchError> {
        let mut world = self.world.lock();
        drift(&mut world);
        Ok(world.overview)
    }

    fn queues(&self) -> Result<Vec<QueueInfo>, FetchError> {
        Ok(self.world.lock().queues.clone())
    }

    fn processes(&self) -> Result<Vec<ProcessInfo>, FetchError> {
        Ok(self.world.lock().processes.clone())
    }

    fn workers(&self) -> Result<Vec<WorkerInfo>, FetchError> {
        let world = self.world.lock();
        let mut workers = Vec::new();
        for process in &world.processes {
            for slot in 0..process.busy {
                workers.push(WorkerInfo {
                    process_identity: process.identity.clone(),
                    thread_id: format!("{:x}", u64::from(process.pid) * 100 + u64::from(slot)),
                    queue: process.queues[slot as usize % process.queues.len()].clone(),
                    job_class: JOB_CLASSES[slot as usize % JOB_CLASSES.len()].to_string(),
                    job_args: format!("[{slot}]"),
                    run_at: Utc::now() - ChronoDuration::seconds(i64::from(slot) * 7),
                });
            }
        }
        Ok(workers)
    }

    fn retry_jobs(&self, limit: usize) -> Result<Vec<JobInfo>, FetchError> {
        Ok(self.world.lock().retries.iter().take(limit).cloned().collect())
    }

    fn scheduled_jobs(&self, limit: usize) -> Result<Vec<JobInfo>, FetchError> {
        Ok(self.world.lock().scheduled.iter().take(limit).cloned().collect())
    }

    fn dead_jobs(&self, limit: usize) -> Result<Vec<JobInfo>, FetchError> {
        Ok(self.world.lock().dead.iter().take(limit).cloned().collect())
    }

    fn queue_jobs(&self, name: &str, limit: usize) -> Result<Vec<JobInfo>, FetchError> {
        let mut world = self.world.lock();
        if !world.queues.iter().any(|q| q.name == name) {
            return Err(FetchError::Payload {
                details: format!("unknown queue: {name}"),
            });
        }
        let count = world
            .queues
            .iter()
            .find(|q| q.name == name)
            .map_or(0, |q| q.size as usize)
            .min(limit);
        let jobs = (0..count)
            .map(|i| {
                let mut job = make_job(&mut world.next_jid, i);
                job.queue = name.to_string();
                job.error_class = None;
                job.error_message = None;
                job.retry_count = 0;
                job
            })
            .collect();
        Ok(jobs)
    }
}

impl JobActionService for DemoBackend {
    fn retry_job(&self, id: &str, source: JobSet) -> Result<(), ActionError> {
        let mut world = self.world.lock();
        let set = Self::set_of(&mut world, source);
        let pos = set
            .iter()
            .position(|j| j.id.as_deref() == Some(id))
            .ok_or_else(|| ActionError::NotFound { target: id.to_string() })?;
        let job = set.remove(pos);
        if let Some(queue) = world.queues.iter_mut().find(|q| q.name == job.queue) {
            queue.size += 1;
        }
        sync_counters(&mut world);
        Ok(())
    }

    fn delete_job(&self, id: &str, source: JobSet) -> Result<(), ActionError> {
        let mut world = self.world.lock();
        let set = Self::set_of(&mut world, source);
        let pos = set
            .iter()
            .position(|j| j.id.as_deref() == Some(id))
            .ok_or_else(|| ActionError::NotFound { target: id.to_string() })?;
        set.remove(pos);
        sync_counters(&mut world);
        Ok(())
    }

    fn retry_all(&self, source: JobSet) -> Result<(), ActionError> {
        let mut world = self.world.lock();
        let jobs = std::mem::take(Self::set_of(&mut world, source));
        for job in jobs {
            if let Some(queue) = world.queues.iter_mut().find(|q| q.name == job.queue) {
                queue.size += 1;
            }
        }
        sync_counters(&mut world);
        Ok(())
    }

    fn delete_all(&self, source: JobSet) -> Result<(), ActionError> {
        let mut world = self.world.lock();
        Self::set_of(&mut world, source).clear();
        sync_counters(&mut world);
        Ok(())
    }

    fn quiet_process(&self, identity: &str) -> Result<(), ActionError> {
        let mut world = self.world.lock();
        let process = world
            .processes
            .iter_mut()
            .find(|p| p.identity == identity)
            .ok_or_else(|| ActionError::NotFound {
                target: identity.to_string(),
            })?;
        process.quiet = true;
        Ok(())
    }

    fn stop_process(&self, identity: &str) -> Result<(), ActionError> {
        let mut world = self.world.lock();
        let pos = world
            .processes
            .iter()
            .position(|p| p.identity == identity)
            .ok_or_else(|| ActionError::NotFound {
                target: identity.to_string(),
            })?;
        world.processes.remove(pos);
        Ok(())
    }

    fn delete_queue_job(&self, queue: &str, id: &str) -> Result<(), ActionError> {
        let mut world = self.world.lock();
        let entry = world
            .queues
            .iter_mut()
            .find(|q| q.name == queue)
            .ok_or_else(|| ActionError::NotFound {
                target: queue.to_string(),
            })?;
        if entry.size == 0 {
            return Err(ActionError::NotFound { target: id.to_string() });
        }
        entry.size -= 1;
        sync_counters(&mut world);
        Ok(())
    }
}
