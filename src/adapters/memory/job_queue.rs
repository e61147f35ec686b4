//! In-memory durable-job queue.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{Job, JobQueue};

pub struct InMemoryJobQueue {
    jobs: Mutex<Vec<Job>>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
        }
    }

    /// Everything currently queued, due or not (for test assertions).
    pub fn snapshot(&self) -> Vec<Job> {
        self.jobs.lock().expect("jobs lock poisoned").clone()
    }
}

impl Default for InMemoryJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), DomainError> {
        self.jobs.lock().expect("jobs lock poisoned").push(job);
        Ok(())
    }

    async fn drain_due(&self, now: Timestamp) -> Result<Vec<Job>, DomainError> {
        let mut jobs = self.jobs.lock().expect("jobs lock poisoned");
        let (mut due, rest): (Vec<Job>, Vec<Job>) =
            jobs.drain(..).partition(|j| !j.run_at.is_after(&now));
        *jobs = rest;
        due.sort_by(|a, b| a.run_at.cmp(&b.run_at));
        Ok(due)
    }
}
