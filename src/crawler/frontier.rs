//! Shared work frontier for the worker pool
//!
//! The frontier is a FIFO queue of [`Job`]s plus an in-flight counter. A job
//! counts as in flight from the moment it is submitted until the worker that
//! took it calls [`Frontier::complete`]. Workers stop when the queue is empty
//! and nothing is in flight, which means no job can appear any more.

use super::lock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

/// A unit of crawl work: fetch `child`, which was discovered on `parent`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Page the link was found on; `None` only for the seed
    pub parent: Option<String>,

    /// URL to process
    pub child: String,
}

impl Job {
    /// Creates the initial job for the seed URL
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            parent: None,
            child: url.into(),
        }
    }

    /// Creates a job for a link found on `parent`
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: Some(parent.into()),
            child: child.into(),
        }
    }
}

/// Concurrent FIFO queue of pending jobs with drain detection
#[derive(Debug, Default)]
pub struct Frontier {
    queue: Mutex<VecDeque<Job>>,

    /// Submitted jobs that have not been completed yet (queued or being processed)
    in_flight: AtomicUsize,

    notify: Notify,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a job and wakes one waiting worker
    ///
    /// No deduplication happens here; callers claim URLs first.
    pub fn submit(&self, job: Job) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        lock(&self.queue).push_back(job);
        self.notify.notify_one();
    }

    /// Waits for the next job
    ///
    /// Returns `None` once the frontier has drained: the queue is empty and
    /// every submitted job has been completed. With `wait` set, also returns
    /// `None` if no job shows up within that window while other jobs are
    /// still being processed.
    pub async fn take_next(&self, wait: Option<Duration>) -> Option<Job> {
        loop {
            // Register interest before checking state so a submit or the final
            // complete() between the check and the await is not missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(job) = lock(&self.queue).pop_front() {
                return Some(job);
            }

            if self.in_flight.load(Ordering::SeqCst) == 0 {
                tracing::trace!("Frontier drained");
                return None;
            }

            match wait {
                Some(wait) => {
                    if tokio::time::timeout(wait, notified).await.is_err() {
                        tracing::debug!(
                            "No job arrived within {:?} ({} still in flight)",
                            wait,
                            self.in_flight()
                        );
                        return None;
                    }
                }
                None => notified.await,
            }
        }
    }

    /// Marks one previously taken job as fully processed
    ///
    /// Must be called after any child jobs have been submitted. When the last
    /// in-flight job completes every waiting worker is woken so it can exit.
    pub fn complete(&self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "complete() called more often than submit()");

        if previous == 1 {
            self.notify.notify_waiters();
        }
    }

    /// Number of jobs waiting in the queue
    pub fn len(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Returns whether the queue is empty
    pub fn is_empty(&self) -> bool {
        lock(&self.queue).is_empty()
    }

    /// Number of submitted jobs not yet completed
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// Completes a taken job when dropped, even if processing panicked
pub(crate) struct InFlightGuard<'a> {
    frontier: &'a Frontier,
}

impl<'a> InFlightGuard<'a> {
    pub(crate) fn new(frontier: &'a Frontier) -> Self {
        Self { frontier }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.frontier.complete();
    }
}
