//! Soft mutual exclusion for transfer submissions.
//!
//! A held lock older than its TTL is treated as stuck and may be taken over,
//! so a wallet that never answers cannot block submissions forever.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::time::Instant;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Clock backed by the runtime timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.lock().map(|now| *now).unwrap_or_else(|e| *e.into_inner())
    }
}

/// Identifier of one transfer attempt
pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Holder {
    job: JobId,
    since: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    Acquired(JobId),
    /// a stale holder was evicted first
    TookOver { job: JobId, evicted: JobId },
    Busy { holder: JobId, held_for: Duration },
}

#[derive(Debug)]
pub struct ProcessingLock {
    ttl: Duration,
    holder: Option<Holder>,
    next_job: JobId,
}

impl ProcessingLock {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            holder: None,
            next_job: 1,
        }
    }

    pub fn holder(&self) -> Option<JobId> {
        self.holder.map(|h| h.job)
    }

    /// Held and not yet stale
    pub fn is_fresh(&self, now: Instant) -> bool {
        self.holder
            .map(|h| now.saturating_duration_since(h.since) <= self.ttl)
            .unwrap_or(false)
    }

    pub fn try_acquire(&mut self, now: Instant) -> Acquire {
        let evicted = match self.holder {
            Some(h) if now.saturating_duration_since(h.since) <= self.ttl => {
                return Acquire::Busy {
                    holder: h.job,
                    held_for: now.saturating_duration_since(h.since),
                }
            }
            Some(h) => Some(h.job),
            None => None,
        };

        let job = self.next_job;
        self.next_job += 1;
        self.holder = Some(Holder { job, since: now });

        match evicted {
            Some(evicted) => Acquire::TookOver { job, evicted },
            None => Acquire::Acquired(job),
        }
    }

    /// Releases the lock if `job` still holds it. Returns whether it did.
    pub fn release(&mut self, job: JobId) -> bool {
        match self.holder {
            Some(h) if h.job == job => {
                self.holder = None;
                true
            }
            _ => false,
        }
    }
}
