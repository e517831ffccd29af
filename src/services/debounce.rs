use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::sleep;

/// Identifies one triggering input; stale once a newer input arrives.
#[derive(Debug, Clone)]
pub struct Ticket {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl Ticket {
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::Acquire) == self.generation
    }
}

/// Last-write-wins debouncer: each trigger cancels the pending work and
/// restarts the delay window.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    latest: Arc<AtomicU64>,
    pending: Option<AbortHandle>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            latest: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    pub fn trigger<F, Fut>(&mut self, work: F) -> Ticket
    where
        F: FnOnce(Ticket) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let ticket = self.supersede();
        let delay = self.delay;
        let task_ticket = ticket.clone();

        let handle = tokio::spawn(async move {
            sleep(delay).await;
            if task_ticket.is_current() {
                work(task_ticket).await;
            }
        });
        self.pending = Some(handle.abort_handle());

        ticket
    }

    /// Drop pending work without scheduling anything new.
    pub fn cancel(&mut self) {
        self.supersede();
    }

    fn supersede(&mut self) -> Ticket {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }

        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        Ticket {
            generation,
            latest: self.latest.clone(),
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}
