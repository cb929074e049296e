// src/spider/tracker.rs
// =============================================================================
// Completion tracking.
//
// `Outstanding` counts tasks that were submitted but have not finished. Each
// submission takes a `Ticket`; the ticket travels with the task through the
// queue and the worker, and dropping it is the only way the count goes down.
// That gives the two orderings the crawl depends on:
// - the count goes up before the task can be seen by any worker
// - it goes down after the task, and every child it submitted, is done
//
// `wait_idle` resolves once the count is back to zero.
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct Outstanding {
    count: AtomicUsize,
    idle: Notify,
}

impl Outstanding {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn ticket(self: &Arc<Self>) -> Ticket {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ticket {
            owner: Arc::clone(self),
        }
    }

    pub fn pending(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub async fn wait_idle(&self) {
        loop {
            // Register interest before checking the count, otherwise a
            // notification between the load and the await is lost.
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn release(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

// One registered unit of outstanding work.
#[derive(Debug)]
pub struct Ticket {
    owner: Arc<Outstanding>,
}

impl Drop for Ticket {
    fn drop(&mut self) {
        self.owner.release();
    }
}

// Counters reported once the crawl is over.
#[derive(Debug, Default)]
pub struct CrawlStats {
    pub fetched: AtomicUsize,
    pub failed: AtomicUsize,
    pub saved: AtomicUsize,
    pub discovered: AtomicUsize,
    pub skipped: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub fetched: usize,
    pub failed: usize,
    pub saved: usize,
    pub discovered: usize,
    pub skipped: usize,
}

impl CrawlStats {
    pub fn bump(counter: &AtomicUsize) {
        Self::add(counter, 1);
    }

    pub fn add(counter: &AtomicUsize, n: usize) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            fetched: self.fetched.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            saved: self.saved.load(Ordering::Relaxed),
            discovered: self.discovered.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}
