// src/spider/queue.rs
// =============================================================================
// The bounded task queue shared by all workers.
//
// Submitting never waits. A task goes straight into the channel when there is
// room; when the channel is full the overflow policy decides:
// - Backlog: park it in a single overflow deque that workers move back into
//   the channel as space frees up
// - Drop: discard it (its ticket is released, so the crawl can still finish)
//
// Every push first moves parked tasks into whatever room the channel has, and
// a new task only bypasses the backlog once it is empty. That keeps submission
// order FIFO across the two stores and never leaves work parked next to an
// empty channel.
// =============================================================================

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Deserialize;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::task::CrawlTask;
use super::tracker::Ticket;

pub const QUEUE_CAPACITY: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overflow {
    #[default]
    Backlog,
    Drop,
}

// A task plus the unit of outstanding work it holds.
#[derive(Debug)]
pub struct Job {
    pub task: CrawlTask,
    pub ticket: Ticket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Queued,
    Backlogged,
    Dropped,
}

#[derive(Debug)]
pub struct TaskQueue {
    tx: mpsc::Sender<Job>,
    rx: tokio::sync::Mutex<mpsc::Receiver<Job>>,
    backlog: Mutex<VecDeque<Job>>,
    overflow: Overflow,
}

impl TaskQueue {
    pub fn new(capacity: usize, overflow: Overflow) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            rx: tokio::sync::Mutex::new(rx),
            backlog: Mutex::new(VecDeque::new()),
            overflow,
        }
    }

    pub fn push(&self, job: Job) -> Admission {
        // The backlog lock is held across try_send so a worker refill can't
        // run between "channel is full" and "parked in the backlog".
        let mut backlog = self.backlog();

        // Parked jobs go first; the new one only skips the backlog once it
        // is empty again.
        Self::drain(&self.tx, &mut backlog);

        let job = if backlog.is_empty() {
            match self.tx.try_send(job) {
                Ok(()) => return Admission::Queued,
                Err(TrySendError::Full(job)) => job,
                Err(TrySendError::Closed(_)) => return Admission::Dropped,
            }
        } else {
            job
        };

        match self.overflow {
            Overflow::Backlog => {
                backlog.push_back(job);
                Admission::Backlogged
            }
            Overflow::Drop => Admission::Dropped,
        }
    }

    // Waits for the next job. Only returns None if the channel is closed,
    // which can't happen while the queue itself holds the sender.
    pub async fn pop(&self) -> Option<Job> {
        self.rx.lock().await.recv().await
    }

    // Moves parked jobs into the channel until it is full again.
    pub fn refill(&self) -> usize {
        let mut backlog = self.backlog();
        Self::drain(&self.tx, &mut backlog)
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog().len()
    }

    fn backlog(&self) -> MutexGuard<'_, VecDeque<Job>> {
        self.backlog.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn drain(tx: &mpsc::Sender<Job>, backlog: &mut VecDeque<Job>) -> usize {
        let mut moved = 0;

        while let Some(job) = backlog.pop_front() {
            match tx.try_send(job) {
                Ok(()) => moved += 1,
                Err(TrySendError::Full(job)) => {
                    backlog.push_front(job);
                    break;
                }
                Err(TrySendError::Closed(_)) => break,
            }
        }

        moved
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a std Mutex for the backlog and a tokio Mutex for the receiver?
//    - The backlog lock is never held across an .await, so the cheaper std
//      lock is enough
//    - The receiver is held while waiting in recv(), which is an .await
//
// 2. Why is the receiver behind a Mutex at all?
//    - mpsc has a single consumer. Workers take turns: one waits in recv(),
//      the others wait for the lock. Either way an idle worker gets the next
//      job as soon as it is sent
// -----------------------------------------------------------------------------
