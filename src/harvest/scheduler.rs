//! Retry queue with a wall-clock budget
//!
//! This module handles:
//! - FIFO ordering of work items in discovery order
//! - Round-robin retries: a failed entry goes to the back of the queue
//! - The time budget, checked before every dequeue

use crate::state::{QueueEntry, WorkItem};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// What the queue hands out next
#[derive(Debug, PartialEq, Eq)]
pub enum Next {
    /// An entry to fetch now
    Entry(QueueEntry),

    /// Nothing left to do
    Drained,

    /// The budget ran out; remaining entries stay queued
    BudgetExceeded,
}

/// FIFO queue of `(item, attempt)` entries bounded by a time budget
///
/// The budget is soft: it is only checked between entries, so a run can
/// overshoot by one fetch plus one pause.
#[derive(Debug)]
pub struct RetryQueue {
    queue: VecDeque<QueueEntry>,
    started: Instant,
    budget: Duration,
}

impl RetryQueue {
    /// Creates a queue holding every item at attempt 0, in input order
    ///
    /// The budget clock starts now.
    pub fn new(items: Vec<WorkItem>, budget: Duration) -> Self {
        Self {
            queue: items.into_iter().map(QueueEntry::new).collect(),
            started: Instant::now(),
            budget,
        }
    }

    /// Pops the front entry unless the queue is empty or the budget is spent
    pub fn next_entry(&mut self) -> Next {
        if self.queue.is_empty() {
            return Next::Drained;
        }

        if self.elapsed() >= self.budget {
            return Next::BudgetExceeded;
        }

        match self.queue.pop_front() {
            Some(entry) => Next::Entry(entry),
            None => Next::Drained,
        }
    }

    /// Puts a failed entry at the back with its attempt count bumped
    pub fn requeue(&mut self, entry: QueueEntry) {
        self.queue.push_back(entry.next_attempt());
    }

    /// Removes and returns the items still waiting, in queue order
    pub fn drain_remaining(&mut self) -> Vec<WorkItem> {
        self.queue.drain(..).map(|entry| entry.item).collect()
    }

    /// Time since the queue was created
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Returns the number of entries waiting
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
