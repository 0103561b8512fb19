//! `EventQueue` — min-heap of pending events keyed by `(time, seq)`.
//!
//! `push` and `pop_earliest` are O(log n).  `peek_n` copies references and
//! sorts them, O(n log n); it is meant for live views, not the hot loop.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use hs_core::SimTime;

use crate::{Event, EventKind};

/// Heap entry ordered by `(time, seq)` only.
#[derive(Debug)]
struct Keyed(Event);

impl PartialEq for Keyed {
    fn eq(&self, other: &Self) -> bool {
        self.0.key() == other.0.key()
    }
}

impl Eq for Keyed {}

impl PartialOrd for Keyed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Keyed {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.key().cmp(&other.0.key())
    }
}

/// Time-ordered queue of pending events.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap:     BinaryHeap<Reverse<Keyed>>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` at `time` and return its sequence number.
    pub fn push(&mut self, time: SimTime, kind: EventKind) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Keyed(Event { time, seq, kind })));
        seq
    }

    /// Remove and return the earliest event, or `None` if the queue is empty.
    pub fn pop_earliest(&mut self) -> Option<Event> {
        self.heap.pop().map(|Reverse(Keyed(e))| e)
    }

    /// The earliest event without removing it.
    pub fn peek(&self) -> Option<&Event> {
        self.heap.peek().map(|Reverse(Keyed(e))| e)
    }

    /// Timestamp of the earliest event.
    pub fn next_time(&self) -> Option<SimTime> {
        self.peek().map(|e| e.time)
    }

    /// Up to `n` upcoming events in pop order, without removing them.
    pub fn peek_n(&self, n: usize) -> Vec<&Event> {
        let mut all: Vec<&Event> = self.heap.iter().map(|Reverse(Keyed(e))| e).collect();
        all.sort_unstable_by_key(|e| e.key());
        all.truncate(n);
        all
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Sequence number the next `push` will receive.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }
}
