//! Deadline-ordered retry timers.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Instant;

use wayfinder_movement::TimerToken;

/// Pending timer firings, earliest first. Cancelling is never needed: a
/// firing whose token the coordinator no longer holds is ignored there.
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<(Instant, TimerToken)>>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, token: TimerToken, deadline: Instant) {
        self.heap.push(Reverse((deadline, token)));
    }

    /// Removes and returns every token due at `now`, in deadline order.
    pub fn drain_due(&mut self, now: Instant) -> Vec<TimerToken> {
        let mut due = Vec::new();
        while let Some(Reverse((deadline, token))) = self.heap.peek().copied() {
            if deadline > now {
                break;
            }
            self.heap.pop();
            due.push(token);
        }
        due
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
