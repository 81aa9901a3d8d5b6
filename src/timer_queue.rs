//! Tick-keyed timeout queue.
//!
//! Entries are ordered by the absolute tick they fire at. Each frame the owner
//! calls [`TimerQueue::update`] with the current tick; every entry whose
//! timestamp has passed is moved into [`TimerQueue::completed`], which the
//! owner drains before the next update.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A scheduled timeout
#[derive(Debug, Clone)]
struct ScheduledTimeout<T> {
    fire_at: u32,
    /// Insertion counter, only used to keep `Ord` total
    seq: u64,
    payload: T,
}

impl<T> PartialEq for ScheduledTimeout<T> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl<T> Eq for ScheduledTimeout<T> {}

impl<T> PartialOrd for ScheduledTimeout<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for ScheduledTimeout<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior (earliest tick first)
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-heap of timeouts keyed by absolute tick.
///
/// The same payload may be registered any number of times; each registration
/// completes independently. There is no removal by payload: owners that need
/// cancellation track liveness themselves and ignore stale completions.
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    pending: BinaryHeap<ScheduledTimeout<T>>,
    now: u32,
    next_seq: u64,
    /// Payloads whose timeout elapsed during the last `update` calls.
    /// The owner must drain this every frame.
    pub completed: Vec<T>,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            pending: BinaryHeap::new(),
            now: 0,
            next_seq: 0,
            completed: Vec::new(),
        }
    }

    /// Register `payload` to complete `delay` ticks after the current tick.
    pub fn set_timeout(&mut self, payload: T, delay: u32) {
        let fire_at = self.now.saturating_add(delay);
        self.pending.push(ScheduledTimeout {
            fire_at,
            seq: self.next_seq,
            payload,
        });
        self.next_seq += 1;
    }

    /// Advance to `now` and move every entry that fired strictly before it
    /// into `completed`.
    pub fn update(&mut self, now: u32) {
        self.now = now;

        while let Some(next) = self.pending.peek() {
            if next.fire_at >= now {
                break;
            }
            if let Some(done) = self.pending.pop() {
                self.completed.push(done.payload);
            }
        }
    }

    /// Tick of the last `update`.
    pub fn now(&self) -> u32 {
        self.now
    }

    /// Tick of the earliest pending entry, if any
    pub fn peek_next(&self) -> Option<u32> {
        self.pending.peek().map(|t| t.fire_at)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every pending and completed entry (area unload).
    pub fn clear(&mut self) {
        self.pending.clear();
        self.completed.clear();
    }
}

impl<T: PartialEq> TimerQueue<T> {
    /// Check whether `payload` still has a pending (not yet fired) timeout.
    pub fn is_registered(&self, payload: &T) -> bool {
        self.pending.iter().any(|t| t.payload == *payload)
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
