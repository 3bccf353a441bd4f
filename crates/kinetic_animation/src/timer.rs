//! Per-instance timer queue
//!
//! Each effect that needs delayed work (per-cell flips, holds) owns a
//! [`TimerQueue`]. There is no shared scheduler: the queue only moves when its
//! owner advances it, so dropping or cancelling the owner's queue guarantees
//! nothing fires afterwards.

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Handle to a scheduled timer
    pub struct TimerId;
}

#[derive(Clone, Debug)]
struct Timer<T> {
    due_ms: f32,
    /// Insertion order, breaks ties between timers due at the same time
    seq: u64,
    payload: T,
}

/// Timers keyed by [`TimerId`], fired in (due time, insertion) order
#[derive(Clone, Debug)]
pub struct TimerQueue<T> {
    timers: SlotMap<TimerId, Timer<T>>,
    now_ms: f32,
    next_seq: u64,
}

/// Payloads fired by one [`TimerQueue::advance`]
pub type Fired<T> = SmallVec<[T; 8]>;

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            timers: SlotMap::with_key(),
            now_ms: 0.0,
            next_seq: 0,
        }
    }

    /// Schedule `payload` to fire `delay_ms` from now
    ///
    /// Negative or non-finite delays fire on the next advance.
    pub fn schedule(&mut self, delay_ms: f32, payload: T) -> TimerId {
        let delay = if delay_ms.is_finite() {
            delay_ms.max(0.0)
        } else {
            0.0
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.insert(Timer {
            due_ms: self.now_ms + delay,
            seq,
            payload,
        })
    }

    /// Cancel a pending timer
    ///
    /// Returns `false` if the timer already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(id).is_some()
    }

    /// Cancel every pending timer, returning how many were pending
    pub fn cancel_all(&mut self) -> usize {
        let count = self.timers.len();
        self.timers.clear();
        count
    }

    /// Move the queue's clock forward and collect due payloads
    pub fn advance(&mut self, dt_ms: f32) -> Fired<T> {
        if dt_ms.is_finite() && dt_ms > 0.0 {
            self.now_ms += dt_ms;
        }

        let now = self.now_ms;
        let mut due: SmallVec<[(f32, u64, TimerId); 8]> = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.due_ms <= now)
            .map(|(id, timer)| (timer.due_ms, timer.seq, id))
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        due.into_iter()
            .filter_map(|(_, _, id)| self.timers.remove(id).map(|timer| timer.payload))
            .collect()
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// The queue's clock
    pub fn now_ms(&self) -> f32 {
        self.now_ms
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
