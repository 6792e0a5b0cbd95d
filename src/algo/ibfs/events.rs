use alloc::collections::BinaryHeap;
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::{Ordering, Reverse};

use num_traits::float::FloatCore;

use crate::amount::TOLERANCE;
use crate::id::ArcId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// A shrinking residual runs out.
    Exhausted,
    /// A parametric capacity reaches the infinity threshold.
    Unbounded,
}

/// An arc breakpoint waiting to be applied.
#[derive(Clone, Copy, Debug)]
pub struct Pending {
    pub lambda: f64,
    pub arc: ArcId,
    pub kind: EventKind,
    stamp: u32,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lambda
            .total_cmp(&other.lambda)
            .then(self.arc.cmp(&other.arc))
            .then(self.stamp.cmp(&other.stamp))
    }
}

/// Arc breakpoints that lie ahead of the sweep, smallest λ first.
///
/// Exhaustion points move whenever flow is pushed through an arc, so every arc carries a stamp
/// and only the entry scheduled with the arc's latest stamp is live. Stale entries are dropped
/// as they surface.
#[derive(Clone, Debug, Default)]
pub struct BreakpointQueue {
    heap: BinaryHeap<Reverse<Pending>>,
    stamps: Vec<u32>,
}

/// Events popped for a single level.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    pub exhausted: Vec<ArcId>,
    pub unbounded: Vec<ArcId>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.exhausted.len() + self.unbounded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BreakpointQueue {
    pub fn new(arc_count: usize) -> Self {
        Self {
            heap: BinaryHeap::new(),
            stamps: vec![0; arc_count],
        }
    }

    pub fn schedule_unbounded(&mut self, arc: ArcId, lambda: f64) {
        self.heap.push(Reverse(Pending {
            lambda,
            arc,
            kind: EventKind::Unbounded,
            stamp: 0,
        }));
    }

    /// Replaces the arc's exhaustion point.
    pub fn reschedule(&mut self, arc: ArcId, lambda: Option<f64>) {
        let stamp = &mut self.stamps[arc];
        *stamp = stamp.wrapping_add(1);
        if let Some(lambda) = lambda {
            self.heap.push(Reverse(Pending {
                lambda,
                arc,
                kind: EventKind::Exhausted,
                stamp: *stamp,
            }));
        }
    }

    fn is_live(&self, pending: &Pending) -> bool {
        match pending.kind {
            EventKind::Exhausted => pending.stamp == self.stamps[pending.arc],
            EventKind::Unbounded => true,
        }
    }

    fn skip_stale(&mut self) {
        while let Some(Reverse(pending)) = self.heap.peek() {
            if self.is_live(pending) {
                break;
            }
            self.heap.pop();
        }
    }

    /// λ of the next live breakpoint.
    pub fn peek(&mut self) -> Option<f64> {
        self.skip_stale();
        self.heap.peek().map(|Reverse(pending)| pending.lambda)
    }

    /// Pops every live breakpoint at or below `lambda`, in `(λ, arc)` order. Breakpoints that
    /// differ from `lambda` by rounding only are taken along.
    pub fn pop_until(&mut self, lambda: f64) -> Batch {
        let limit = lambda + TOLERANCE * FloatCore::abs(lambda).max(1.0);
        let mut batch = Batch::default();
        while let Some(next) = self.peek() {
            if next > limit {
                break;
            }
            if let Some(Reverse(pending)) = self.heap.pop() {
                match pending.kind {
                    EventKind::Exhausted => {
                        // an arc is exhausted once, until flow is pushed through it again
                        self.reschedule(pending.arc, None);
                        batch.exhausted.push(pending.arc);
                    }
                    EventKind::Unbounded => batch.unbounded.push(pending.arc),
                }
            }
        }
        batch
    }

    pub fn is_empty(&mut self) -> bool {
        self.peek().is_none()
    }
}
