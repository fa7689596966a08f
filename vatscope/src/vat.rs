//! Reconstructed trace model
//!
//! This module contains the data structures the reducer builds and the
//! read-only query surface external consumers (layout, rendering) see.
//!
//! The thread forest is stored as an arena: every [`Thread`] lives in one
//! `Vec` and refers to relatives by [`ThreadIndex`]. Children lists and the
//! `becomes` forward link are index-valued, which keeps identity resolution
//! O(1) per hop without any shared mutable ownership.
//!
//! All times are f64 seconds relative to the first event in the trace.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::decode::ThreadKind;
use crate::domain::{ThreadId, ThreadIndex};

/// Kind of a causal edge between two threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    /// This thread resolved the other.
    Resolve,
    /// This thread performed a blocking read on the other.
    Read,
    /// This thread woke the other (reciprocal of a `Read` on the source).
    Signal,
}

/// A causal/communication edge, time-ordered within each thread.
#[derive(Debug, Clone, Copy)]
pub struct Interaction {
    pub time: f64,
    pub kind: InteractionKind,
    pub other: ThreadIndex,
}

/// Closed interval during which a thread was the one actually executing.
#[derive(Debug, Clone, Copy)]
pub struct Activation {
    pub start: f64,
    pub end: f64,
}

/// A timestamped text annotation on a thread.
#[derive(Debug, Clone)]
pub struct Label {
    pub time: f64,
    pub text: String,
}

/// One node of the reconstructed thread forest.
///
/// Mutable while the reducer runs, immutable afterwards except for the `y`
/// layout coordinate, which an external layout pass owns.
#[derive(Debug)]
pub struct Thread {
    pub(crate) id: ThreadId,
    pub(crate) kind: ThreadKind,
    pub(crate) start_time: f64,
    pub(crate) end_time: f64,
    pub(crate) resolved: bool,
    pub(crate) failure: Option<String>,
    pub(crate) children: Vec<ThreadIndex>,
    pub(crate) becomes: Option<ThreadIndex>,
    pub(crate) labels: Vec<Label>,
    pub(crate) interactions: Vec<Interaction>,
    pub(crate) activations: Vec<Activation>,
    /// Most recent time someone signalled (woke) this thread, if ever.
    /// Feeds end-time inference for threads that never terminate.
    pub(crate) last_signalled: Option<f64>,
    pub(crate) y: f64,
    pub(crate) show_creation: bool,
}

impl Thread {
    pub(crate) fn new(id: ThreadId, kind: ThreadKind, start_time: f64) -> Self {
        Self {
            id,
            kind,
            start_time,
            end_time: f64::INFINITY,
            resolved: false,
            failure: None,
            children: Vec::new(),
            becomes: None,
            labels: Vec::new(),
            interactions: Vec::new(),
            activations: Vec::new(),
            last_signalled: None,
            y: 0.0,
            show_creation: true,
        }
    }

    #[must_use]
    pub fn id(&self) -> ThreadId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> ThreadKind {
        self.kind
    }

    #[must_use]
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    #[must_use]
    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    /// Whether a terminating event (`Resolves`/`Becomes`) was observed.
    #[must_use]
    pub fn resolved(&self) -> bool {
        self.resolved
    }

    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Threads this one directly created, in creation order.
    #[must_use]
    pub fn children(&self) -> &[ThreadIndex] {
        &self.children
    }

    /// Replacement thread continuing this one's identity, if any.
    #[must_use]
    pub fn becomes(&self) -> Option<ThreadIndex> {
        self.becomes
    }

    #[must_use]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    #[must_use]
    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    #[must_use]
    pub fn activations(&self) -> &[Activation] {
        &self.activations
    }

    /// Layout coordinate, owned by the external layout pass.
    #[must_use]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Whether the creation of this thread should be drawn. Cleared by the
    /// bind-simplification pass for wakeup-only synchronization threads.
    #[must_use]
    pub fn show_creation(&self) -> bool {
        self.show_creation
    }

    /// Total order used by external layout: `y` ascending, ties broken by
    /// id ascending.
    #[must_use]
    pub fn display_cmp(&self, other: &Thread) -> Ordering {
        self.y.total_cmp(&other.y).then_with(|| self.id.cmp(&other.id))
    }
}

/// Named numeric time series built from `Increases` events.
///
/// Values are a monotone step function of the signed deltas, with `min`/`max`
/// bounding every observed value and seeded at 0 (the implicit value before
/// the first delta).
#[derive(Debug)]
pub struct Counter {
    pub(crate) name: String,
    pub(crate) samples: Vec<(f64, i64)>,
    pub(crate) min: i64,
    pub(crate) max: i64,
}

impl Counter {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Chronological `(time, value)` pairs.
    #[must_use]
    pub fn samples(&self) -> &[(f64, i64)] {
        &self.samples
    }

    #[must_use]
    pub fn min(&self) -> i64 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> i64 {
        self.max
    }
}

/// The whole reconstructed trace universe.
///
/// Holds the thread arena rooted at the synthetic top thread (id `-1`,
/// "no thread running"), the GC pause periods, and the counters.
#[derive(Debug)]
pub struct Vat {
    pub(crate) threads: Vec<Thread>,
    pub(crate) by_id: HashMap<ThreadId, ThreadIndex>,
    pub(crate) gc_periods: Vec<(f64, f64)>,
    pub(crate) counters: Vec<Counter>,
}

impl Vat {
    /// Arena index of the synthetic top thread.
    pub const TOP: ThreadIndex = ThreadIndex(0);

    pub(crate) fn new() -> Self {
        let mut top = Thread::new(ThreadId::TOP, ThreadKind::Preexisting, 0.0);
        top.end_time = 0.0; // grows to span the whole trace as events arrive
        Self {
            threads: vec![top],
            by_id: HashMap::from([(ThreadId::TOP, Vat::TOP)]),
            gc_periods: Vec::new(),
            counters: Vec::new(),
        }
    }

    /// The synthetic root representing the pre-existing top-level context.
    #[must_use]
    pub fn top(&self) -> &Thread {
        &self.threads[Vat::TOP.0]
    }

    #[must_use]
    pub fn thread(&self, index: ThreadIndex) -> &Thread {
        &self.threads[index.0]
    }

    pub(crate) fn thread_mut(&mut self, index: ThreadIndex) -> &mut Thread {
        &mut self.threads[index.0]
    }

    /// All thread records in arena order (top thread first).
    pub fn threads(&self) -> impl Iterator<Item = &Thread> {
        self.threads.iter()
    }

    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Resolve a wire id to its canonical thread, following the full
    /// `becomes` chain.
    #[must_use]
    pub fn lookup(&self, id: ThreadId) -> Option<ThreadIndex> {
        self.by_id.get(&id).map(|&index| self.canonical(index))
    }

    /// Follow the `becomes` chain from `index` to its terminus.
    ///
    /// Chains are acyclic by construction (each thread gets at most one
    /// `becomes` target, and a target is always a distinct, later identity),
    /// so the walk is bounded by the arena size.
    #[must_use]
    pub fn canonical(&self, index: ThreadIndex) -> ThreadIndex {
        let mut current = index;
        for _ in 0..self.threads.len() {
            match self.threads[current.0].becomes {
                Some(next) => current = next,
                None => return current,
            }
        }
        current
    }

    /// GC pause periods as `(start, end)` seconds.
    #[must_use]
    pub fn gc_periods(&self) -> &[(f64, f64)] {
        &self.gc_periods
    }

    #[must_use]
    pub fn counters(&self) -> &[Counter] {
        &self.counters
    }

    #[must_use]
    pub fn counter(&self, name: &str) -> Option<&Counter> {
        self.counters.iter().find(|c| c.name == name)
    }

    /// Trace duration in seconds (the top thread spans the whole trace).
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.top().end_time
    }

    /// Store the layout coordinate computed by an external layout pass.
    pub fn set_y(&mut self, index: ThreadIndex, y: f64) {
        self.threads[index.0].y = y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_vat_has_only_the_top_thread() {
        let vat = Vat::new();
        assert_eq!(vat.thread_count(), 1);
        assert_eq!(vat.top().id(), ThreadId::TOP);
        assert_eq!(vat.top().kind(), ThreadKind::Preexisting);
        assert_eq!(vat.lookup(ThreadId::TOP), Some(Vat::TOP));
        assert_eq!(vat.lookup(ThreadId(3)), None);
    }

    #[test]
    fn test_display_cmp_orders_by_y_then_id() {
        let mut a = Thread::new(ThreadId(1), ThreadKind::Task, 0.0);
        let mut b = Thread::new(ThreadId(2), ThreadKind::Task, 0.0);
        a.y = 1.0;
        b.y = 2.0;
        assert_eq!(a.display_cmp(&b), Ordering::Less);
        b.y = 1.0;
        assert_eq!(a.display_cmp(&b), Ordering::Less);
        assert_eq!(b.display_cmp(&a), Ordering::Greater);
    }
}
