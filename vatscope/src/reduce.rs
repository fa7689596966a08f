//! # Thread-Model Reducer
//!
//! Folds the decoded event sequence into a fully-populated [`Vat`].
//!
//! ## Fold state
//!
//! - the growing thread arena and its id registry (inside the `Vat`)
//! - `running`: the thread holding the single cooperative execution context,
//!   with the time it was switched in
//! - a name-to-index map for the counters under construction
//!
//! The traced program is concurrent; this fold is not. One left-to-right
//! pass, no locks, fail-fast on the first structural violation.
//!
//! ## Time
//!
//! Wire timestamps are nanoseconds since an arbitrary epoch. The first
//! event's timestamp becomes t = 0.0 and everything else is converted to
//! f64 seconds relative to it.

// Nanosecond-to-second conversions intentionally lose precision
#![allow(clippy::cast_precision_loss)]

use std::collections::HashMap;

use log::{debug, warn};

use crate::decode::{Event, EventBody, ThreadKind};
use crate::domain::{ModelError, ThreadId, ThreadIndex};
use crate::vat::{Activation, Counter, Interaction, InteractionKind, Label, Thread, Vat};

/// Padding added to an inferred end time so a thread that never terminated
/// still renders as a finite-lived entity (1 microsecond).
const END_EPSILON: f64 = 1e-6;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Fold `events` into a [`Vat`]. Fails on an empty sequence, a duplicate or
/// reserved id in a `Creates`, or a second `Becomes` on one thread.
pub fn reduce(events: &[Event]) -> Result<Vat, ModelError> {
    let first = events.first().ok_or(ModelError::EmptyTrace)?;
    let mut reducer = Reducer::new(first.timestamp_ns);

    for (index, event) in events.iter().enumerate() {
        reducer.apply(index, event)?;
    }

    let vat = reducer.finish();
    debug!(
        "reduced {} events into {} threads, {} counters, {} gc periods over {:.6}s",
        events.len(),
        vat.thread_count(),
        vat.counters().len(),
        vat.gc_periods().len(),
        vat.duration()
    );
    Ok(vat)
}

/// Explicit reduction state threaded through the fold.
struct Reducer {
    vat: Vat,
    /// `(switched_in_at, thread)` for the thread currently executing, if any.
    running: Option<(f64, ThreadIndex)>,
    counter_index: HashMap<String, usize>,
    epoch_ns: u64,
}

impl Reducer {
    fn new(epoch_ns: u64) -> Self {
        Self { vat: Vat::new(), running: None, counter_index: HashMap::new(), epoch_ns }
    }

    /// Seconds since the first event. Timestamps are clamped at the epoch;
    /// packet reordering guarantees payload order, and within that order the
    /// first record is the earliest.
    fn seconds(&self, timestamp_ns: u64) -> f64 {
        if timestamp_ns >= self.epoch_ns {
            (timestamp_ns - self.epoch_ns) as f64 / NANOS_PER_SEC
        } else {
            0.0
        }
    }

    fn apply(&mut self, index: usize, event: &Event) -> Result<(), ModelError> {
        let t = self.seconds(event.timestamp_ns);

        // The top thread always spans the whole trace.
        let top = self.vat.thread_mut(Vat::TOP);
        top.end_time = top.end_time.max(t);

        match &event.body {
            EventBody::Creates { parent, child, kind } => {
                self.on_creates(index, t, *parent, *child, *kind)?;
            }
            EventBody::Reads { reader, source } => self.on_reads(t, *reader, *source),
            EventBody::Resolves { resolver, target, failure } => {
                self.on_resolves(t, *resolver, *target, failure.clone());
            }
            EventBody::Becomes { old, new } => self.on_becomes(index, t, *old, *new)?,
            EventBody::Label { thread, text } => {
                // Labels on the top-level context are dropped: there is no
                // drawable thread to attach them to.
                if !thread.is_top() {
                    let target = self.resolve(*thread);
                    self.vat
                        .thread_mut(target)
                        .labels
                        .push(Label { time: t, text: text.clone() });
                }
            }
            EventBody::Switch { thread } => {
                let next = self.resolve(*thread);
                self.switch_to(Some(next), t);
            }
            EventBody::Gc { duration_ns } => {
                let duration = *duration_ns as f64 / NANOS_PER_SEC;
                // The record's timestamp marks the end of the pause.
                self.vat.gc_periods.push((t - duration, t));
            }
            EventBody::Increases { thread, counter, amount } => {
                self.on_increases(t, *thread, counter, *amount);
            }
        }
        Ok(())
    }

    fn on_creates(
        &mut self,
        index: usize,
        t: f64,
        parent: ThreadId,
        child: ThreadId,
        kind: ThreadKind,
    ) -> Result<(), ModelError> {
        let parent = self.resolve(parent);
        if self.vat.by_id.contains_key(&child) {
            return Err(ModelError::DuplicateThreadId { id: child, event: index });
        }
        if child.0 < 0 {
            return Err(ModelError::ReservedId { id: child, event: index });
        }

        let created = self.register(Thread::new(child, kind, t));
        self.vat.thread_mut(parent).children.push(created);
        Ok(())
    }

    fn on_reads(&mut self, t: f64, reader: ThreadId, source: ThreadId) {
        let reader = self.resolve(reader);
        let source = self.resolve(source);

        // A read means the reader holds the execution context right now.
        self.switch_to(Some(reader), t);

        self.vat.thread_mut(reader).interactions.push(Interaction {
            time: t,
            kind: InteractionKind::Read,
            other: source,
        });
        // Reciprocal wake edge: the source will signal the blocked reader
        // when it fires.
        self.vat.thread_mut(source).interactions.push(Interaction {
            time: t,
            kind: InteractionKind::Signal,
            other: reader,
        });
        self.vat.thread_mut(reader).last_signalled = Some(t);
    }

    fn on_resolves(&mut self, t: f64, resolver: ThreadId, target: ThreadId, failure: Option<String>) {
        let resolver = self.resolve(resolver);
        let target = self.resolve(target);

        self.vat.thread_mut(resolver).interactions.push(Interaction {
            time: t,
            kind: InteractionKind::Resolve,
            other: target,
        });

        let thread = self.vat.thread_mut(target);
        if thread.resolved {
            // The original tracer can emit a second resolution for one
            // thread; the later one wins. Worth flagging, not worth dying.
            warn!("thread {} resolved twice (second at t={t:.9})", thread.id);
        }
        thread.failure = failure;
        thread.end_time = t;
        thread.resolved = true;
    }

    fn on_becomes(
        &mut self,
        index: usize,
        t: f64,
        old: ThreadId,
        new: ThreadId,
    ) -> Result<(), ModelError> {
        let old = self.resolve(old);
        // The new identity is looked up directly, never chased through its
        // own becomes chain.
        let new = match self.vat.by_id.get(&new) {
            Some(&existing) => existing,
            None => self.materialize_preexisting(new),
        };

        let thread = self.vat.thread_mut(old);
        thread.end_time = t;
        thread.resolved = true;
        if thread.becomes.is_some() {
            return Err(ModelError::DuplicateBecomes { id: thread.id, event: index });
        }
        thread.becomes = Some(new);

        // The replacement inherits the execution context.
        if self.running.is_some_and(|(_, running)| running == old) {
            self.switch_to(Some(new), t);
        }
        Ok(())
    }

    fn on_increases(&mut self, t: f64, thread: ThreadId, counter: &str, amount: i64) {
        let thread = self.resolve(thread);

        let slot = match self.counter_index.get(counter) {
            Some(&slot) => slot,
            None => {
                let slot = self.vat.counters.len();
                self.vat.counters.push(Counter {
                    name: counter.to_string(),
                    samples: Vec::new(),
                    min: 0,
                    max: 0,
                });
                self.counter_index.insert(counter.to_string(), slot);
                slot
            }
        };

        let series = &mut self.vat.counters[slot];
        let value = series.samples.last().map_or(0, |&(_, v)| v) + amount;
        series.samples.push((t, value));

        // The counting thread gets a synthesized annotation, e.g. "bytes+512".
        self.vat
            .thread_mut(thread)
            .labels
            .push(Label { time: t, text: format!("{counter}{amount:+}") });
    }

    /// Registry lookup for a wire id, materializing a synthetic preexisting
    /// thread if the id was never created, then following the `becomes`
    /// chain to its canonical terminus.
    fn resolve(&mut self, id: ThreadId) -> ThreadIndex {
        match self.vat.by_id.get(&id) {
            Some(&index) => self.vat.canonical(index),
            None => self.materialize_preexisting(id),
        }
    }

    /// An id referenced before its `Creates` implies the thread existed
    /// before the capture began: park it under the top thread, starting at
    /// trace start.
    fn materialize_preexisting(&mut self, id: ThreadId) -> ThreadIndex {
        let index = self.register(Thread::new(id, ThreadKind::Preexisting, 0.0));
        self.vat.thread_mut(Vat::TOP).children.push(index);
        index
    }

    fn register(&mut self, thread: Thread) -> ThreadIndex {
        let index = ThreadIndex(self.vat.threads.len());
        self.vat.by_id.insert(thread.id, index);
        self.vat.threads.push(thread);
        index
    }

    /// Scheduler switch: hand the single execution context to `next` at
    /// time `t`, closing the previous holder's activation at
    /// `min(t, its end_time)`. Activation intervals therefore never overlap
    /// across threads and never extend past a thread's own end.
    fn switch_to(&mut self, next: Option<ThreadIndex>, t: f64) {
        if self.running.map(|(_, index)| index) == next {
            return;
        }
        if let Some((start, previous)) = self.running.take() {
            let thread = self.vat.thread_mut(previous);
            let end = t.min(thread.end_time);
            thread.activations.push(Activation { start, end });
        }
        self.running = next.map(|index| (t, index));
    }

    /// Close out the model: final switch to "nothing running", end-time
    /// inference, label normalization, deterministic ordering of the
    /// preexisting children, counter bounds.
    fn finish(mut self) -> Vat {
        let trace_end = self.vat.top().end_time;
        self.switch_to(None, trace_end);

        // Two passes: end inference reads other threads' start times, label
        // fixup only touches the thread itself.
        let arena_len = self.vat.threads.len();
        for index in 1..arena_len {
            if self.vat.threads[index].end_time.is_infinite() {
                let inferred = last_event_time(&self.vat.threads, &self.vat.threads[index]);
                self.vat.threads[index].end_time = inferred + END_EPSILON;
            }
        }

        for index in 1..arena_len {
            let thread = &mut self.vat.threads[index];
            if let Some(failure) = thread.failure.clone() {
                let time = thread.end_time;
                thread.labels.push(Label { time, text: failure });
            }
            if thread.labels.is_empty() {
                let fallback = Label { time: thread.start_time, text: thread.id.0.to_string() };
                thread.labels.push(fallback);
            }
        }

        // Preexisting threads were discovered in reference order, which is
        // not deterministic across captures; sort the top thread's children
        // by id so replay is stable. All other children lists already
        // reflect true creation order.
        let mut top_children = std::mem::take(&mut self.vat.threads[Vat::TOP.0].children);
        top_children.sort_by_key(|&child| self.vat.threads[child.0].id);
        self.vat.threads[Vat::TOP.0].children = top_children;

        for counter in &mut self.vat.counters {
            counter.min = counter.samples.iter().map(|&(_, v)| v).fold(0, i64::min);
            counter.max = counter.samples.iter().map(|&(_, v)| v).fold(0, i64::max);
        }

        self.vat
    }
}

/// Latest time at which anything was observed about this thread: its own
/// start, its most recent child's start, its replacement's start, the last
/// label, interaction, or activation, and the last time it was signalled.
fn last_event_time(threads: &[Thread], thread: &Thread) -> f64 {
    let mut last = thread.start_time;
    if let Some(&child) = thread.children.last() {
        last = last.max(threads[child.0].start_time);
    }
    if let Some(becomes) = thread.becomes {
        last = last.max(threads[becomes.0].start_time);
    }
    if let Some(label) = thread.labels.last() {
        last = last.max(label.time);
    }
    if let Some(interaction) = thread.interactions.last() {
        last = last.max(interaction.time);
    }
    if let Some(activation) = thread.activations.last() {
        last = last.max(activation.end);
    }
    if let Some(signalled) = thread.last_signalled {
        last = last.max(signalled);
    }
    last
}
