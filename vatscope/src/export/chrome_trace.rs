//! Chrome Trace Event export for a reconstructed vat
//!
//! Pure serialization of an already-built model: activations become "X"
//! complete events on a per-thread lane, GC pauses land on a dedicated
//! lane, counters become "C" counter events, and each lane gets a "M"
//! metadata event carrying a readable thread name. No layout and no visual
//! policy, just the facts.
//!
//! Format spec:
//! https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU/preview

// Seconds-to-microseconds conversion intentionally uses f64 throughout
#![allow(clippy::cast_precision_loss)]

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::io::Write;

use crate::vat::Vat;

/// Process lane for the traced vat's threads.
const VAT_PID: u32 = 1;

/// Process lane for events that belong to no single thread (GC pauses,
/// counters). A separate process keeps these lanes out of the thread id
/// space, where any `i64` is a legal wire id.
const RUNTIME_PID: u32 = 0;

const MICROS_PER_SEC: f64 = 1_000_000.0;

/// Chrome Trace Event format
#[derive(Debug, Clone, Serialize)]
struct ChromeTraceEvent {
    /// Event name (thread label, counter name, ...)
    name: String,
    /// Category for filtering/coloring
    cat: String,
    /// Phase: "X" = complete, "C" = counter, "M" = metadata
    ph: String,
    /// Timestamp in microseconds
    ts: f64,
    /// Duration in microseconds ("X" events only)
    #[serde(skip_serializing_if = "Option::is_none")]
    dur: Option<f64>,
    /// Process ID ([`VAT_PID`] for threads, [`RUNTIME_PID`] for GC/counters)
    pid: u32,
    /// Thread ID (the traced thread's wire id)
    tid: i64,
    /// Optional arguments (metadata)
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<HashMap<String, JsonValue>>,
}

/// Chrome Trace Format container
#[derive(Debug, Serialize)]
struct ChromeTrace {
    #[serde(rename = "traceEvents")]
    trace_events: Vec<ChromeTraceEvent>,
    #[serde(rename = "displayTimeUnit")]
    display_time_unit: String,
}

/// Chrome trace exporter for a reconstructed vat.
pub struct ChromeTraceExporter<'a> {
    vat: &'a Vat,
}

impl<'a> ChromeTraceExporter<'a> {
    #[must_use]
    pub fn new(vat: &'a Vat) -> Self {
        Self { vat }
    }

    fn events(&self) -> Vec<ChromeTraceEvent> {
        let mut events = Vec::new();

        for thread in self.vat.threads() {
            let tid = thread.id().0;
            let display_name = thread
                .labels()
                .first()
                .map_or_else(|| thread.id().to_string(), |label| label.text.clone());

            // Lane name metadata
            let mut args = HashMap::new();
            args.insert(
                "name".to_string(),
                serde_json::json!(format!("{} {}", thread.kind(), display_name)),
            );
            events.push(ChromeTraceEvent {
                name: "thread_name".to_string(),
                cat: String::new(),
                ph: "M".to_string(),
                ts: 0.0,
                dur: None,
                pid: VAT_PID,
                tid,
                args: Some(args),
            });

            for activation in thread.activations() {
                let mut args = HashMap::new();
                args.insert("thread_id".to_string(), serde_json::json!(tid));
                if let Some(failure) = thread.failure() {
                    args.insert("failure".to_string(), serde_json::json!(failure));
                }
                events.push(ChromeTraceEvent {
                    name: display_name.clone(),
                    cat: thread.kind().to_string(),
                    ph: "X".to_string(),
                    ts: activation.start * MICROS_PER_SEC,
                    dur: Some((activation.end - activation.start) * MICROS_PER_SEC),
                    pid: VAT_PID,
                    tid,
                    args: Some(args),
                });
            }
        }

        for &(start, end) in self.vat.gc_periods() {
            events.push(ChromeTraceEvent {
                name: "gc".to_string(),
                cat: "gc".to_string(),
                ph: "X".to_string(),
                ts: start * MICROS_PER_SEC,
                dur: Some((end - start) * MICROS_PER_SEC),
                pid: RUNTIME_PID,
                tid: 0,
                args: None,
            });
        }

        for counter in self.vat.counters() {
            for &(time, value) in counter.samples() {
                let mut args = HashMap::new();
                args.insert("value".to_string(), serde_json::json!(value));
                events.push(ChromeTraceEvent {
                    name: counter.name().to_string(),
                    cat: "counter".to_string(),
                    ph: "C".to_string(),
                    ts: time * MICROS_PER_SEC,
                    dur: None,
                    pid: RUNTIME_PID,
                    tid: 0,
                    args: Some(args),
                });
            }
        }

        events
    }

    /// Export the trace to any writer (file, stdout, buffer, etc.)
    ///
    /// Accepts any type implementing `Write`, which keeps tests on
    /// in-memory buffers and production on files.
    pub fn export<W: Write>(&self, writer: W) -> Result<()> {
        let trace = ChromeTrace {
            trace_events: self.events(),
            display_time_unit: "ms".to_string(),
        };

        serde_json::to_writer_pretty(writer, &trace).context("Failed to write trace JSON")?;
        Ok(())
    }

    /// Number of events the export will contain.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events().len()
    }
}
