//! # vatscope - Vat Trace Reconstruction
//!
//! vatscope ingests a binary execution trace of a cooperatively scheduled
//! runtime (a ring-buffered log of thread lifecycle events: creation,
//! blocking reads, resolution, identity substitution, labels, scheduler
//! switches, GC pauses, counters) and reconstructs an in-memory causal model
//! of every thread, its timing, and its interactions, ready for a
//! visualization layer to consume.
//!
//! ## Architecture Overview
//!
//! ```text
//! raw capture bytes
//!        │
//!        ▼
//! ┌──────────────┐    ordered     ┌──────────────┐    typed     ┌──────────────┐
//! │    Packet    │───payloads────▶│    Event     │───events────▶│   Reducer    │
//! │   Decoder    │                │   Decoder    │              │  (the fold)  │
//! └──────────────┘                └──────────────┘              └──────┬───────┘
//!   header checks,                  opcode dispatch,                   │
//!   ring reordering                 cstr/LE fields                     ▼
//!                                                               ┌──────────────┐
//!                                  ┌──────────────┐             │     Vat      │
//!                                  │   Simplify   │◀────────────│ (forest, GC, │
//!                                  │  (optional)  │             │  counters)   │
//!                                  └──────────────┘             └──────┬───────┘
//!                                                                      │
//!                                                    external layout / rendering
//! ```
//!
//! ## Module Structure
//!
//! - [`decode`]: wire format. Packet header validation, ring-buffer order
//!   recovery from the wrapping sequence counter, and record parsing into
//!   the closed [`decode::EventBody`] union.
//! - [`reduce`]: the single-pass fold from events to a [`vat::Vat`]:
//!   forward-reference materialization, `becomes` aliasing, activation
//!   bookkeeping, end-time inference.
//! - [`simplify`]: optional post-pass collapsing wakeup-only bind threads.
//! - [`vat`]: the reconstructed model and its read-only query surface.
//! - [`export`]: Chrome Trace Event JSON for Perfetto / chrome://tracing.
//! - [`domain`]: newtypes and structured errors.
//! - [`cli`]: command-line argument parsing.
//!
//! ## Error Model
//!
//! Loading either produces a complete [`vat::Vat`] or fails with a
//! [`domain::TraceError`]; there are no partial results. A capture that
//! fails a header check, carries an unknown opcode, or violates the model
//! contract (duplicate id, duplicate `becomes`) is wholly untrusted.
//!
//! ## Typical Usage
//!
//! ```no_run
//! # fn main() -> Result<(), vatscope::domain::TraceError> {
//! let vat = vatscope::load_trace_file("capture.vtr")?;
//! for thread in vat.threads() {
//!     println!("{} {} [{:.6}, {:.6}]", thread.kind(), thread.id(),
//!              thread.start_time(), thread.end_time());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod decode;
pub mod domain;
pub mod export;
pub mod reduce;
pub mod simplify;
pub mod vat;

use std::path::Path;

use domain::TraceError;
use vat::Vat;

/// Reconstruct a [`Vat`] from a raw capture buffer.
pub fn load_trace(bytes: &[u8]) -> Result<Vat, TraceError> {
    let packets = decode::decode_packets(bytes)?;
    let events = decode::decode_events(bytes, &packets)?;
    let vat = reduce::reduce(&events)?;
    Ok(vat)
}

/// Read a capture file and reconstruct its [`Vat`].
pub fn load_trace_file(path: impl AsRef<Path>) -> Result<Vat, TraceError> {
    let bytes = std::fs::read(path)?;
    load_trace(&bytes)
}
