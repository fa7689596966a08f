//! Trace export functionality
//!
//! This module provides functionality for exporting a reconstructed [`crate::vat::Vat`]
//! to external formats. Currently supports Chrome Trace Event Format for
//! visualization in Perfetto / chrome://tracing.

pub mod chrome_trace;

pub use chrome_trace::ChromeTraceExporter;
