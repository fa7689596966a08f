//! Structured error types for vatscope
//!
//! Using thiserror for automatic Display implementation and error chaining.
//!
//! Two families, matching the two phases of a load:
//! - [`FormatError`]: the byte stream violates the packet/event wire format.
//! - [`ModelError`]: the decoded events violate the thread-model contract.
//!
//! Both are fatal. A trace that fails either check is wholly untrusted and
//! no partial model is returned.

use super::types::ThreadId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Bad magic 0x{found:08x} at offset {offset} (expected 0xc1fc1fc1)")]
    BadMagic { offset: usize, found: u32 },

    #[error("Trace UUID mismatch at offset {offset}")]
    UuidMismatch { offset: usize },

    #[error("Truncated packet at offset {offset}: need {need} bytes, have {have}")]
    TruncatedPacket { offset: usize, need: usize, have: usize },

    #[error(
        "Inconsistent packet sizes at offset {offset}: packet {packet_bits} bits, \
         content {content_bits} bits"
    )]
    InvalidPacketSize { offset: usize, packet_bits: u32, content_bits: u32 },

    #[error("Unexpected end of payload at offset {offset}: need {need} more bytes")]
    UnexpectedEof { offset: usize, need: usize },

    #[error("Unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("Unknown opcode {opcode} at offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },

    #[error("Unknown thread kind {value} at offset {offset}")]
    UnknownThreadKind { value: u8, offset: usize },
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Trace contains no events")]
    EmptyTrace,

    #[error("Thread {id} created twice (event {event})")]
    DuplicateThreadId { id: ThreadId, event: usize },

    #[error("Thread {id} is reserved and cannot be created (event {event})")]
    ReservedId { id: ThreadId, event: usize },

    #[error("Thread {id} already has a becomes target (event {event})")]
    DuplicateBecomes { id: ThreadId, event: usize },
}

/// Umbrella error for the whole load pipeline (file -> packets -> events -> Vat).
#[derive(Error, Debug)]
pub enum TraceError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display() {
        let err = FormatError::BadMagic { offset: 0, found: 0xdead_beef };
        assert_eq!(err.to_string(), "Bad magic 0xdeadbeef at offset 0 (expected 0xc1fc1fc1)");
    }

    #[test]
    fn test_model_error_display() {
        let err = ModelError::DuplicateThreadId { id: ThreadId(42), event: 7 };
        assert!(err.to_string().contains("#42"));
        assert!(err.to_string().contains("event 7"));
    }

    #[test]
    fn test_trace_error_wraps_both_families() {
        let err: TraceError = ModelError::EmptyTrace.into();
        assert_eq!(err.to_string(), "Trace contains no events");

        let err: TraceError = FormatError::UnknownOpcode { opcode: 9, offset: 8 }.into();
        assert!(err.to_string().contains("opcode 9"));
    }
}
