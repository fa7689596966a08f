//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers prevent common bugs like passing an arena index
//! where a wire-level thread id is expected, and make function signatures
//! more expressive.

use std::fmt;

/// Wire-level thread identifier, as recorded by the tracer.
///
/// Thread ids are 64-bit integers assigned by the traced runtime. The value
/// `-1` is reserved for the pre-existing top-level context and is never a
/// legitimately created id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadId(pub i64);

impl ThreadId {
    /// The pre-existing top-level context ("no thread running").
    pub const TOP: ThreadId = ThreadId(-1);

    /// Returns true if this is the reserved top-level id.
    #[must_use]
    pub fn is_top(self) -> bool {
        self.0 == -1
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<i64> for ThreadId {
    fn from(id: i64) -> Self {
        ThreadId(id)
    }
}

/// Index of a thread record in the `Vat` arena.
///
/// This is distinct from [`ThreadId`] - an id comes from the trace wire
/// format, while an index is a position we assigned during reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadIndex(pub usize);

impl fmt::Display for ThreadIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Wrapping 16-bit packet sequence counter.
///
/// The log writer numbers packets with a counter that wraps at 65536, so
/// ordering decisions must always go through [`SeqNo::distance`] rather than
/// plain comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqNo(pub u16);

impl SeqNo {
    /// Forward distance from `earlier` to `self`, modulo 65536.
    #[must_use]
    pub fn distance(self, earlier: SeqNo) -> u16 {
        self.0.wrapping_sub(earlier.0)
    }
}

impl fmt::Display for SeqNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seq:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_id_is_reserved() {
        assert!(ThreadId::TOP.is_top());
        assert!(!ThreadId(0).is_top());
        assert_eq!(ThreadId::TOP.to_string(), "#-1");
    }

    #[test]
    fn test_seqno_distance_wraps() {
        assert_eq!(SeqNo(1).distance(SeqNo(65535)), 2);
        assert_eq!(SeqNo(65535).distance(SeqNo(0)), 65535);
        assert_eq!(SeqNo(7).distance(SeqNo(7)), 0);
    }
}
