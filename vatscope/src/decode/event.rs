//! Event decoder
//!
//! Turns ordered packet payloads into one chronological sequence of typed
//! events. Each record is an 8-byte nanosecond timestamp, a 1-byte opcode
//! and opcode-specific fields: 8-byte LE thread ids and quantities, 1-byte
//! thread-kind enumerants, and null-terminated strings.
//!
//! Timestamps are nanoseconds since an arbitrary epoch; normalizing to
//! seconds since the first event is the reducer's job, not ours.

use std::fmt;

use crate::decode::cursor::Cursor;
use crate::decode::packet::Packet;
use crate::domain::{FormatError, ThreadId};

// Record opcodes. A closed set: adding a tenth record shape means adding a
// constant here, a variant to `EventBody`, and a match arm in `decode_record`,
// all checked at compile time.
pub const OP_CREATES: u8 = 0;
pub const OP_READS: u8 = 1;
pub const OP_RESOLVES: u8 = 2;
pub const OP_RESOLVES_FAILED: u8 = 3;
pub const OP_BECOMES: u8 = 4;
pub const OP_LABEL: u8 = 5;
pub const OP_SWITCH: u8 = 6;
pub const OP_INCREASES: u8 = 7;
pub const OP_GC: u8 = 8;

/// Classification of a traced thread, from the `Creates` record's enumerant.
///
/// `Preexisting` never appears on the wire: it marks synthetic records for
/// ids referenced before their creation was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadKind {
    Wait,
    Task,
    Bind,
    Try,
    Choose,
    Pick,
    Join,
    Map,
    Condition,
    Preexisting,
}

impl ThreadKind {
    /// Decode the 1-byte wire enumerant.
    pub fn from_wire(value: u8, offset: usize) -> Result<Self, FormatError> {
        match value {
            0 => Ok(ThreadKind::Wait),
            1 => Ok(ThreadKind::Task),
            2 => Ok(ThreadKind::Bind),
            3 => Ok(ThreadKind::Try),
            4 => Ok(ThreadKind::Choose),
            5 => Ok(ThreadKind::Pick),
            6 => Ok(ThreadKind::Join),
            7 => Ok(ThreadKind::Map),
            8 => Ok(ThreadKind::Condition),
            _ => Err(FormatError::UnknownThreadKind { value, offset }),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ThreadKind::Wait => "wait",
            ThreadKind::Task => "task",
            ThreadKind::Bind => "bind",
            ThreadKind::Try => "try",
            ThreadKind::Choose => "choose",
            ThreadKind::Pick => "pick",
            ThreadKind::Join => "join",
            ThreadKind::Map => "map",
            ThreadKind::Condition => "condition",
            ThreadKind::Preexisting => "preexisting",
        }
    }
}

impl fmt::Display for ThreadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single decoded trace event.
#[derive(Debug, Clone)]
pub struct Event {
    /// Nanoseconds since the tracer's (arbitrary) epoch.
    pub timestamp_ns: u64,
    pub body: EventBody,
}

/// One variant per opcode.
#[derive(Debug, Clone)]
pub enum EventBody {
    Creates { parent: ThreadId, child: ThreadId, kind: ThreadKind },
    Reads { reader: ThreadId, source: ThreadId },
    Resolves { resolver: ThreadId, target: ThreadId, failure: Option<String> },
    Becomes { old: ThreadId, new: ThreadId },
    Label { thread: ThreadId, text: String },
    Switch { thread: ThreadId },
    Gc { duration_ns: u64 },
    Increases { thread: ThreadId, counter: String, amount: i64 },
}

/// Decode every record in every payload, in packet order.
pub fn decode_events(buf: &[u8], packets: &[Packet]) -> Result<Vec<Event>, FormatError> {
    let mut events = Vec::new();
    for packet in packets {
        let mut cursor = Cursor::new(&buf[packet.payload.clone()], packet.payload.start);
        while !cursor.is_empty() {
            events.push(decode_record(&mut cursor)?);
        }
    }
    Ok(events)
}

fn decode_record(cursor: &mut Cursor<'_>) -> Result<Event, FormatError> {
    let timestamp_ns = cursor.u64_le()?;
    let opcode_offset = cursor.position();
    let opcode = cursor.u8()?;

    let body = match opcode {
        OP_CREATES => {
            let parent = ThreadId(cursor.i64_le()?);
            let child = ThreadId(cursor.i64_le()?);
            let kind_offset = cursor.position();
            let kind = ThreadKind::from_wire(cursor.u8()?, kind_offset)?;
            EventBody::Creates { parent, child, kind }
        }
        OP_READS => EventBody::Reads {
            reader: ThreadId(cursor.i64_le()?),
            source: ThreadId(cursor.i64_le()?),
        },
        OP_RESOLVES => EventBody::Resolves {
            resolver: ThreadId(cursor.i64_le()?),
            target: ThreadId(cursor.i64_le()?),
            failure: None,
        },
        OP_RESOLVES_FAILED => EventBody::Resolves {
            resolver: ThreadId(cursor.i64_le()?),
            target: ThreadId(cursor.i64_le()?),
            failure: Some(cursor.cstr()?),
        },
        OP_BECOMES => EventBody::Becomes {
            old: ThreadId(cursor.i64_le()?),
            new: ThreadId(cursor.i64_le()?),
        },
        OP_LABEL => EventBody::Label {
            thread: ThreadId(cursor.i64_le()?),
            text: cursor.cstr()?,
        },
        OP_SWITCH => EventBody::Switch { thread: ThreadId(cursor.i64_le()?) },
        OP_INCREASES => EventBody::Increases {
            thread: ThreadId(cursor.i64_le()?),
            counter: cursor.cstr()?,
            amount: cursor.i64_le()?,
        },
        OP_GC => EventBody::Gc { duration_ns: cursor.u64_le()? },
        _ => return Err(FormatError::UnknownOpcode { opcode, offset: opcode_offset }),
    };

    Ok(Event { timestamp_ns, body })
}
