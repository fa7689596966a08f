//! Packet decoder for the ring-buffered trace log
//!
//! The capture file is a sequence of fixed-header packets written into a
//! circular buffer, so physical file order and logical write order can
//! disagree. This module validates every header, extracts the payload byte
//! ranges, and restores logical order from the wrapping sequence counter.
//!
//! ## Packet layout (30-byte header)
//!
//! ```text
//! offset  size  field
//!      0     4  magic 0xc1fc1fc1 (LE)
//!      4    16  trace UUID
//!     20     4  packet size in bits (LE)
//!     24     2  wrapping sequence counter (LE)
//!     26     4  content size in bits (LE, includes this header)
//!     30   ...  event records (content_size/8 - 30 bytes)
//! ```
//!
//! Any header validation failure aborts the whole load: a corrupt capture
//! cannot be trusted to delimit events correctly.

use std::ops::Range;

use crate::decode::cursor::Cursor;
use crate::domain::{FormatError, SeqNo};

/// Packet header magic number, little-endian on the wire.
pub const MAGIC: u32 = 0xc1fc_1fc1;

/// Fixed protocol UUID every packet must carry.
pub const VAT_TRACE_UUID: [u8; 16] = [
    0x8f, 0x9a, 0x6b, 0x5e, 0x63, 0xd4, 0x4c, 0x4f, //
    0xb2, 0x0a, 0x50, 0x6c, 0x7e, 0x42, 0xd9, 0x1f,
];

/// Header length in bytes.
pub const HEADER_BYTES: usize = 30;

const HEADER_BITS: u32 = (HEADER_BYTES as u32) * 8;

/// Threshold on the wrapped counter delta that marks the ring's oldest packet.
const WRAP_JUMP: u16 = 0x8000;

/// A validated packet: its sequence number and the payload's byte range in
/// the original buffer.
#[derive(Debug, Clone)]
pub struct Packet {
    pub seq: SeqNo,
    pub payload: Range<usize>,
}

/// Validate and extract all packets from `buf`, returned in logical order.
///
/// Ordering is recovered by walking the packets in file order and looking for
/// the one place where the sequence counter jumps backwards by more than
/// [`WRAP_JUMP`]: that packet is the logically earliest one. Every counter is
/// then rebased against it and the packets sorted by rebased counter. If no
/// such jump exists the file already starts at the earliest packet.
///
/// The heuristic tolerates exactly one counter wrap inside the captured
/// window. A capture long enough to wrap the 16-bit counter twice is not
/// distinguishable from a shorter one and will come out misordered.
pub fn decode_packets(buf: &[u8]) -> Result<Vec<Packet>, FormatError> {
    let mut packets = Vec::new();
    let mut offset = 0usize;

    while offset < buf.len() {
        let have = buf.len() - offset;
        if have < HEADER_BYTES {
            return Err(FormatError::TruncatedPacket { offset, need: HEADER_BYTES, have });
        }

        let mut header = Cursor::new(&buf[offset..], offset);
        let magic = header.u32_le()?;
        if magic != MAGIC {
            return Err(FormatError::BadMagic { offset, found: magic });
        }
        if header.bytes(16)? != VAT_TRACE_UUID {
            return Err(FormatError::UuidMismatch { offset });
        }
        let packet_bits = header.u32_le()?;
        let seq = SeqNo(header.u16_le()?);
        let content_bits = header.u32_le()?;

        if packet_bits % 8 != 0
            || content_bits % 8 != 0
            || content_bits < HEADER_BITS
            || content_bits > packet_bits
        {
            return Err(FormatError::InvalidPacketSize { offset, packet_bits, content_bits });
        }

        let packet_bytes = (packet_bits / 8) as usize;
        let content_bytes = (content_bits / 8) as usize;
        if packet_bytes > have {
            return Err(FormatError::TruncatedPacket { offset, need: packet_bytes, have });
        }

        packets.push(Packet {
            seq,
            payload: offset + HEADER_BYTES..offset + content_bytes,
        });
        offset += packet_bytes;
    }

    reorder(&mut packets);
    Ok(packets)
}

/// Restore logical packet order in place (see [`decode_packets`]).
fn reorder(packets: &mut [Packet]) {
    let Some(first) = packets.first() else {
        return;
    };

    // Walk in file order; the first backwards jump in the wrapped counter
    // marks the ring's oldest packet. No jump means the file starts there.
    let mut earliest = first.seq;
    for pair in packets.windows(2) {
        if pair[1].seq.distance(pair[0].seq) > WRAP_JUMP {
            earliest = pair[1].seq;
            break;
        }
    }

    packets.sort_by_key(|p| p.seq.distance(earliest));
}
