//! Shared helpers for building binary trace captures in tests.

#![allow(dead_code)]

use vatscope::decode::event::{
    OP_BECOMES, OP_CREATES, OP_GC, OP_INCREASES, OP_LABEL, OP_READS, OP_RESOLVES,
    OP_RESOLVES_FAILED, OP_SWITCH,
};
use vatscope::decode::packet::{HEADER_BYTES, MAGIC, VAT_TRACE_UUID};

/// Wire enumerants for thread kinds.
pub const KIND_WAIT: u8 = 0;
pub const KIND_TASK: u8 = 1;
pub const KIND_BIND: u8 = 2;
pub const KIND_TRY: u8 = 3;

/// Serializes event records into a payload byte buffer.
#[derive(Default)]
pub struct EventWriter {
    pub buf: Vec<u8>,
}

impl EventWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn header(&mut self, ts_ns: u64, opcode: u8) {
        self.buf.extend_from_slice(&ts_ns.to_le_bytes());
        self.buf.push(opcode);
    }

    fn id(&mut self, id: i64) {
        self.buf.extend_from_slice(&id.to_le_bytes());
    }

    fn cstr(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
    }

    pub fn creates(&mut self, ts_ns: u64, parent: i64, child: i64, kind: u8) -> &mut Self {
        self.header(ts_ns, OP_CREATES);
        self.id(parent);
        self.id(child);
        self.buf.push(kind);
        self
    }

    pub fn reads(&mut self, ts_ns: u64, reader: i64, source: i64) -> &mut Self {
        self.header(ts_ns, OP_READS);
        self.id(reader);
        self.id(source);
        self
    }

    pub fn resolves(&mut self, ts_ns: u64, resolver: i64, target: i64) -> &mut Self {
        self.header(ts_ns, OP_RESOLVES);
        self.id(resolver);
        self.id(target);
        self
    }

    pub fn resolves_failed(
        &mut self,
        ts_ns: u64,
        resolver: i64,
        target: i64,
        message: &str,
    ) -> &mut Self {
        self.header(ts_ns, OP_RESOLVES_FAILED);
        self.id(resolver);
        self.id(target);
        self.cstr(message);
        self
    }

    pub fn becomes(&mut self, ts_ns: u64, old: i64, new: i64) -> &mut Self {
        self.header(ts_ns, OP_BECOMES);
        self.id(old);
        self.id(new);
        self
    }

    pub fn label(&mut self, ts_ns: u64, thread: i64, text: &str) -> &mut Self {
        self.header(ts_ns, OP_LABEL);
        self.id(thread);
        self.cstr(text);
        self
    }

    pub fn switch(&mut self, ts_ns: u64, thread: i64) -> &mut Self {
        self.header(ts_ns, OP_SWITCH);
        self.id(thread);
        self
    }

    pub fn gc(&mut self, ts_ns: u64, duration_ns: u64) -> &mut Self {
        self.header(ts_ns, OP_GC);
        self.buf.extend_from_slice(&duration_ns.to_le_bytes());
        self
    }

    pub fn increases(&mut self, ts_ns: u64, thread: i64, counter: &str, amount: i64) -> &mut Self {
        self.header(ts_ns, OP_INCREASES);
        self.id(thread);
        self.cstr(counter);
        self.id(amount);
        self
    }

    /// Push a raw opcode with no fields (for corrupt-trace tests).
    pub fn raw_opcode(&mut self, ts_ns: u64, opcode: u8) -> &mut Self {
        self.header(ts_ns, opcode);
        self
    }
}

/// Wrap a payload in a valid packet with the given sequence counter.
pub fn packet(seq: u16, payload: &[u8]) -> Vec<u8> {
    packet_padded(seq, payload, 0)
}

/// Like [`packet`], but with `padding` trailing bytes between the content
/// and the next packet (packet size > content size).
pub fn packet_padded(seq: u16, payload: &[u8], padding: usize) -> Vec<u8> {
    let content_bytes = HEADER_BYTES + payload.len();
    let packet_bytes = content_bytes + padding;

    let mut buf = Vec::with_capacity(packet_bytes);
    buf.extend_from_slice(&MAGIC.to_le_bytes());
    buf.extend_from_slice(&VAT_TRACE_UUID);
    buf.extend_from_slice(&u32::try_from(packet_bytes * 8).unwrap().to_le_bytes());
    buf.extend_from_slice(&seq.to_le_bytes());
    buf.extend_from_slice(&u32::try_from(content_bytes * 8).unwrap().to_le_bytes());
    buf.extend_from_slice(payload);
    buf.resize(packet_bytes, 0xaa);
    buf
}

/// A whole single-packet capture around the given events.
pub fn single_packet_trace(events: &EventWriter) -> Vec<u8> {
    packet(0, &events.buf)
}
