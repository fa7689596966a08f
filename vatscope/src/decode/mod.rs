//! Wire-format decoding: raw capture bytes to a typed event sequence
//!
//! Two stages, both fatal on the first violation:
//! - `packet`: validate headers, recover logical packet order from the
//!   wrapping ring-buffer sequence counter.
//! - `event`: parse the concatenated payloads into [`event::Event`] values.

pub mod cursor;
pub mod event;
pub mod packet;

pub use event::{decode_events, Event, EventBody, ThreadKind};
pub use packet::{decode_packets, Packet};
