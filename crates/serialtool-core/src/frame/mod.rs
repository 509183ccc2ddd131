//! Marker-delimited framing
//!
//! Extracts frames of the form `<start> payload <end>` from a byte stream.
//! There is no escaping: the end marker can never appear inside a payload,
//! while a start marker inside a payload is kept as an ordinary byte.

mod buffer;
mod receiver;
mod snapshot;

pub use buffer::FrameBuffer;
pub use receiver::{FrameReceiver, MarkerPair, ReceiverState};
pub use snapshot::Snapshot;
