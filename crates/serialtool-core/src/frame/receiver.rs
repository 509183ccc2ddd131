//! Marker-delimited frame receiver
//!
//! An incremental state machine that scans a byte stream for a start marker,
//! collects payload bytes into a [`FrameBuffer`] and completes the frame on
//! the end marker. Completion copies the frame into a single completed slot
//! and raises a "new data" flag which is cleared by
//! [`FrameReceiver::take_frame`]. A newer completed frame replaces an
//! untaken one; a frame still being received is never handed out.

use serde::{Deserialize, Serialize};

use super::FrameBuffer;

/// Start and end marker bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerPair {
    /// Byte that opens a frame
    pub start: u8,
    /// Byte that closes a frame
    pub end: u8,
}

impl MarkerPair {
    /// Create a marker pair
    pub const fn new(start: u8, end: u8) -> Self {
        Self { start, end }
    }
}

impl Default for MarkerPair {
    fn default() -> Self {
        Self::new(b'<', b'>')
    }
}

/// Receiver state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiverState {
    /// Scanning for the start marker, discarding everything else
    Idle,
    /// Collecting payload until the end marker
    Receiving,
}

/// Incremental frame extractor
#[derive(Debug, Clone)]
pub struct FrameReceiver {
    markers: MarkerPair,
    state: ReceiverState,
    buffer: FrameBuffer,
    /// Last completed frame, stable while the next one is received
    completed: Vec<u8>,
    /// True while a completed frame has not been taken
    new_data: bool,
    /// Frames completed since construction
    frames_completed: u64,
}

impl FrameReceiver {
    /// Create a receiver with the given markers and frame capacity.
    ///
    /// A zero capacity is raised to one byte; see [`FrameBuffer::new`].
    pub fn new(markers: MarkerPair, capacity: usize) -> Self {
        let buffer = FrameBuffer::new(capacity);
        Self {
            markers,
            state: ReceiverState::Idle,
            completed: Vec::with_capacity(buffer.capacity()),
            buffer,
            new_data: false,
            frames_completed: 0,
        }
    }

    /// Marker pair this receiver was built with
    pub fn markers(&self) -> MarkerPair {
        self.markers
    }

    /// Current state
    pub fn state(&self) -> ReceiverState {
        self.state
    }

    /// Whether a completed frame is waiting to be taken
    pub fn has_new_data(&self) -> bool {
        self.new_data
    }

    /// Frames completed since construction
    pub fn frames_completed(&self) -> u64 {
        self.frames_completed
    }

    /// The in-progress frame buffer
    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    /// Feed one byte. Returns `true` if this byte completed a frame.
    ///
    /// The Receiving check runs first, so a start marker inside a frame is
    /// stored as payload rather than restarting the frame.
    pub fn feed(&mut self, byte: u8) -> bool {
        match self.state {
            ReceiverState::Receiving if byte == self.markers.end => {
                self.buffer.terminate();
                self.completed.clear();
                self.completed.extend_from_slice(self.buffer.as_bytes());
                self.state = ReceiverState::Idle;
                self.new_data = true;
                self.frames_completed += 1;
                if self.buffer.overflowed() {
                    tracing::debug!(
                        capacity = self.buffer.capacity(),
                        "frame exceeded buffer capacity, tail overwritten"
                    );
                }
                true
            }
            ReceiverState::Receiving => {
                self.buffer.push(byte);
                false
            }
            ReceiverState::Idle if byte == self.markers.start => {
                self.buffer.reset();
                self.state = ReceiverState::Receiving;
                false
            }
            ReceiverState::Idle => false,
        }
    }

    /// Feed bytes until a frame completes or the slice is exhausted.
    ///
    /// Returns the number of bytes consumed; bytes after a completed frame
    /// are left for the next call.
    pub fn feed_slice(&mut self, bytes: &[u8]) -> usize {
        for (i, &byte) in bytes.iter().enumerate() {
            if self.feed(byte) {
                return i + 1;
            }
        }
        bytes.len()
    }

    /// Clear the new-data flag, returning the completed frame if it was set.
    pub fn take_frame(&mut self) -> Option<&[u8]> {
        if !self.new_data {
            return None;
        }
        self.new_data = false;
        Some(&self.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receiver() -> FrameReceiver {
        FrameReceiver::new(MarkerPair::new(b'<', b'>'), 16)
    }

    #[test]
    fn test_extracts_payload_between_markers() {
        let mut rx = receiver();
        let consumed = rx.feed_slice(b"<HELLO>");
        assert_eq!(consumed, 7);
        assert_eq!(rx.take_frame(), Some(&b"HELLO"[..]));
    }

    #[test]
    fn test_discards_noise_before_start() {
        let mut rx = receiver();
        rx.feed_slice(b"junk>\r\n<OK>");
        assert_eq!(rx.take_frame(), Some(&b"OK"[..]));
    }

    #[test]
    fn test_start_marker_inside_frame_is_payload() {
        let mut rx = receiver();
        rx.feed_slice(b"<AB<CD>");
        assert_eq!(rx.take_frame(), Some(&b"AB<CD"[..]));
    }

    #[test]
    fn test_stops_after_completed_frame() {
        let mut rx = receiver();
        let input = b"<A><B>";
        let consumed = rx.feed_slice(input);
        assert_eq!(consumed, 3);
        assert_eq!(rx.take_frame(), Some(&b"A"[..]));

        let consumed = rx.feed_slice(&input[consumed..]);
        assert_eq!(consumed, 3);
        assert_eq!(rx.take_frame(), Some(&b"B"[..]));
    }

    #[test]
    fn test_take_frame_clears_flag() {
        let mut rx = receiver();
        rx.feed_slice(b"<X>");
        assert!(rx.has_new_data());
        assert!(rx.take_frame().is_some());
        assert!(!rx.has_new_data());
        assert!(rx.take_frame().is_none());
    }

    #[test]
    fn test_unconsumed_frame_is_overwritten() {
        let mut rx = receiver();
        rx.feed_slice(b"<FIRST>");
        rx.feed_slice(b"<SECOND>");
        assert_eq!(rx.frames_completed(), 2);
        assert_eq!(rx.take_frame(), Some(&b"SECOND"[..]));
        assert!(rx.take_frame().is_none());
    }

    #[test]
    fn test_partial_frame_never_replaces_completed_one() {
        let mut rx = receiver();
        rx.feed_slice(b"<OK>");
        rx.feed_slice(b"<ERR");
        assert_eq!(rx.state(), ReceiverState::Receiving);
        assert!(rx.has_new_data());
        assert_eq!(rx.take_frame(), Some(&b"OK"[..]));
        assert!(rx.take_frame().is_none());

        rx.feed_slice(b"OR>");
        assert_eq!(rx.take_frame(), Some(&b"ERROR"[..]));
    }

    #[test]
    fn test_zero_capacity_holds_one_byte() {
        let mut rx = FrameReceiver::new(MarkerPair::new(b'<', b'>'), 0);
        rx.feed_slice(b"<ABC>");
        assert_eq!(rx.take_frame(), Some(&b"C"[..]));
    }

    #[test]
    fn test_empty_frame() {
        let mut rx = receiver();
        rx.feed_slice(b"<>");
        assert_eq!(rx.take_frame(), Some(&b""[..]));
    }

    #[test]
    fn test_partial_frame_spans_calls() {
        let mut rx = receiver();
        rx.feed_slice(b"xx<HEL");
        assert_eq!(rx.state(), ReceiverState::Receiving);
        assert!(rx.take_frame().is_none());
        rx.feed_slice(b"LO>");
        assert_eq!(rx.state(), ReceiverState::Idle);
        assert_eq!(rx.take_frame(), Some(&b"HELLO"[..]));
    }

    #[test]
    fn test_overflow_keeps_final_byte() {
        let mut rx = FrameReceiver::new(MarkerPair::new(b'<', b'>'), 4);
        rx.feed_slice(b"<123456789>");
        assert_eq!(rx.take_frame(), Some(&b"1239"[..]));
    }
}
