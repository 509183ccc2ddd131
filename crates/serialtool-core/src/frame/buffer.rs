//! Fixed-capacity frame buffer
//!
//! Holds the frame currently being received. The receiver copies each
//! completed frame out before the next start marker resets it.
//! The buffer never grows: once the write index reaches the last slot it
//! stays there and every further byte overwrites that slot.

/// Fixed-capacity byte buffer with a lossy-tail overflow policy
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    /// Backing storage, allocated once at construction
    data: Vec<u8>,
    /// Next write position, never past `capacity - 1`
    index: usize,
    /// Number of valid bytes in `data`
    len: usize,
    /// Set once a byte has overwritten the last slot
    overflowed: bool,
}

impl FrameBuffer {
    /// Create a buffer holding at most `capacity` bytes.
    ///
    /// A zero capacity is raised to one byte. `ToolConfig::validate` rejects
    /// zero before a `SerialTool` builds its buffer.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity.max(1)],
            index: 0,
            len: 0,
            overflowed: false,
        }
    }

    /// Maximum number of bytes the buffer can hold
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of bytes currently held
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the buffer holds no bytes
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the current frame lost bytes to the overflow clamp
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Append a byte, clamping at the last slot.
    pub fn push(&mut self, byte: u8) {
        let last = self.data.len() - 1;
        if self.len > last && self.index == last {
            self.overflowed = true;
        }
        self.data[self.index] = byte;
        self.len = self.len.max(self.index + 1);
        if self.index < last {
            self.index += 1;
        }
    }

    /// Start a new frame. Old bytes stay in storage but are no longer visible.
    pub fn reset(&mut self) {
        self.index = 0;
        self.len = 0;
        self.overflowed = false;
    }

    /// Mark the current frame as complete by rewinding the write index.
    /// The frame contents remain readable until the next `reset`.
    pub fn terminate(&mut self) {
        self.index = 0;
    }

    /// The valid bytes of the current frame
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }
}
