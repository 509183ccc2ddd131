//! Frame snapshots and tokenizing
//!
//! A [`Snapshot`] is an owned copy of the last completed frame. All parsing
//! works on the snapshot so that a frame arriving afterwards cannot change
//! data a caller is still looking at.

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

/// Owned copy of a completed frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    bytes: Vec<u8>,
}

impl Snapshot {
    /// Create a snapshot from frame bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Replace the contents with a new frame, reusing the allocation
    pub(crate) fn refill(&mut self, frame: &[u8]) {
        self.bytes.clear();
        self.bytes.extend_from_slice(frame);
    }

    /// Raw frame bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Frame as text, replacing invalid UTF-8
    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the frame was empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Check if `needle` occurs as a contiguous byte sequence.
    ///
    /// Matching is exact and case-sensitive. An empty needle always matches.
    pub fn contains(&self, needle: &[u8]) -> bool {
        if needle.is_empty() {
            return true;
        }
        if needle.len() > self.bytes.len() {
            return false;
        }
        self.bytes.windows(needle.len()).any(|w| w == needle)
    }

    /// Byte ranges of each token, split on any byte in `delimiters`.
    ///
    /// Runs of delimiters collapse, and leading or trailing delimiters never
    /// produce empty tokens. If no token is found the result is a single
    /// empty range at the end of the snapshot.
    pub fn token_ranges(&self, delimiters: &[u8]) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut start = None;

        for (i, byte) in self.bytes.iter().enumerate() {
            let is_delim = delimiters.contains(byte);
            match (start, is_delim) {
                (None, false) => start = Some(i),
                (Some(s), true) => {
                    ranges.push(s..i);
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            ranges.push(s..self.bytes.len());
        }

        if ranges.is_empty() {
            let end = self.bytes.len();
            ranges.push(end..end);
        }
        ranges
    }

    /// Split the snapshot into tokens on any byte in `delimiters`.
    ///
    /// ```
    /// use serialtool_core::Snapshot;
    ///
    /// let snap = Snapshot::new("+CSQ: 17,0");
    /// assert_eq!(snap.tokenize(b" ,"), vec![&b"+CSQ:"[..], &b"17"[..], &b"0"[..]]);
    /// ```
    pub fn tokenize(&self, delimiters: &[u8]) -> Vec<&[u8]> {
        self.token_ranges(delimiters)
            .into_iter()
            .map(|r| &self.bytes[r])
            .collect()
    }

    /// Like [`Snapshot::tokenize`] but yields text tokens
    pub fn tokenize_str(&self, delimiters: &str) -> Vec<Cow<'_, str>> {
        self.token_ranges(delimiters.as_bytes())
            .into_iter()
            .map(|r| String::from_utf8_lossy(&self.bytes[r]))
            .collect()
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str_lossy())
    }
}

impl AsRef<[u8]> for Snapshot {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
