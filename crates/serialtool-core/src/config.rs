//! Tool configuration
//!
//! Everything a [`SerialTool`](crate::SerialTool) needs to know up front.
//! Configurations are checked once, at construction, so a tool never runs
//! with a degenerate marker pair or an empty frame buffer.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::frame::MarkerPair;
use crate::{
    Result, SerialToolError, DEFAULT_BAUD_RATE, DEFAULT_FRAME_CAPACITY, DEFAULT_TIMEOUT_MS,
    MAX_FRAME_CAPACITY, MAX_TIMEOUT_MS,
};

/// Serial tool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Byte that opens a frame
    pub start_marker: u8,
    /// Byte that closes a frame
    pub end_marker: u8,
    /// Frame buffer capacity in bytes
    pub frame_capacity: usize,
    /// Timeout used by `is_data_received`, in milliseconds
    pub timeout_ms: u64,
    /// Baud rate handed to the transport
    pub baud_rate: u32,
    /// Pause between idle polls in microseconds; 0 yields the thread instead
    pub poll_interval_us: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        let markers = MarkerPair::default();
        Self {
            start_marker: markers.start,
            end_marker: markers.end,
            frame_capacity: DEFAULT_FRAME_CAPACITY,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            baud_rate: DEFAULT_BAUD_RATE,
            poll_interval_us: 0,
        }
    }
}

impl ToolConfig {
    /// Create a configuration with the given markers and defaults elsewhere
    pub fn new(start_marker: u8, end_marker: u8) -> Self {
        Self {
            start_marker,
            end_marker,
            ..Self::default()
        }
    }

    /// Set the frame buffer capacity
    pub fn with_capacity(mut self, frame_capacity: usize) -> Self {
        self.frame_capacity = frame_capacity;
        self
    }

    /// Set the default timeout in milliseconds
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the pause between idle polls
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_us = u64::try_from(interval.as_micros()).unwrap_or(u64::MAX);
        self
    }

    /// Marker pair described by this configuration
    pub fn markers(&self) -> MarkerPair {
        MarkerPair::new(self.start_marker, self.end_marker)
    }

    /// Default timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Pause between idle polls as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }

    /// Reject configurations the receiver cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.start_marker == self.end_marker {
            return Err(SerialToolError::InvalidConfig(format!(
                "start and end marker must differ (both are {:?})",
                self.start_marker as char
            )));
        }
        if self.frame_capacity == 0 || self.frame_capacity > MAX_FRAME_CAPACITY {
            return Err(SerialToolError::InvalidConfig(format!(
                "frame capacity must be between 1 and {MAX_FRAME_CAPACITY}, got {}",
                self.frame_capacity
            )));
        }
        if self.timeout_ms == 0 || self.timeout_ms > MAX_TIMEOUT_MS {
            return Err(SerialToolError::InvalidConfig(format!(
                "timeout must be between 1 and {MAX_TIMEOUT_MS} ms, got {}",
                self.timeout_ms
            )));
        }
        if self.baud_rate == 0 {
            return Err(SerialToolError::InvalidConfig(
                "baud rate must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
