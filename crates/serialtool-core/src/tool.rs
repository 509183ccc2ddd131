//! Serial tool
//!
//! Drives a [`FrameReceiver`] from a [`ByteTransport`] and layers blocking
//! send/wait helpers on top of it.
//!
//! All wait helpers are synchronous and hold the calling thread until a
//! matching frame arrives or the timeout elapses. Between idle polls they
//! pause through the [`Clock`], which yields the thread (or sleeps the
//! configured poll interval) without affecting the timeout.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ToolConfig;
use crate::diagnostic::{DiagnosticSink, Direction, Echo};
use crate::frame::{FrameReceiver, ReceiverState, Snapshot};
use crate::transport::{ByteTransport, Clock, SystemClock};
use crate::Result;

/// How a wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitOutcome {
    /// A frame containing the expected text arrived
    Matched,
    /// The timeout elapsed first
    TimedOut {
        /// Frames that arrived during the wait without matching
        frames_seen: usize,
    },
}

impl WaitOutcome {
    /// Check if the wait succeeded
    pub fn is_match(&self) -> bool {
        matches!(self, WaitOutcome::Matched)
    }
}

/// Cumulative traffic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficCounters {
    /// Bytes written to the transport
    pub tx_bytes: u64,
    /// Bytes read from the transport, including discarded noise
    pub rx_bytes: u64,
    /// Commands sent through `send_command`
    pub commands_sent: u64,
    /// Frames completed by the receiver
    pub frames_received: u64,
}

/// Marker-framed request/response helper over a byte transport
pub struct SerialTool<T: ByteTransport, C: Clock = SystemClock> {
    transport: T,
    clock: C,
    config: ToolConfig,
    receiver: FrameReceiver,
    snapshot: Snapshot,
    echo: Option<Echo>,
    counters: TrafficCounters,
}

impl<T: ByteTransport> SerialTool<T, SystemClock> {
    /// Create a tool measuring time with the system clock
    pub fn new(transport: T, config: ToolConfig) -> Result<Self> {
        Self::with_clock(transport, SystemClock::new(), config)
    }
}

impl<T: ByteTransport, C: Clock> SerialTool<T, C> {
    /// Create a tool with an explicit time source
    pub fn with_clock(transport: T, clock: C, config: ToolConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            start = ?(config.start_marker as char),
            end = ?(config.end_marker as char),
            capacity = config.frame_capacity,
            timeout_ms = config.timeout_ms,
            baud = config.baud_rate,
            "serial tool ready"
        );
        Ok(Self {
            receiver: FrameReceiver::new(config.markers(), config.frame_capacity),
            transport,
            clock,
            config,
            snapshot: Snapshot::default(),
            echo: None,
            counters: TrafficCounters::default(),
        })
    }

    /// Echo traffic to `sink`, tagged with `name` (e.g. "GSM", "GPS")
    pub fn set_debug_mode<S>(&mut self, name: impl Into<String>, sink: S)
    where
        S: DiagnosticSink + Send + 'static,
    {
        self.echo = Some(Echo::new(name.into(), Box::new(sink)));
    }

    /// Stop echoing traffic
    pub fn disable_debug_mode(&mut self) {
        self.echo = None;
    }

    /// Device name used for echoed traffic, if debugging is on
    pub fn debug_name(&self) -> Option<&str> {
        self.echo.as_ref().map(Echo::name)
    }

    /// The active configuration
    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Current receiver state
    pub fn receiver_state(&self) -> ReceiverState {
        self.receiver.state()
    }

    /// Cumulative traffic counters
    pub fn counters(&self) -> TrafficCounters {
        TrafficCounters {
            frames_received: self.receiver.frames_completed(),
            ..self.counters
        }
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the tool, returning its transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Consume bytes the transport has ready.
    ///
    /// Never blocks. Returns `true` as soon as a frame completes, leaving any
    /// later bytes in the transport; returns `false` once no bytes remain.
    pub fn pump(&mut self) -> Result<bool> {
        loop {
            let available = self.transport.available()?;
            if available == 0 {
                return Ok(false);
            }
            for _ in 0..available {
                let byte = self.transport.read_byte()?;
                self.counters.rx_bytes += 1;
                if self.receiver.feed(byte) {
                    tracing::trace!(len = self.receiver.buffer().len(), "frame complete");
                    return Ok(true);
                }
            }
        }
    }

    /// Take the pending frame, if any.
    ///
    /// Clears the new-data flag and copies the frame into the snapshot, so a
    /// second call without a new frame in between returns `None`.
    pub fn consume_if_ready(&mut self) -> Option<&Snapshot> {
        let frame = self.receiver.take_frame()?;
        self.snapshot.refill(frame);
        if let Some(echo) = self.echo.as_mut() {
            echo.emit(Direction::Inbound, self.snapshot.as_bytes());
        }
        Some(&self.snapshot)
    }

    /// The most recently consumed frame
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Check if the most recently consumed frame contains `needle`
    pub fn contains(&self, needle: impl AsRef<[u8]>) -> bool {
        self.snapshot.contains(needle.as_ref())
    }

    /// Split the most recently consumed frame on any of `delimiters`
    pub fn parse_data(&self, delimiters: impl AsRef<[u8]>) -> Vec<&[u8]> {
        self.snapshot.tokenize(delimiters.as_ref())
    }

    /// Write raw bytes without echoing them
    pub fn write(&mut self, bytes: impl AsRef<[u8]>) -> Result<()> {
        let bytes = bytes.as_ref();
        self.transport.write_bytes(bytes)?;
        self.counters.tx_bytes += bytes.len() as u64;
        Ok(())
    }

    /// Send a command, echoing it to the diagnostic sink
    pub fn send_command(&mut self, command: impl AsRef<[u8]>) -> Result<()> {
        let command = command.as_ref();
        let text = String::from_utf8_lossy(command);
        tracing::debug!(command = %text.trim_end(), "sending");
        self.write(command)?;
        self.counters.commands_sent += 1;
        if let Some(echo) = self.echo.as_mut() {
            echo.emit(Direction::Outbound, command);
        }
        Ok(())
    }

    /// Read and discard everything the transport has pending.
    ///
    /// Returns the number of bytes dropped. Receiver state is untouched.
    pub fn clear_buffer(&mut self) -> Result<usize> {
        let mut dropped = 0;
        loop {
            let available = self.transport.available()?;
            if available == 0 {
                break;
            }
            for _ in 0..available {
                self.transport.read_byte()?;
                dropped += 1;
            }
        }
        self.counters.rx_bytes += dropped as u64;
        if dropped > 0 {
            tracing::debug!(dropped, "cleared pending input");
        }
        Ok(dropped)
    }

    /// Wait for a frame containing `needle`, reporting why a wait failed.
    pub fn wait_for_data_detailed(
        &mut self,
        needle: impl AsRef<[u8]>,
        timeout: Duration,
    ) -> Result<WaitOutcome> {
        let needle = needle.as_ref();
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let poll_interval = self.config.poll_interval();
        let started = self.clock.now_ms();
        let mut frames_seen = 0;

        loop {
            let completed = self.pump()?;
            if let Some(snapshot) = self.consume_if_ready() {
                if snapshot.contains(needle) {
                    tracing::trace!(
                        elapsed_ms = self.clock.now_ms().wrapping_sub(started),
                        "wait matched"
                    );
                    return Ok(WaitOutcome::Matched);
                }
                frames_seen += 1;
            }

            if self.clock.now_ms().wrapping_sub(started) >= timeout_ms {
                let needle_text = String::from_utf8_lossy(needle);
                tracing::debug!(
                    needle = %needle_text,
                    timeout_ms,
                    frames_seen,
                    "wait timed out"
                );
                return Ok(WaitOutcome::TimedOut { frames_seen });
            }

            if !completed {
                self.clock.pause(poll_interval);
            }
        }
    }

    /// Wait up to `timeout` for a frame containing `needle`.
    ///
    /// Returns `Ok(false)` both when nothing arrived and when only
    /// non-matching frames arrived; use
    /// [`wait_for_data_detailed`](Self::wait_for_data_detailed) to tell
    /// them apart. `Err` is reserved for transport failures.
    pub fn wait_for_data(&mut self, needle: impl AsRef<[u8]>, timeout: Duration) -> Result<bool> {
        Ok(self.wait_for_data_detailed(needle, timeout)?.is_match())
    }

    /// Wait for `needle` using the configured default timeout
    pub fn is_data_received(&mut self, needle: impl AsRef<[u8]>) -> Result<bool> {
        let timeout = self.config.timeout();
        self.wait_for_data(needle, timeout)
    }

    /// Send `command` once and wait for a frame containing `needle`
    pub fn send_once_and_wait(
        &mut self,
        command: impl AsRef<[u8]>,
        needle: impl AsRef<[u8]>,
        timeout: Duration,
    ) -> Result<bool> {
        self.send_command(command)?;
        self.wait_for_data(needle, timeout)
    }

    /// Send `command` and wait, repeating up to `max_retries` more times.
    ///
    /// Each attempt resends the whole command and waits a full `timeout`.
    /// A partial frame left by an earlier attempt is not discarded, so bytes
    /// arriving after a resend may complete it.
    pub fn send_with_retry(
        &mut self,
        command: impl AsRef<[u8]>,
        needle: impl AsRef<[u8]>,
        timeout: Duration,
        max_retries: u8,
    ) -> Result<bool> {
        let command = command.as_ref();
        let needle = needle.as_ref();
        for attempt in 0..=max_retries {
            if attempt > 0 {
                tracing::debug!(attempt, max_retries, "retrying command");
            }
            if self.send_once_and_wait(command, needle, timeout)? {
                return Ok(true);
            }
        }
        tracing::debug!(
            attempts = u32::from(max_retries) + 1,
            "no matching response after all attempts"
        );
        Ok(false)
    }
}
