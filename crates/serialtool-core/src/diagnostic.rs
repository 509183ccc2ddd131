//! Traffic echo for debugging
//!
//! When a sink is attached, every completed frame and every outbound command
//! is mirrored as one line:
//!
//! ```text
//! ---------GSM: +CSQ: 17,0
//! ---------GSM->: AT+CSQ
//! ```

use std::io::{self, Write};

/// Separator written before the device name on every echoed line
pub const ECHO_SEPARATOR: &str = "---------";

/// Secondary output channel for echoed traffic
pub trait DiagnosticSink {
    /// Write one line. `line` does not include the trailing newline.
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Box<S> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        (**self).write_line(line)
    }
}

/// Sink writing lines to any [`io::Write`], e.g. stderr or a debug UART
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Release the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DiagnosticSink for WriterSink<W> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

/// Sink that emits each line as a `tracing` event on `serialtool::traffic`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        tracing::debug!(target: "serialtool::traffic", "{line}");
        Ok(())
    }
}

/// Direction of echoed traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Completed frame from the device
    Inbound,
    /// Command sent to the device
    Outbound,
}

/// Format an echo line without the trailing newline
pub fn format_echo(name: &str, direction: Direction, payload: &[u8]) -> String {
    let arrow = match direction {
        Direction::Inbound => "",
        Direction::Outbound => "->",
    };
    format!(
        "{ECHO_SEPARATOR}{name}{arrow}: {}",
        String::from_utf8_lossy(payload)
    )
}

/// A sink tagged with the device name it echoes for
pub(crate) struct Echo {
    name: String,
    sink: Box<dyn DiagnosticSink + Send>,
}

impl Echo {
    pub(crate) fn new(name: String, sink: Box<dyn DiagnosticSink + Send>) -> Self {
        Self { name, sink }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Best-effort: a failing sink never fails the caller's operation
    pub(crate) fn emit(&mut self, direction: Direction, payload: &[u8]) {
        let line = format_echo(&self.name, direction, payload);
        if let Err(e) = self.sink.write_line(&line) {
            tracing::warn!(device = %self.name, "diagnostic sink write failed: {e}");
        }
    }
}
