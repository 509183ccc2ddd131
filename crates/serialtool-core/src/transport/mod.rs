//! Byte transports and time sources
//!
//! The serial tool never touches a port directly. It reads and writes
//! through a [`ByteTransport`] and measures timeouts against a [`Clock`],
//! both supplied by the caller.

pub mod serial;
pub mod tcp;

use std::io;
use std::time::{Duration, Instant};

pub use serial::{clear_buffers, configure_port, list_ports, open_port, PortInfo, SerialTransport};
pub use tcp::TcpTransport;

/// Abstraction over a character-oriented byte stream
pub trait ByteTransport {
    /// Number of bytes that can be read without blocking
    fn available(&mut self) -> io::Result<usize>;

    /// Read one byte. Only called after `available` reported data.
    fn read_byte(&mut self) -> io::Result<u8>;

    /// Write all of `bytes`
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;
}

impl<T: ByteTransport + ?Sized> ByteTransport for Box<T> {
    fn available(&mut self) -> io::Result<usize> {
        (**self).available()
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        (**self).read_byte()
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write_bytes(bytes)
    }
}

impl<T: ByteTransport + ?Sized> ByteTransport for &mut T {
    fn available(&mut self) -> io::Result<usize> {
        (**self).available()
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        (**self).read_byte()
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write_bytes(bytes)
    }
}

/// Monotonic millisecond time source
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin. Callers compare values
    /// with wrapping subtraction, so the counter may roll over.
    fn now_ms(&self) -> u64;

    /// Called by wait loops when a poll found nothing to do
    fn pause(&self, interval: Duration);
}

/// Clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn pause(&self, interval: Duration) {
        if interval.is_zero() {
            std::thread::yield_now();
        } else {
            std::thread::sleep(interval);
        }
    }
}
