#![allow(dead_code)]

use serialtool_core::{ByteTransport, Clock, SerialTool, ToolConfig};
use std::cell::Cell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

/// Clock advanced by hand; every idle pause moves it forward one millisecond
#[derive(Clone, Default)]
pub struct ManualClock(Rc<Cell<u64>>);

impl ManualClock {
    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }

    fn pause(&self, interval: Duration) {
        let ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX).max(1);
        self.advance(ms);
    }
}

/// Mock serial port releasing scripted bytes at scripted times
pub struct MockSerial {
    clock: ManualClock,
    /// (release time in ms, bytes)
    schedule: Vec<(u64, Vec<u8>)>,
    rx: VecDeque<u8>,
    /// Reply queued after each write; `None` means stay silent
    replies: VecDeque<Option<Vec<u8>>>,
    reply_delay_ms: u64,
    pub writes: Vec<Vec<u8>>,
    pub fail_on_send: bool,
    pub fail_on_read: bool,
}

impl MockSerial {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            schedule: Vec::new(),
            rx: VecDeque::new(),
            replies: VecDeque::new(),
            reply_delay_ms: 0,
            writes: Vec::new(),
            fail_on_send: false,
            fail_on_read: false,
        }
    }

    /// Make `bytes` readable once the clock reaches `at_ms`
    pub fn deliver_at(mut self, at_ms: u64, bytes: &[u8]) -> Self {
        self.schedule.push((at_ms, bytes.to_vec()));
        self
    }

    /// Queue the reply for the next write
    pub fn reply(mut self, reply: Option<&[u8]>) -> Self {
        self.replies.push_back(reply.map(<[u8]>::to_vec));
        self
    }

    pub fn reply_delay(mut self, ms: u64) -> Self {
        self.reply_delay_ms = ms;
        self
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    fn release(&mut self) {
        let now = self.clock.now_ms();
        let mut due: Vec<(u64, Vec<u8>)> = Vec::new();
        self.schedule.retain(|(at, bytes)| {
            if *at <= now {
                due.push((*at, bytes.clone()));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(at, _)| *at);
        for (_, bytes) in due {
            self.rx.extend(bytes);
        }
    }
}

impl ByteTransport for MockSerial {
    fn available(&mut self) -> io::Result<usize> {
        self.release();
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        if self.fail_on_read {
            return Err(io::Error::new(io::ErrorKind::Other, "Serial read failed"));
        }
        self.rx
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "EOF"))
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.fail_on_send {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "Serial write failed"));
        }
        self.writes.push(bytes.to_vec());
        if let Some(Some(reply)) = self.replies.pop_front() {
            let at = self.clock.now_ms() + self.reply_delay_ms;
            self.schedule.push((at, reply));
        }
        Ok(())
    }
}

pub fn angle_config() -> ToolConfig {
    ToolConfig::new(b'<', b'>').with_capacity(16)
}

pub fn tool_with(
    clock: &ManualClock,
    transport: MockSerial,
    config: ToolConfig,
) -> SerialTool<MockSerial, ManualClock> {
    SerialTool::with_clock(transport, clock.clone(), config).expect("valid config")
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
