//! # SerialTool Core Library
//!
//! Marker-framed serial communication for GSM, GPS and similar modules.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Extraction of `<start> payload <end>` frames from a noisy byte stream
//! - A one-shot "new frame" flag with snapshot-on-read semantics
//! - Tokenizing and substring checks on the received frame
//! - Blocking send-and-wait helpers with timeout and retry
//! - Optional traffic echo to a diagnostic sink
//!
//! ## Example
//!
//! ```rust,ignore
//! use serialtool_core::{SerialTool, SerialTransport, ToolConfig};
//! use std::time::Duration;
//!
//! let config = ToolConfig::new(b'\n', b'\r').with_baud_rate(9600);
//! let transport = SerialTransport::open("/dev/ttyUSB0", config.baud_rate)?;
//! let mut gsm = SerialTool::new(transport, config)?;
//!
//! if gsm.send_with_retry("AT+CSQ\r\n", "+CSQ", Duration::from_millis(500), 3)? {
//!     let tokens = gsm.parse_data(b": ,");
//!     println!("signal quality: {:?}", tokens.get(1));
//! }
//! ```

pub mod config;
pub mod diagnostic;
mod error;
pub mod frame;
pub mod tool;
pub mod transport;

pub use config::ToolConfig;
pub use diagnostic::{DiagnosticSink, TracingSink, WriterSink};
pub use error::{Result, SerialToolError};
pub use frame::{FrameReceiver, MarkerPair, ReceiverState, Snapshot};
pub use tool::{SerialTool, TrafficCounters, WaitOutcome};
pub use transport::{ByteTransport, Clock, SerialTransport, SystemClock, TcpTransport};

/// Default baud rate for SIM800/NEO-6 class modules
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default timeout for `is_data_received` in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Default frame buffer capacity in bytes
pub const DEFAULT_FRAME_CAPACITY: usize = 64;

/// Largest accepted frame buffer capacity
pub const MAX_FRAME_CAPACITY: usize = u16::MAX as usize;

/// Largest accepted default timeout in milliseconds
pub const MAX_TIMEOUT_MS: u64 = u16::MAX as u64;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::diagnostic::{DiagnosticSink, TracingSink, WriterSink};
    pub use crate::transport::{ByteTransport, Clock, SerialTransport, SystemClock};
    pub use crate::{SerialTool, SerialToolError, Snapshot, ToolConfig, WaitOutcome};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
