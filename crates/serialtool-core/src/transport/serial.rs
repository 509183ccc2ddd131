//! Serial port transport
//!
//! Port discovery, opening and line configuration, plus a [`ByteTransport`]
//! over any `serialport::SerialPort`.

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::collections::HashMap;
#[cfg(target_os = "linux")]
use std::fs;
use std::io::{self, Read, Write};
use std::time::Duration;

use super::ByteTransport;
use crate::{Result, SerialToolError, DEFAULT_BAUD_RATE};

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub name: String,

    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,

    /// USB product ID (if USB device)
    pub pid: Option<u16>,

    /// Manufacturer name (if available)
    pub manufacturer: Option<String>,

    /// Product name (if available)
    pub product: Option<String>,
}

impl PortInfo {
    fn bare(name: String) -> Self {
        Self {
            name,
            vid: None,
            pid: None,
            manufacturer: None,
            product: None,
        }
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => Self {
                name: info.port_name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                manufacturer: usb.manufacturer,
                product: usb.product,
            },
            _ => Self::bare(info.port_name),
        }
    }
}

/// Sort key placing USB modem adapters first:
///  - ttyUSB* (CH340/CP210x/FTDI bridges used by SIM800 and NEO-6 boards)
///  - then ttyACM*
///  - then ttyS* hardware UARTs
///  - then everything else by name
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    for (rank, prefix) in ["ttyUSB", "ttyACM", "ttyS"].iter().enumerate() {
        if let Some(rest) = basename.strip_prefix(prefix) {
            let num = rest.parse::<usize>().unwrap_or(usize::MAX);
            return (rank as u8, num, basename.to_string());
        }
    }
    (3, 0, basename.to_string())
}

/// List available serial ports in a deterministic order
pub fn list_ports() -> Vec<PortInfo> {
    let mut map: HashMap<String, PortInfo> = HashMap::new();
    for info in serialport::available_ports().unwrap_or_default() {
        let p = PortInfo::from(info);
        map.entry(p.name.clone()).or_insert(p);
    }

    // The enumeration API misses some USB serial nodes on Linux
    #[cfg(target_os = "linux")]
    if let Ok(entries) = fs::read_dir("/dev") {
        for entry in entries.flatten() {
            if let Some(fname) = entry.file_name().to_str() {
                if fname.starts_with("ttyACM") || fname.starts_with("ttyUSB") {
                    let full = format!("/dev/{}", fname);
                    map.entry(full.clone())
                        .or_insert_with(|| PortInfo::bare(full));
                }
            }
        }
    }

    let mut v: Vec<PortInfo> = map.into_values().collect();
    v.sort_by_key(|p| port_sort_key(&p.name));
    v
}

fn map_serial_error(name: &str, e: serialport::Error) -> SerialToolError {
    match e.kind() {
        serialport::ErrorKind::NoDevice => SerialToolError::PortNotFound(name.to_string()),
        _ => SerialToolError::SerialError(e.to_string()),
    }
}

/// Open a serial port. The baud rate is passed to the driver unmodified.
pub fn open_port(name: &str, baud_rate: Option<u32>) -> Result<Box<dyn SerialPort>> {
    let baud = baud_rate.unwrap_or(DEFAULT_BAUD_RATE);
    tracing::debug!(port = name, baud, "opening serial port");

    // Reads are only issued after bytes_to_read() reports data, so a short
    // driver timeout is enough
    serialport::new(name, baud)
        .timeout(Duration::from_millis(10))
        .open()
        .map_err(|e| map_serial_error(name, e))
}

/// Configure a port for 8N1 without flow control
pub fn configure_port(port: &mut dyn SerialPort) -> Result<()> {
    let err = |e: serialport::Error| SerialToolError::SerialError(e.to_string());
    port.set_data_bits(serialport::DataBits::Eight).map_err(err)?;
    port.set_parity(serialport::Parity::None).map_err(err)?;
    port.set_stop_bits(serialport::StopBits::One).map_err(err)?;
    port.set_flow_control(serialport::FlowControl::None).map_err(err)?;

    // Some USB bridges only forward data with DTR/RTS asserted; failure here
    // is not fatal
    if let Err(e) = port.write_data_terminal_ready(true) {
        tracing::warn!("failed to set DTR high: {e} (continuing)");
    }
    if let Err(e) = port.write_request_to_send(true) {
        tracing::warn!("failed to set RTS high: {e} (continuing)");
    }

    Ok(())
}

/// Discard anything pending in the port's input and output buffers
pub fn clear_buffers(port: &mut dyn SerialPort) -> Result<()> {
    port.clear(serialport::ClearBuffer::All)
        .map_err(|e| SerialToolError::SerialError(e.to_string()))
}

/// [`ByteTransport`] over a serial port
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Wrap an already opened port
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }

    /// Open, configure and clear a port in one step
    pub fn open(name: &str, baud_rate: u32) -> Result<Self> {
        let mut port = open_port(name, Some(baud_rate))?;
        configure_port(port.as_mut())?;
        clear_buffers(port.as_mut())?;
        Ok(Self::new(port))
    }

    /// Baud rate currently applied by the driver
    pub fn baud_rate(&self) -> Result<u32> {
        self.port
            .baud_rate()
            .map_err(|e| SerialToolError::SerialError(e.to_string()))
    }

    /// Release the underlying port
    pub fn into_inner(self) -> Box<dyn SerialPort> {
        self.port
    }
}

impl ByteTransport for SerialTransport {
    fn available(&mut self) -> io::Result<usize> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(io::Error::other)
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let mut byte = [0u8; 1];
        self.port.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }
}
