//! AT Command Probe
//!
//! Sends an AT-style command to a GSM/GPS module and waits for a framed reply.
//!
//! Usage:
//!   cargo run --example at_probe -- [OPTIONS] [PORT]
//!
//! Options:
//!   --port PORT       Serial port (default: first detected port)
//!   --baud RATE       Baud rate (default: 9600)
//!   --cmd COMMAND     Command to send, CRLF appended (default: AT)
//!   --expect TEXT     Text the reply must contain (default: OK)
//!   --timeout MS      Timeout per attempt in ms (default: 1000)
//!   --retries N       Extra attempts after the first (default: 2)
//!   --start CHAR      Start marker (default: \n)
//!   --end CHAR        End marker (default: \r)
//!   --list            List serial ports and exit
//!
//! Set RUST_LOG=serialtool=debug to see traffic.

use anyhow::{bail, Context};
use serialtool_core::transport::list_ports;
use serialtool_core::{SerialTool, SerialTransport, ToolConfig, TracingSink};
use std::time::Duration;

fn parse_marker(arg: &str) -> anyhow::Result<u8> {
    match arg {
        "\\n" => Ok(b'\n'),
        "\\r" => Ok(b'\r'),
        s if s.len() == 1 => Ok(s.as_bytes()[0]),
        s => bail!("marker must be a single character, got {s:?}"),
    }
}

fn print_help() {
    println!("AT Command Probe");
    println!();
    println!("Usage: at_probe [OPTIONS] [PORT]");
    println!();
    println!("  --port PORT     Serial port (default: first detected port)");
    println!("  --baud RATE     Baud rate (default: 9600)");
    println!("  --cmd COMMAND   Command to send, CRLF appended (default: AT)");
    println!("  --expect TEXT   Text the reply must contain (default: OK)");
    println!("  --timeout MS    Timeout per attempt in ms (default: 1000)");
    println!("  --retries N     Extra attempts after the first (default: 2)");
    println!("  --start CHAR    Start marker (default: \\n)");
    println!("  --end CHAR      End marker (default: \\r)");
    println!("  --list          List serial ports and exit");
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut port_name: Option<String> = None;
    let mut config = ToolConfig::new(b'\n', b'\r');
    let mut command = "AT".to_string();
    let mut expect = "OK".to_string();
    let mut timeout_ms = 1000u64;
    let mut retries = 2u8;

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--port" | "-p" => {
                port_name = value.cloned();
                i += 1;
            }
            "--baud" | "-b" => {
                let v = value.context("--baud needs a value")?;
                config.baud_rate = v.parse().context("invalid baud rate")?;
                i += 1;
            }
            "--cmd" | "-c" => {
                command = value.context("--cmd needs a value")?.clone();
                i += 1;
            }
            "--expect" | "-e" => {
                expect = value.context("--expect needs a value")?.clone();
                i += 1;
            }
            "--timeout" | "-t" => {
                let v = value.context("--timeout needs a value")?;
                timeout_ms = v.parse().context("invalid timeout")?;
                i += 1;
            }
            "--retries" | "-r" => {
                let v = value.context("--retries needs a value")?;
                retries = v.parse().context("invalid retry count")?;
                i += 1;
            }
            "--start" => {
                config.start_marker = parse_marker(value.context("--start needs a value")?)?;
                i += 1;
            }
            "--end" => {
                config.end_marker = parse_marker(value.context("--end needs a value")?)?;
                i += 1;
            }
            "--list" | "-l" => {
                for port in list_ports() {
                    println!(
                        "{}  {}",
                        port.name,
                        port.product.as_deref().unwrap_or("")
                    );
                }
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other if !other.starts_with('-') => port_name = Some(other.to_string()),
            other => bail!("unknown option {other}"),
        }
        i += 1;
    }

    let port_name = match port_name {
        Some(name) => name,
        None => list_ports()
            .into_iter()
            .next()
            .map(|p| p.name)
            .context("no serial ports found; pass --port")?,
    };

    println!("Port: {port_name} @ {} baud", config.baud_rate);
    let transport = SerialTransport::open(&port_name, config.baud_rate)
        .with_context(|| format!("opening {port_name}"))?;
    let mut tool = SerialTool::new(transport, config)?;
    tool.set_debug_mode("DEV", TracingSink);

    let dropped = tool.clear_buffer()?;
    if dropped > 0 {
        println!("Discarded {dropped} stale bytes");
    }

    let line = format!("{command}\r\n");
    let ok = tool.send_with_retry(
        &line,
        &expect,
        Duration::from_millis(timeout_ms),
        retries,
    )?;

    let counters = tool.counters();
    println!(
        "tx={}B rx={}B frames={} commands={}",
        counters.tx_bytes, counters.rx_bytes, counters.frames_received, counters.commands_sent
    );

    if ok {
        println!("Reply: {}", tool.snapshot());
        for (n, token) in tool.snapshot().tokenize_str(":, ").iter().enumerate() {
            println!("  [{n}] {token}");
        }
        Ok(())
    } else {
        bail!("no reply containing {expect:?} after {} attempts", retries as u32 + 1)
    }
}
