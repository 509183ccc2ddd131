//! TCP transport
//!
//! Lets the serial tool talk to modules exposed through a serial-to-network
//! bridge (ser2net, ESP-Link and similar).

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::ByteTransport;

/// [`ByteTransport`] over a TCP stream
pub struct TcpTransport {
    stream: TcpStream,
    /// Bytes already pulled off the socket but not yet handed out
    pending: VecDeque<u8>,
    closed: bool,
}

impl TcpTransport {
    /// Wrap a connected stream
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            pending: VecDeque::new(),
            closed: false,
        }
    }

    /// Connect to a bridge with a connect/write timeout
    pub fn connect<A: ToSocketAddrs>(addr: A, timeout: Duration) -> io::Result<Self> {
        let mut last_err = None;
        for addr in addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_write_timeout(Some(timeout))?;
                    stream.set_nodelay(true)?;
                    tracing::debug!(%addr, "connected to serial bridge");
                    return Ok(Self::new(stream));
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "no addresses to connect to")
        }))
    }

    /// Whether the peer closed the connection
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Pull whatever the socket has without blocking
    fn fill_pending(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.stream.set_nonblocking(true)?;
        let mut buf = [0u8; 1024];
        let result = loop {
            match self.stream.read(&mut buf) {
                Ok(0) => {
                    self.closed = true;
                    break Ok(());
                }
                Ok(n) => self.pending.extend(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(e),
            }
        };
        // Restore blocking mode even when the read failed
        let restored = self.stream.set_nonblocking(false);
        result.and(restored)
    }
}

impl ByteTransport for TcpTransport {
    fn available(&mut self) -> io::Result<usize> {
        self.fill_pending()?;
        Ok(self.pending.len())
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        if self.pending.is_empty() {
            self.fill_pending()?;
        }
        self.pending
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no byte available"))
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes)?;
        self.stream.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_round_trip_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");

        let peer = std::thread::spawn(move || {
            let (mut sock, _) = listener.accept().expect("accept");
            let mut cmd = [0u8; 4];
            sock.read_exact(&mut cmd).expect("read command");
            assert_eq!(&cmd, b"AT\r\n");
            sock.write_all(b"<OK>").expect("write reply");
        });

        let mut transport =
            TcpTransport::connect(addr, Duration::from_secs(1)).expect("connect");
        transport.write_bytes(b"AT\r\n").expect("write");
        peer.join().expect("peer thread");

        let mut received = Vec::new();
        for _ in 0..1000 {
            while transport.available().expect("available") > 0 {
                received.push(transport.read_byte().expect("read"));
            }
            if received.len() == 4 {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(received, b"<OK>");
    }

    #[test]
    fn test_read_byte_without_data_is_eof() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let mut transport =
            TcpTransport::connect(addr, Duration::from_secs(1)).expect("connect");
        let (_sock, _) = listener.accept().expect("accept");

        assert_eq!(transport.available().expect("available"), 0);
        let err = transport.read_byte().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
