use serialtool_core::{
    ByteTransport, SerialTool, SerialToolError, SystemClock, TcpTransport, ToolConfig,
};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::time::{Duration, Instant};

#[test]
fn test_error_display() {
    let err = SerialToolError::InvalidConfig("start and end marker must differ".into());
    assert_eq!(
        err.to_string(),
        "Invalid configuration: start and end marker must differ"
    );

    let err = SerialToolError::PortNotFound("/dev/ttyUSB9".into());
    assert!(err.to_string().contains("/dev/ttyUSB9"));
}

#[test]
fn test_io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "stalled");
    let err: SerialToolError = io.into();
    assert!(matches!(err, SerialToolError::IoError(_)));
}

#[test]
fn test_boxed_transport_is_a_transport() {
    struct Silent;

    impl ByteTransport for Silent {
        fn available(&mut self) -> std::io::Result<usize> {
            Ok(0)
        }

        fn read_byte(&mut self) -> std::io::Result<u8> {
            Err(std::io::ErrorKind::UnexpectedEof.into())
        }

        fn write_bytes(&mut self, _bytes: &[u8]) -> std::io::Result<()> {
            Ok(())
        }
    }

    let transport: Box<dyn ByteTransport> = Box::new(Silent);
    let mut tool = SerialTool::new(transport, ToolConfig::default()).unwrap();
    assert!(!tool.pump().unwrap());
}

#[test]
fn test_real_clock_wait_over_tcp_bridge() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");

    // Plays a modem behind a ser2net bridge: echoes noise, then answers
    let modem = std::thread::spawn(move || {
        let (mut sock, _) = listener.accept().expect("accept");
        let mut cmd = [0u8; 8];
        sock.read_exact(&mut cmd).expect("read command");
        assert_eq!(&cmd, b"AT+GMR\r\n");
        std::thread::sleep(Duration::from_millis(20));
        sock.write_all(b"AT+GMR\r\n<1418B05SIM800L24>")
            .expect("write reply");
        std::thread::sleep(Duration::from_millis(200));
    });

    let transport = TcpTransport::connect(addr, Duration::from_secs(1)).expect("connect");
    let config = ToolConfig::new(b'<', b'>')
        .with_poll_interval(Duration::from_millis(1));
    let mut tool = SerialTool::with_clock(transport, SystemClock::new(), config).unwrap();

    let started = Instant::now();
    let matched = tool
        .send_once_and_wait("AT+GMR\r\n", "SIM800", Duration::from_millis(2000))
        .unwrap();
    assert!(matched);
    assert!(started.elapsed() < Duration::from_millis(1500));
    assert_eq!(tool.snapshot().as_bytes(), b"1418B05SIM800L24");

    modem.join().expect("modem thread");
}

#[test]
fn test_real_clock_timeout_is_bounded() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let transport = TcpTransport::connect(addr, Duration::from_secs(1)).expect("connect");
    let (_sock, _) = listener.accept().expect("accept");

    let mut tool = SerialTool::new(transport, ToolConfig::default()).unwrap();
    let started = Instant::now();
    assert!(!tool.wait_for_data("OK", Duration::from_millis(50)).unwrap());
    let elapsed = started.elapsed();
    // Millisecond truncation on both ends of the measurement
    assert!(elapsed >= Duration::from_millis(49));
    assert!(elapsed < Duration::from_millis(1000));
}
