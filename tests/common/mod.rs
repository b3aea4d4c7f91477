//! Shared stub-server harness for the integration tests.
//!
//! The helpers speak the RCON wire format with raw byte twiddling on
//! purpose: reusing the crate's own codec here would let an encode bug
//! and the matching decode bug cancel out.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Once;
use std::thread::{self, JoinHandle};

pub const RESPONSE_VALUE: i32 = 0;
pub const EXEC_COMMAND: i32 = 2;
pub const AUTH_RESPONSE: i32 = 2;
pub const AUTH: i32 = 3;

/// A scripted single-connection server on an ephemeral local port.
///
/// The script runs on its own thread; assertion failures inside it
/// surface when the test calls [`StubServer::join`].
pub struct StubServer {
    addr: SocketAddr,
    handle: Option<JoinHandle<()>>,
}

impl StubServer {
    /// Spawns a server that runs `script` against the first accepted
    /// connection.
    pub fn spawn<F>(script: F) -> Self
    where
        F: FnOnce(TcpStream) + Send + 'static,
    {
        init_logging();

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub listener");
        let addr = listener.local_addr().expect("stub listener addr");
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept client");
            script(stream);
        });

        Self {
            addr,
            handle: Some(handle),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Opens a client connection to the stub.
    pub fn connect(&self) -> TcpStream {
        TcpStream::connect(self.addr).expect("connect to stub")
    }

    /// Waits for the script to finish, propagating its panics.
    pub fn join(mut self) {
        self.handle
            .take()
            .expect("stub already joined")
            .join()
            .expect("stub server script");
    }
}

/// Reads one frame, or returns `None` on a clean end of stream.
pub fn try_read_frame(stream: &mut TcpStream) -> Option<(i32, i32, Vec<u8>)> {
    let mut prefix = [0u8; 4];
    let mut filled = 0;
    while filled < prefix.len() {
        match stream.read(&mut prefix[filled..]) {
            Ok(0) if filled == 0 => return None,
            Ok(0) => panic!("stream closed inside a frame prefix"),
            Ok(n) => filled += n,
            Err(err) => panic!("reading frame prefix: {err}"),
        }
    }

    let len = i32::from_le_bytes(prefix) as usize;
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).expect("frame body");

    let request_id = i32::from_le_bytes(body[0..4].try_into().unwrap());
    let packet_type = i32::from_le_bytes(body[4..8].try_into().unwrap());
    let payload = body[8..len - 2].to_vec();
    assert_eq!(&body[len - 2..], [0, 0], "missing frame terminator");

    Some((request_id, packet_type, payload))
}

/// Reads one frame, returning request id, type and payload bytes.
pub fn read_frame(stream: &mut TcpStream) -> (i32, i32, Vec<u8>) {
    try_read_frame(stream).expect("expected a frame, got end of stream")
}

/// Writes one frame with the given fields.
pub fn write_frame(stream: &mut TcpStream, request_id: i32, packet_type: i32, payload: &[u8]) {
    let len = (payload.len() + 10) as i32;
    let mut frame = Vec::with_capacity(payload.len() + 14);
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&request_id.to_le_bytes());
    frame.extend_from_slice(&packet_type.to_le_bytes());
    frame.extend_from_slice(payload);
    frame.extend_from_slice(&[0, 0]);
    stream.write_all(&frame).expect("write frame");
}

/// Echoes every command payload back under its request id until the
/// client disconnects. Probe commands echo as empty responses, so this
/// works under every fragment strategy.
pub fn echo_server(mut stream: TcpStream) {
    while let Some((request_id, packet_type, payload)) = try_read_frame(&mut stream) {
        assert_eq!(packet_type, EXEC_COMMAND);
        write_frame(&mut stream, request_id, RESPONSE_VALUE, &payload);
    }
}

/// Blocks until the peer closes its end, asserting no further bytes
/// arrive first.
pub fn expect_eof(stream: &mut TcpStream) {
    let mut byte = [0u8; 1];
    let n = stream.read(&mut byte).expect("awaiting client close");
    assert_eq!(n, 0, "unexpected trailing bytes from client");
}

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}
