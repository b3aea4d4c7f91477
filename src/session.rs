//! The RCON session: authentication, command execution and fragment
//! assembly over an owned transport.

use std::net::TcpStream;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::codec::{Charset, PacketCodec, MAX_CLIENTBOUND_PAYLOAD};
use crate::errors::{RconError, Result};
use crate::fragment::FragmentStrategy;
use crate::framing::{
    PacketReader, PacketWriter, DEFAULT_READ_BUFFER_CAPACITY, DEFAULT_WRITE_BUFFER_CAPACITY,
};
use crate::packet::{packet_type, Packet};
use crate::transport::Transport;

/// Default timeout applied to individual transport reads.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Default inactivity window for [`FragmentStrategy::Timeout`].
pub const DEFAULT_FRAGMENT_TIMEOUT: Duration = Duration::from_millis(100);

/// A blocking RCON session over an owned transport.
///
/// Operations on one session never interleave: authentication, each
/// command, and the reads and writes inside them form a single critical
/// section. Share a session across threads behind an
/// [`Arc`](std::sync::Arc), or open independent sessions for real
/// parallelism.
///
/// # Examples
///
/// ```no_run
/// use std::net::TcpStream;
/// use mc_rcon::Rcon;
///
/// fn main() -> mc_rcon::errors::Result<()> {
///     let stream = TcpStream::connect("localhost:25575")?;
///     let rcon = Rcon::attach(stream)?;
///     rcon.try_authenticate("password")?;
///
///     let output = rcon.send_command("time set day")?;
///     println!("{output}");
///
///     rcon.close()
/// }
/// ```
#[derive(Debug)]
pub struct Rcon<T: Transport = TcpStream> {
    state: Mutex<State<T>>,
    request_counter: AtomicI32,
}

#[derive(Debug)]
struct State<T> {
    transport: T,
    reader: PacketReader,
    writer: PacketWriter,
    fragment_strategy: FragmentStrategy,
    fragment_timeout: Duration,
    read_timeout: Duration,
}

impl Rcon<TcpStream> {
    /// Returns a builder for a session with custom configuration.
    #[must_use]
    pub fn builder() -> RconBuilder {
        RconBuilder::new()
    }
}

impl<T: Transport> Rcon<T> {
    /// Wraps an already-connected transport with the default
    /// configuration.
    ///
    /// # Errors
    /// [`RconError::Connection`] if the transport rejects the default
    /// read timeout.
    pub fn attach(transport: T) -> Result<Self> {
        RconBuilder::new().attach(transport)
    }

    /// Authenticates with the server using the given password.
    ///
    /// Returns `Ok(true)` on success and `Ok(false)` when the server
    /// rejects the password. Some Source-family servers send a spurious
    /// empty `RESPONSE_VALUE` packet before the auth outcome; it is
    /// discarded.
    ///
    /// # Errors
    /// [`RconError::UnexpectedPacketType`] if the server answers the
    /// handshake with anything other than an auth response, or a
    /// connection error if the transport fails.
    pub fn authenticate(&self, password: &str) -> Result<bool> {
        let mut state = self.lock();
        let id = self.next_request_id();

        state.write(&Packet::new(id, packet_type::AUTH, password))?;
        let mut response = state.read_matching(id)?;

        if response.packet_type == packet_type::RESPONSE_VALUE {
            if !response.payload.is_empty() {
                debug!(payload = %response.payload, "discarding spurious pre-auth response");
            }
            response = state.read_matching(id)?;
        }

        if response.packet_type != packet_type::AUTH_RESPONSE {
            return Err(RconError::UnexpectedPacketType(response.packet_type));
        }

        let ok = response.is_valid();
        debug!(ok, "authentication completed");
        Ok(ok)
    }

    /// Authenticates and treats a rejected password as an error.
    ///
    /// # Errors
    /// [`RconError::AuthFailed`] when the server rejects the password,
    /// plus everything [`authenticate`](Self::authenticate) can return.
    pub fn try_authenticate(&self, password: &str) -> Result<()> {
        if self.authenticate(password)? {
            Ok(())
        } else {
            Err(RconError::AuthFailed)
        }
    }

    /// Executes a command using the session's fragment strategy and
    /// returns the server's output.
    ///
    /// # Errors
    /// Any connection error, or a protocol violation if a response
    /// fragment has the wrong type, the `-1` sentinel id, or an id that
    /// does not belong to this command.
    pub fn send_command(&self, command: &str) -> Result<String> {
        let mut state = self.lock();
        let strategy = state.fragment_strategy;
        self.dispatch(&mut state, command, strategy)
    }

    /// Executes a command under an explicitly chosen fragment strategy.
    ///
    /// # Errors
    /// Same as [`send_command`](Self::send_command).
    pub fn send_command_with(&self, command: &str, strategy: FragmentStrategy) -> Result<String> {
        let mut state = self.lock();
        self.dispatch(&mut state, command, strategy)
    }

    /// Replaces the fragment strategy used by
    /// [`send_command`](Self::send_command).
    pub fn set_fragment_strategy(&self, strategy: FragmentStrategy) {
        self.lock().fragment_strategy = strategy;
    }

    /// Replaces the inactivity window used by
    /// [`FragmentStrategy::Timeout`].
    pub fn set_fragment_timeout(&self, timeout: Duration) {
        self.lock().fragment_timeout = timeout;
    }

    /// Shuts the transport down. Safe to call more than once; the session
    /// is unusable afterwards.
    ///
    /// # Errors
    /// [`RconError::Connection`] if the shutdown itself fails.
    pub fn close(&self) -> Result<()> {
        self.lock().transport.shutdown().map_err(RconError::Connection)
    }

    fn dispatch(
        &self,
        state: &mut State<T>,
        command: &str,
        strategy: FragmentStrategy,
    ) -> Result<String> {
        match strategy {
            FragmentStrategy::PacketSize => self.send_packet_size(state, command),
            FragmentStrategy::Timeout => self.send_timeout(state, command),
            FragmentStrategy::ActiveProbe => self.send_active_probe(state, command),
        }
    }

    /// `PacketSize` assembly: a fragment shorter than the clientbound
    /// ceiling is taken to be the last one.
    fn send_packet_size(&self, state: &mut State<T>, command: &str) -> Result<String> {
        let id = self.next_request_id();
        state.write(&Packet::new(id, packet_type::EXEC_COMMAND, command))?;

        let mut output = String::new();
        loop {
            let fragment = state.read()?;
            validate_fragment(&fragment, id)?;
            let last = fragment.payload.len() < MAX_CLIENTBOUND_PAYLOAD;
            output.push_str(&fragment.payload);
            if last {
                break;
            }
        }

        trace!(request_id = id, len = output.len(), "response assembled");
        Ok(output)
    }

    /// `Timeout` assembly: the first fragment is read under the full
    /// transport read timeout, since the server may take a while to start
    /// answering; every received fragment then re-arms the short
    /// inactivity window. Window expiry or a server-side close completes
    /// the response.
    fn send_timeout(&self, state: &mut State<T>, command: &str) -> Result<String> {
        let id = self.next_request_id();
        state.write(&Packet::new(id, packet_type::EXEC_COMMAND, command))?;

        let mut output = String::new();
        let first = state.read()?;
        validate_fragment(&first, id)?;
        output.push_str(&first.payload);

        let window = state.fragment_timeout;
        state.set_read_timeout(window)?;
        let result = loop {
            match state.read() {
                Ok(fragment) => {
                    if let Err(err) = validate_fragment(&fragment, id) {
                        break Err(err);
                    }
                    output.push_str(&fragment.payload);
                }
                Err(RconError::Timeout | RconError::ConnectionClosed) => break Ok(output),
                Err(err) => break Err(err),
            }
        };
        let full = state.read_timeout;
        let restored = state.set_read_timeout(full);

        let output = result?;
        restored?;
        trace!(request_id = id, len = output.len(), "response assembled");
        Ok(output)
    }

    /// `ActiveProbe` assembly: after the first fragment, write an empty
    /// probe command; the server answers in order, so the probe's echo
    /// marks the end of the real response. The echo's payload is dropped.
    ///
    /// Read failures after the probe is written are surfaced rather than
    /// swallowed: a dropped connection loses the partial output but never
    /// masquerades as a complete response.
    fn send_active_probe(&self, state: &mut State<T>, command: &str) -> Result<String> {
        let id = self.next_request_id();
        state.write(&Packet::new(id, packet_type::EXEC_COMMAND, command))?;

        let mut output = String::new();
        let first = state.read()?;
        validate_fragment(&first, id)?;
        output.push_str(&first.payload);

        let probe_id = self.next_request_id();
        state.write(&Packet::empty(probe_id, packet_type::EXEC_COMMAND))?;
        trace!(request_id = id, probe_id, "probe written");

        loop {
            let fragment = state.read()?;
            if fragment.request_id == probe_id {
                break;
            }
            validate_fragment(&fragment, id)?;
            output.push_str(&fragment.payload);
        }

        trace!(request_id = id, len = output.len(), "response assembled");
        Ok(output)
    }

    /// Allocates the next request id, wrapping per two's complement and
    /// permanently skipping the reserved `-1` failure sentinel.
    fn next_request_id(&self) -> i32 {
        loop {
            let id = self.request_counter.fetch_add(1, Ordering::Relaxed);
            if id != -1 {
                return id;
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Transport> State<T> {
    fn write(&mut self, packet: &Packet) -> Result<()> {
        trace!(
            request_id = packet.request_id,
            packet_type = packet.packet_type,
            "writing packet"
        );
        self.writer.write(&mut self.transport, packet)
    }

    fn read(&mut self) -> Result<Packet> {
        self.reader.read(&mut self.transport)
    }

    /// Reads one packet and checks its id against the outstanding
    /// request. Sentinel-invalid packets pass through: they carry the
    /// auth failure outcome rather than a correlation id.
    fn read_matching(&mut self, expected: i32) -> Result<Packet> {
        let response = self.read()?;
        if response.is_valid() && response.request_id != expected {
            return Err(RconError::RequestIdMismatch {
                expected,
                actual: response.request_id,
            });
        }
        Ok(response)
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.transport
            .set_read_timeout(Some(timeout))
            .map_err(RconError::Connection)
    }
}

/// Every command response fragment must be a valid `RESPONSE_VALUE`
/// carrying the outstanding request's id.
fn validate_fragment(fragment: &Packet, expected_id: i32) -> Result<()> {
    if fragment.packet_type != packet_type::RESPONSE_VALUE {
        warn!(
            packet_type = fragment.packet_type,
            name = packet_type::name(fragment.packet_type),
            "wrong command response type"
        );
        return Err(RconError::UnexpectedPacketType(fragment.packet_type));
    }
    if !fragment.is_valid() {
        return Err(RconError::InvalidResponse(fragment.payload.clone()));
    }
    if fragment.request_id != expected_id {
        return Err(RconError::RequestIdMismatch {
            expected: expected_id,
            actual: fragment.request_id,
        });
    }
    Ok(())
}

/// Configures and attaches an [`Rcon`] session.
///
/// # Examples
///
/// ```no_run
/// use std::net::TcpStream;
/// use std::time::Duration;
/// use mc_rcon::{Charset, FragmentStrategy, Rcon};
///
/// fn main() -> mc_rcon::errors::Result<()> {
///     let stream = TcpStream::connect("localhost:25575")?;
///     let rcon = Rcon::builder()
///         .charset(Charset::Latin1)
///         .fragment_strategy(FragmentStrategy::Timeout)
///         .fragment_timeout(Duration::from_millis(250))
///         .attach(stream)?;
///     rcon.try_authenticate("password")
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RconBuilder {
    charset: Charset,
    read_buffer_capacity: usize,
    write_buffer_capacity: usize,
    fragment_strategy: FragmentStrategy,
    fragment_timeout: Duration,
    read_timeout: Duration,
}

impl RconBuilder {
    /// Creates a builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            charset: Charset::default(),
            read_buffer_capacity: DEFAULT_READ_BUFFER_CAPACITY,
            write_buffer_capacity: DEFAULT_WRITE_BUFFER_CAPACITY,
            fragment_strategy: FragmentStrategy::default(),
            fragment_timeout: DEFAULT_FRAGMENT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Sets the payload text encoding. Fixed for the session's lifetime.
    #[must_use]
    pub fn charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Sets the initial capacity of the inbound frame buffer.
    #[must_use]
    pub fn read_buffer_capacity(mut self, capacity: usize) -> Self {
        self.read_buffer_capacity = capacity;
        self
    }

    /// Sets the initial capacity of the outbound frame buffer. The buffer
    /// grows on demand.
    #[must_use]
    pub fn write_buffer_capacity(mut self, capacity: usize) -> Self {
        self.write_buffer_capacity = capacity;
        self
    }

    /// Sets the fragment strategy used by
    /// [`Rcon::send_command`].
    #[must_use]
    pub fn fragment_strategy(mut self, strategy: FragmentStrategy) -> Self {
        self.fragment_strategy = strategy;
        self
    }

    /// Sets the inactivity window for [`FragmentStrategy::Timeout`].
    #[must_use]
    pub fn fragment_timeout(mut self, timeout: Duration) -> Self {
        self.fragment_timeout = timeout;
        self
    }

    /// Sets the timeout applied to individual transport reads. Should be
    /// at least as long as the fragment timeout for the `Timeout`
    /// strategy to behave.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Applies the read timeout to `transport` and wraps it in a session.
    ///
    /// # Errors
    /// [`RconError::Connection`] if the transport rejects the timeout.
    pub fn attach<T: Transport>(self, mut transport: T) -> Result<Rcon<T>> {
        transport
            .set_read_timeout(Some(self.read_timeout))
            .map_err(RconError::Connection)?;

        let codec = PacketCodec::new(self.charset);
        Ok(Rcon {
            state: Mutex::new(State {
                transport,
                reader: PacketReader::new(codec, self.read_buffer_capacity),
                writer: PacketWriter::new(codec, self.write_buffer_capacity),
                fragment_strategy: self.fragment_strategy,
                fragment_timeout: self.fragment_timeout,
                read_timeout: self.read_timeout,
            }),
            request_counter: AtomicI32::new(0),
        })
    }
}

impl Default for RconBuilder {
    fn default() -> Self {
        Self::new()
    }
}
