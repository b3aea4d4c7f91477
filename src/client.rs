//! Host/port/password convenience wrapper around [`Rcon`].

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::errors::{RconError, Result};
use crate::fragment::FragmentStrategy;
use crate::session::Rcon;

/// A connected, authenticated RCON client.
///
/// This is the batteries-included surface: it resolves the address, dials
/// with a connect timeout, authenticates, and hands commands to an
/// [`Rcon`] session with the default configuration. Anything beyond that
/// (custom charsets, buffer sizes, non-TCP transports) goes through
/// [`Rcon::builder`] directly.
///
/// # Examples
///
/// ```no_run
/// use mc_rcon::RconClient;
///
/// fn main() -> mc_rcon::errors::Result<()> {
///     let client = RconClient::connect("localhost", RconClient::DEFAULT_PORT, "password")?;
///     let result = client.command("say Hello World")?;
///     println!("Command result: {result}");
///     client.close()
/// }
/// ```
#[derive(Debug)]
pub struct RconClient {
    rcon: Rcon<TcpStream>,
}

impl RconClient {
    /// Default RCON port for Minecraft servers.
    pub const DEFAULT_PORT: u16 = 25575;

    /// Default TCP connect timeout.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

    /// Connects to `host:port` and authenticates with `password`.
    ///
    /// Dialing uses [`Self::DEFAULT_CONNECT_TIMEOUT`]; a rejected
    /// password closes the socket before returning.
    ///
    /// # Errors
    /// [`RconError::Connection`] if the host does not resolve or the TCP
    /// connection fails, [`RconError::AuthFailed`] if the server rejects
    /// the password.
    pub fn connect(host: &str, port: u16, password: &str) -> Result<Self> {
        info!(host, port, "connecting to rcon server");

        let addr = (host, port)
            .to_socket_addrs()
            .map_err(RconError::Connection)?
            .next()
            .ok_or_else(|| {
                RconError::Connection(io::Error::new(
                    io::ErrorKind::NotFound,
                    "host resolved to no addresses",
                ))
            })?;

        let stream = TcpStream::connect_timeout(&addr, Self::DEFAULT_CONNECT_TIMEOUT)
            .map_err(RconError::Connection)?;
        let rcon = Rcon::attach(stream)?;

        if let Err(err) = rcon.try_authenticate(password) {
            warn!(host, port, error = %err, "closing connection after failed authentication");
            let _ = rcon.close();
            return Err(err);
        }

        debug!(host, port, "authenticated");
        Ok(Self { rcon })
    }

    /// Executes a command and returns the server's output.
    ///
    /// # Errors
    /// Same as [`Rcon::send_command`].
    pub fn command(&self, command: &str) -> Result<String> {
        self.rcon.send_command(command)
    }

    /// Replaces the fragment strategy used for subsequent commands.
    pub fn set_fragment_strategy(&self, strategy: FragmentStrategy) {
        self.rcon.set_fragment_strategy(strategy);
    }

    /// Replaces the inactivity window used by
    /// [`FragmentStrategy::Timeout`].
    pub fn set_fragment_timeout(&self, timeout: Duration) {
        self.rcon.set_fragment_timeout(timeout);
    }

    /// Closes the connection. Safe to call more than once.
    ///
    /// # Errors
    /// [`RconError::Connection`] if the shutdown itself fails.
    pub fn close(&self) -> Result<()> {
        self.rcon.close()
    }
}
