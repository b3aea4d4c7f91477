//! The byte-stream contract an [`Rcon`](crate::Rcon) session drives.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

/// A connected, bidirectional, blocking byte stream.
///
/// A session owns exactly one transport and never dials itself; callers
/// hand it an already-connected stream (see [`RconClient`](crate::RconClient)
/// for the TCP convenience path). Read-timeout control is what lets the
/// [`Timeout`](crate::FragmentStrategy::Timeout) strategy arm its
/// inactivity window.
pub trait Transport: Read + Write {
    /// Sets or clears the timeout applied to subsequent reads.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the stream rejects the change.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;

    /// Shuts the stream down in both directions.
    ///
    /// Must be idempotent: shutting down an already-closed transport is
    /// not an error.
    ///
    /// # Errors
    /// Returns the underlying I/O error for failures other than the
    /// stream already being closed.
    fn shutdown(&mut self) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }

    fn shutdown(&mut self) -> io::Result<()> {
        match TcpStream::shutdown(self, Shutdown::Both) {
            Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}
