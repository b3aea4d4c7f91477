//! Strategies for deciding when a fragmented command response is complete.
//!
//! The server may split one command's output across several
//! `RESPONSE_VALUE` packets sharing a request id, without any end-of-
//! sequence marker. Detecting the last fragment is therefore a guess, a
//! wait, or a probe; each [`FragmentStrategy`] variant picks one.

/// How the session decides that no more fragments will arrive for a
/// command.
///
/// Selected per session via
/// [`Rcon::set_fragment_strategy`](crate::Rcon::set_fragment_strategy) or
/// per command via
/// [`Rcon::send_command_with`](crate::Rcon::send_command_with).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FragmentStrategy {
    /// Stop after any fragment whose payload is shorter than the 4096
    /// byte server-to-client ceiling.
    ///
    /// Simple but heuristic: a response whose total size is an exact
    /// multiple of 4096 leaves the client waiting for a final short
    /// fragment that never comes. Kept for callers that specifically want
    /// the single-round-trip behaviour; prefer
    /// [`ActiveProbe`](Self::ActiveProbe).
    PacketSize,

    /// Treat the response as complete once no further packet arrives
    /// within the session's fragment timeout (100 ms unless configured).
    ///
    /// Every received fragment re-arms the inactivity window, so the
    /// approach is reliable regardless of fragment sizes, but each
    /// command pays the window as added latency.
    Timeout,

    /// Write a second, empty command after the real one and collect
    /// fragments until the server echoes the second command's id.
    ///
    /// The server answers strictly in order, so the echo proves the real
    /// response is complete. Deterministic, costs exactly one extra round
    /// trip, and does not depend on timing. This is the default.
    #[default]
    ActiveProbe,
}
