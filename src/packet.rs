//! The RCON packet value type and its wire-visible type codes.

use std::fmt;

/// Wire values for the packet `type` field.
///
/// These are plain integer constants rather than an enum: the value `2` is
/// shared between [`EXEC_COMMAND`](packet_type::EXEC_COMMAND) (client to
/// server) and [`AUTH_RESPONSE`](packet_type::AUTH_RESPONSE) (server to
/// client), and only direction and phase tell them apart. The wire carries
/// no direction bit, so a tagged representation cannot decode
/// unambiguously.
pub mod packet_type {
    /// Command output from the server. Also the type of the spurious empty
    /// packet some servers emit before an auth response.
    pub const RESPONSE_VALUE: i32 = 0;

    /// Command execution request, client to server.
    pub const EXEC_COMMAND: i32 = 2;

    /// Authentication outcome, server to client. Shares the wire value of
    /// [`EXEC_COMMAND`]; a request id of `-1` signals failure.
    pub const AUTH_RESPONSE: i32 = 2;

    /// Authentication request, client to server.
    pub const AUTH: i32 = 3;

    /// Human-readable name for a type code, for diagnostics.
    #[must_use]
    pub fn name(value: i32) -> &'static str {
        match value {
            RESPONSE_VALUE => "RESPONSE_VALUE",
            EXEC_COMMAND => "EXEC_COMMAND/AUTH_RESPONSE",
            AUTH => "AUTH",
            _ => "UNKNOWN",
        }
    }
}

/// One logical RCON packet: request id, type code and payload text.
///
/// Packets are immutable values; equality and hashing are structural over
/// all three fields. The request id `-1` is reserved by servers to signal
/// authentication failure, which is what [`Packet::is_valid`] checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Packet {
    /// The id used to match this packet to its request.
    pub request_id: i32,

    /// The wire type code, one of the [`packet_type`] constants.
    pub packet_type: i32,

    /// The payload text. An absent payload is the empty string.
    pub payload: String,
}

impl Packet {
    /// Creates a packet from its three fields.
    pub fn new(request_id: i32, packet_type: i32, payload: impl Into<String>) -> Self {
        Self {
            request_id,
            packet_type,
            payload: payload.into(),
        }
    }

    /// Creates a packet with an empty payload.
    #[must_use]
    pub fn empty(request_id: i32, packet_type: i32) -> Self {
        Self::new(request_id, packet_type, "")
    }

    /// A packet is valid unless it carries the server's `-1` failure
    /// sentinel as its request id.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.request_id != -1
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packet{{requestId={}, type={}, payload='{}'}}",
            self.request_id, self.packet_type, self.payload
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{packet_type, Packet};

    #[test]
    fn sentinel_request_id_is_invalid() {
        assert!(Packet::new(0, packet_type::AUTH_RESPONSE, "").is_valid());
        assert!(Packet::new(i32::MIN, packet_type::RESPONSE_VALUE, "").is_valid());
        assert!(!Packet::new(-1, packet_type::AUTH_RESPONSE, "").is_valid());
    }

    #[test]
    fn equality_is_structural() {
        let a = Packet::new(7, packet_type::EXEC_COMMAND, "list");
        let b = Packet::new(7, packet_type::EXEC_COMMAND, "list");
        assert_eq!(a, b);
        assert_ne!(a, Packet::new(8, packet_type::EXEC_COMMAND, "list"));
        assert_ne!(a, Packet::new(7, packet_type::AUTH, "list"));
        assert_ne!(a, Packet::new(7, packet_type::EXEC_COMMAND, "stop"));
    }

    #[test]
    fn empty_constructor_yields_empty_payload() {
        let packet = Packet::empty(1, packet_type::EXEC_COMMAND);
        assert_eq!(packet.payload, "");
    }

    #[test]
    fn display_mirrors_fields() {
        let packet = Packet::new(3, packet_type::AUTH, "secret");
        assert_eq!(
            packet.to_string(),
            "Packet{requestId=3, type=3, payload='secret'}"
        );
    }

    #[test]
    fn type_names_cover_the_closed_set() {
        assert_eq!(packet_type::name(0), "RESPONSE_VALUE");
        assert_eq!(packet_type::name(2), "EXEC_COMMAND/AUTH_RESPONSE");
        assert_eq!(packet_type::name(3), "AUTH");
        assert_eq!(packet_type::name(42), "UNKNOWN");
    }
}
