//! Bit-exact encoding and decoding of single RCON packet bodies.
//!
//! Wire layout of one complete packet on the stream:
//!
//! ```text
//! +--------+--------+--------+--------+...+--------+--------+
//! |  Length (i32)   | RequestId (i32)  |   Type (i32)      |
//! +--------+--------+--------+--------+...+--------+--------+
//! |  Payload (charset bytes)           |  0x00  |  0x00    |
//! +--------+--------+--------+--------+...+--------+--------+
//! ```
//!
//! All integers are little-endian. The length counts every byte after the
//! length field itself, so the smallest legal value is 10. The codec deals
//! only in packet bodies; the length prefix belongs to the framing layer.

use std::borrow::Cow;

use bytes::{Buf, BufMut, BytesMut};

use crate::errors::{RconError, Result};
use crate::packet::Packet;

/// Maximum client-to-server payload size in bytes.
pub const MAX_SERVERBOUND_PAYLOAD: usize = 1446;

/// Maximum server-to-client payload size in bytes.
pub const MAX_CLIENTBOUND_PAYLOAD: usize = 4096;

/// Fixed body overhead: request id, type, and the two trailing zero bytes.
pub(crate) const BODY_OVERHEAD: usize = 10;

/// Smallest legal value of the length prefix.
pub(crate) const MIN_BODY_LEN: i32 = BODY_OVERHEAD as i32;

/// Largest legal value of the length prefix.
pub(crate) const MAX_BODY_LEN: i32 = (MAX_CLIENTBOUND_PAYLOAD + BODY_OVERHEAD) as i32;

/// Payload text encoding, fixed when the session is built.
///
/// Some servers (Craftbukkit for Minecraft 1.4.7, for example) prefix
/// console colour escapes with the section sign, byte `0xA7`, which is not
/// valid on its own under UTF-8. [`Charset::Latin1`] presents such
/// payloads as ISO-8859-1 text instead of replacement characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Charset {
    /// UTF-8. Invalid sequences decode to U+FFFD.
    #[default]
    Utf8,

    /// ISO-8859-1. Each byte maps to the code point of the same value;
    /// characters above U+00FF encode as `?`.
    Latin1,
}

impl Charset {
    fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }

    fn encode(self, text: &str) -> Cow<'_, [u8]> {
        match self {
            Self::Utf8 => Cow::Borrowed(text.as_bytes()),
            Self::Latin1 => Cow::Owned(
                text.chars()
                    .map(|c| if (c as u32) < 0x100 { c as u8 } else { b'?' })
                    .collect(),
            ),
        }
    }
}

/// Encodes and decodes packet bodies under a fixed [`Charset`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketCodec {
    charset: Charset,
}

impl PacketCodec {
    /// Creates a codec using the given charset.
    #[must_use]
    pub fn new(charset: Charset) -> Self {
        Self { charset }
    }

    /// Encodes a packet body into `dst`: request id, type, payload bytes
    /// and the two terminating zero bytes. The length prefix is the frame
    /// writer's job.
    pub fn encode(&self, packet: &Packet, dst: &mut BytesMut) {
        dst.put_i32_le(packet.request_id);
        dst.put_i32_le(packet.packet_type);
        dst.put_slice(&self.charset.encode(&packet.payload));
        dst.put_u8(0);
        dst.put_u8(0);
    }

    /// Decodes a complete packet body.
    ///
    /// `body` must hold exactly the bytes the length prefix counted. The
    /// two trailing pad bytes are consumed without inspection.
    ///
    /// # Errors
    /// [`RconError::InvalidPacketLength`] if `body` is shorter than the
    /// fixed overhead of 10 bytes.
    pub fn decode(&self, body: &[u8]) -> Result<Packet> {
        if body.len() < BODY_OVERHEAD {
            return Err(RconError::InvalidPacketLength(body.len() as i32));
        }

        let mut cursor = body;
        let request_id = cursor.get_i32_le();
        let packet_type = cursor.get_i32_le();
        let payload = self.charset.decode(&cursor[..cursor.len() - 2]);

        Ok(Packet::new(request_id, packet_type, payload))
    }

    /// Number of bytes the payload occupies on the wire.
    #[must_use]
    pub fn encoded_payload_len(&self, packet: &Packet) -> usize {
        self.charset.encode(&packet.payload).len()
    }

    /// Fails if the encoded payload exceeds the client-to-server limit.
    ///
    /// # Errors
    /// [`RconError::PayloadTooLong`] for payloads over 1446 bytes.
    pub fn validate(&self, packet: &Packet) -> Result<()> {
        let len = self.encoded_payload_len(packet);
        if len > MAX_SERVERBOUND_PAYLOAD {
            return Err(RconError::PayloadTooLong {
                len,
                limit: MAX_SERVERBOUND_PAYLOAD,
            });
        }
        Ok(())
    }
}
