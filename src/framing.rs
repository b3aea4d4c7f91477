//! Length-prefixed framing on top of a blocking byte transport.
//!
//! A frame is a little-endian `i32` length followed by exactly that many
//! body bytes. The reader performs exact blocking reads, looping over
//! short reads, and surfaces end-of-stream as
//! [`RconError::ConnectionClosed`]. The writer assembles each frame in a
//! scratch buffer and hands it to the transport as a single write.

use std::io::{Read, Write};

use bytes::{BufMut, BytesMut};

use crate::codec::{PacketCodec, MAX_BODY_LEN, MIN_BODY_LEN};
use crate::errors::{RconError, Result};
use crate::packet::Packet;

/// Default scratch buffer capacity for outbound frames, a typical MTU.
pub(crate) const DEFAULT_WRITE_BUFFER_CAPACITY: usize = 1460;

/// Default body buffer capacity for inbound frames.
pub(crate) const DEFAULT_READ_BUFFER_CAPACITY: usize = 4096;

const LENGTH_PREFIX: usize = 4;

/// Encodes packets and writes them as complete frames.
#[derive(Debug)]
pub(crate) struct PacketWriter {
    codec: PacketCodec,
    buf: BytesMut,
}

impl PacketWriter {
    pub(crate) fn new(codec: PacketCodec, capacity: usize) -> Self {
        Self {
            codec,
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Validates, encodes and writes one packet as a single frame.
    ///
    /// The buffer grows beyond its initial capacity only when a validated
    /// payload would not otherwise fit.
    pub(crate) fn write<W: Write>(&mut self, dst: &mut W, packet: &Packet) -> Result<()> {
        self.codec.validate(packet)?;

        self.buf.clear();
        self.buf.put_bytes(0, LENGTH_PREFIX);
        self.codec.encode(packet, &mut self.buf);

        let body_len = (self.buf.len() - LENGTH_PREFIX) as i32;
        self.buf[..LENGTH_PREFIX].copy_from_slice(&body_len.to_le_bytes());

        dst.write_all(&self.buf)?;
        dst.flush()?;
        Ok(())
    }
}

/// Reads exactly one packet per call from a blocking byte source.
#[derive(Debug)]
pub(crate) struct PacketReader {
    codec: PacketCodec,
    buf: Vec<u8>,
}

impl PacketReader {
    pub(crate) fn new(codec: PacketCodec, capacity: usize) -> Self {
        Self {
            codec,
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Reads one complete frame and decodes its packet.
    ///
    /// Length prefixes under 10 or over 4106 are protocol violations; the
    /// upper bound keeps a corrupt or malicious stream from dictating the
    /// allocation size.
    pub(crate) fn read<R: Read>(&mut self, src: &mut R) -> Result<Packet> {
        let mut prefix = [0u8; LENGTH_PREFIX];
        src.read_exact(&mut prefix)?;
        let body_len = i32::from_le_bytes(prefix);

        if !(MIN_BODY_LEN..=MAX_BODY_LEN).contains(&body_len) {
            return Err(RconError::InvalidPacketLength(body_len));
        }

        self.buf.resize(body_len as usize, 0);
        src.read_exact(&mut self.buf)?;
        self.codec.decode(&self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::{PacketReader, PacketWriter};
    use crate::codec::PacketCodec;
    use crate::errors::RconError;
    use crate::packet::{packet_type, Packet};
    use std::io::Cursor;

    fn writer() -> PacketWriter {
        PacketWriter::new(PacketCodec::default(), super::DEFAULT_WRITE_BUFFER_CAPACITY)
    }

    fn reader() -> PacketReader {
        PacketReader::new(PacketCodec::default(), super::DEFAULT_READ_BUFFER_CAPACITY)
    }

    #[test]
    fn written_frame_starts_with_little_endian_length() {
        let mut out = Vec::new();
        writer()
            .write(&mut out, &Packet::new(1, packet_type::AUTH, "password"))
            .unwrap();

        // 4 + 4 + 8 + 2 = 18 bytes after the length field
        assert_eq!(&out[0..4], [0x12, 0x00, 0x00, 0x00]);
        assert_eq!(&out[4..8], [0x01, 0x00, 0x00, 0x00]);
        assert_eq!(&out[8..12], [0x03, 0x00, 0x00, 0x00]);
        assert_eq!(&out[12..20], b"password");
        assert_eq!(&out[20..], [0x00, 0x00]);
        assert_eq!(out.len(), 22);
    }

    #[test]
    fn oversized_payload_never_reaches_the_transport() {
        let mut out = Vec::new();
        let packet = Packet::new(1, packet_type::EXEC_COMMAND, "x".repeat(2000));
        let err = writer().write(&mut out, &packet).unwrap_err();

        assert!(matches!(err, RconError::PayloadTooLong { len: 2000, .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn writer_to_reader_round_trip() {
        let mut out = Vec::new();
        let original = Packet::new(41, packet_type::RESPONSE_VALUE, "joined the game");
        writer().write(&mut out, &original).unwrap();

        let decoded = reader().read(&mut Cursor::new(out)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn undersized_length_prefix_is_rejected() {
        let frame = 9i32.to_le_bytes();
        let err = reader().read(&mut Cursor::new(frame)).unwrap_err();
        assert!(matches!(err, RconError::InvalidPacketLength(9)));
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        let frame = 4107i32.to_le_bytes();
        let err = reader().read(&mut Cursor::new(frame)).unwrap_err();
        assert!(matches!(err, RconError::InvalidPacketLength(4107)));
    }

    #[test]
    fn negative_length_prefix_is_rejected() {
        let frame = (-1i32).to_le_bytes();
        let err = reader().read(&mut Cursor::new(frame)).unwrap_err();
        assert!(matches!(err, RconError::InvalidPacketLength(-1)));
    }

    #[test]
    fn largest_legal_frame_is_accepted() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&4106i32.to_le_bytes());
        frame.extend_from_slice(&7i32.to_le_bytes());
        frame.extend_from_slice(&0i32.to_le_bytes());
        frame.extend_from_slice(&vec![b'a'; 4096]);
        frame.extend_from_slice(&[0, 0]);

        let packet = reader().read(&mut Cursor::new(frame)).unwrap();
        assert_eq!(packet.payload.len(), 4096);
    }

    #[test]
    fn eof_before_the_prefix_is_connection_closed() {
        let err = reader().read(&mut Cursor::new(Vec::new())).unwrap_err();
        assert!(matches!(err, RconError::ConnectionClosed));
    }

    #[test]
    fn eof_inside_the_body_is_connection_closed() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&18i32.to_le_bytes());
        frame.extend_from_slice(&[0u8; 5]); // truncated body

        let err = reader().read(&mut Cursor::new(frame)).unwrap_err();
        assert!(matches!(err, RconError::ConnectionClosed));
    }
}
