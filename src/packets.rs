//! TWAMP-Light test packet structure and serialization.
//!
//! The same packet format is used in both directions: the sender leaves the
//! receive timestamp zeroed, the reflector fills it in and echoes everything
//! else back unchanged. All fields are serialized big-endian.

use thiserror::Error;

/// Size of the fixed TWAMP-Test header in bytes. Anything shorter than this
/// is not a valid test packet; anything beyond it is padding.
pub const MIN_PACKET_SIZE: usize = 24;

/// Errors produced when decoding a TWAMP-Test packet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    /// The input buffer is shorter than the 24-byte fixed header.
    #[error("TWAMP-Test packet too short: got {0} bytes, need at least {MIN_PACKET_SIZE}")]
    TooShort(usize),
}

/// A TWAMP-Light test packet.
///
/// Wire format (big-endian), total length 24 + padding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                        Sequence Number                        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                     Timestamp (seconds)                       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                     Timestamp (fraction)                      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |         Error Estimate        |              MBZ              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 Receive Timestamp (seconds)                   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 Receive Timestamp (fraction)                  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                        Padding ...                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestPacket {
    /// Packet sequence number for ordering and loss detection.
    pub seq: u32,
    /// NTP-era send timestamp, whole seconds since 1900.
    pub timestamp_sec: u32,
    /// Send timestamp, 32-bit binary fraction of a second.
    pub timestamp_frac: u32,
    /// Sender clock-sync quality; round-tripped unchanged by the reflector.
    pub error_estimate: u16,
    /// Must Be Zero on the wire; carried through on decode, not validated.
    pub mbz: u16,
    /// Reflector receive timestamp, whole seconds. Zero in outbound probes.
    pub recv_timestamp_sec: u32,
    /// Reflector receive timestamp, fraction of a second.
    pub recv_timestamp_frac: u32,
    /// Zero or more bytes used to reach a target probe size.
    pub padding: Vec<u8>,
}

impl TestPacket {
    /// Returns the encoded length of the packet.
    pub fn wire_len(&self) -> usize {
        MIN_PACKET_SIZE + self.padding.len()
    }

    /// Serializes the packet to big-endian wire format. Never fails.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.wire_len()];
        buf[0..4].copy_from_slice(&self.seq.to_be_bytes());
        buf[4..8].copy_from_slice(&self.timestamp_sec.to_be_bytes());
        buf[8..12].copy_from_slice(&self.timestamp_frac.to_be_bytes());
        buf[12..14].copy_from_slice(&self.error_estimate.to_be_bytes());
        buf[14..16].copy_from_slice(&self.mbz.to_be_bytes());
        buf[16..20].copy_from_slice(&self.recv_timestamp_sec.to_be_bytes());
        buf[20..24].copy_from_slice(&self.recv_timestamp_frac.to_be_bytes());
        buf[24..].copy_from_slice(&self.padding);
        buf
    }

    /// Deserializes a packet from big-endian wire format.
    ///
    /// Everything past the fixed header is treated as padding and copied out
    /// of the input buffer.
    ///
    /// # Errors
    /// Returns [`PacketError::TooShort`] if the buffer is smaller than 24 bytes.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < MIN_PACKET_SIZE {
            return Err(PacketError::TooShort(buf.len()));
        }
        Ok(Self {
            seq: u32::from_be_bytes(buf[0..4].try_into().unwrap()),
            timestamp_sec: u32::from_be_bytes(buf[4..8].try_into().unwrap()),
            timestamp_frac: u32::from_be_bytes(buf[8..12].try_into().unwrap()),
            error_estimate: u16::from_be_bytes(buf[12..14].try_into().unwrap()),
            mbz: u16::from_be_bytes(buf[14..16].try_into().unwrap()),
            recv_timestamp_sec: u32::from_be_bytes(buf[16..20].try_into().unwrap()),
            recv_timestamp_frac: u32::from_be_bytes(buf[20..24].try_into().unwrap()),
            padding: buf[24..].to_vec(),
        })
    }
}
