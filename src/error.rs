//! Crate-wide error type.

use std::time::Duration;

use thiserror::Error;

use crate::packets::PacketError;

/// Errors surfaced by senders and listeners.
#[derive(Debug, Error)]
pub enum TwampError {
    /// A received datagram could not be decoded as a test packet.
    #[error("decoding packet: {0}")]
    Decode(#[from] PacketError),

    /// A socket operation failed.
    #[error("socket I/O: {0}")]
    Io(#[from] std::io::Error),

    /// No reply arrived within the sender's configured timeout.
    #[error("timed out after {0:?} waiting for reply")]
    Timeout(Duration),
}
