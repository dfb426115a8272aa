//! Stateless probe echo logic.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;

use crate::metrics::MetricsSink;
use crate::packets::{PacketError, TestPacket};
use crate::time::to_ntp;

/// Decodes inbound probes, stamps the receive timestamp, and re-encodes
/// them for the return trip. Holds no per-session state.
pub struct Reflector {
    metrics: Option<Arc<dyn MetricsSink>>,
}

impl Reflector {
    pub fn new(metrics: Option<Arc<dyn MetricsSink>>) -> Self {
        Reflector { metrics }
    }

    /// Handles one raw probe datagram and returns the encoded reply.
    ///
    /// # Errors
    /// Propagates the decode error for inputs shorter than the fixed header.
    /// The listener filters those out before dispatching, so hitting this
    /// path means the caller skipped that check.
    pub fn handle_probe(&self, msg: &[u8], from: SocketAddr) -> Result<Vec<u8>, PacketError> {
        log::debug!("Received probe from {}", from);

        if let Some(metrics) = &self.metrics {
            metrics.inc_probes_received();
        }

        let mut pkt = TestPacket::from_bytes(msg)?;
        let (sec, frac) = to_ntp(Utc::now());
        pkt.recv_timestamp_sec = sec;
        pkt.recv_timestamp_frac = frac;

        log::debug!("Echoed response seq={} to {}", pkt.seq, from);

        Ok(pkt.to_bytes())
    }
}
