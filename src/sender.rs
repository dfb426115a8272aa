//! Probe sender: issues sequenced test packets and measures round trips.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::net::{lookup_host, ToSocketAddrs, UdpSocket};

use crate::error::TwampError;
use crate::metrics::MetricsSink;
use crate::packets::TestPacket;
use crate::stats::ProbeSummary;
use crate::time::to_ntp;

/// Receive buffer for reply datagrams.
const RECV_BUF_SIZE: usize = 2048;

/// Outcome of one completed round trip.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ProbeResult {
    /// Sequence number echoed in the reply.
    pub seq: u32,
    /// Locally measured round-trip time.
    pub rtt: Duration,
    /// Wall-clock time the probe was sent.
    pub sent: DateTime<Utc>,
    /// Wall-clock time the reply arrived.
    pub received: DateTime<Utc>,
}

/// Issues probes to a fixed reflector address over one shared UDP socket
/// and maintains a running [`ProbeSummary`].
///
/// A single instance supports concurrent probe calls: the sequence counter
/// is atomic and the summary sits behind a mutex whose critical section
/// never spans socket I/O. Replies are not correlated to callers by
/// sequence number; with several probes in flight on the one socket, each
/// call is completed by the first reply it happens to read.
pub struct Sender {
    socket: UdpSocket,
    remote: SocketAddr,
    timeout: Duration,
    seq: AtomicU32,
    summary: Mutex<ProbeSummary>,
    metrics: Option<Arc<dyn MetricsSink>>,
}

impl Sender {
    /// Binds a local UDP socket and resolves the fixed reflector address.
    ///
    /// # Errors
    /// Address resolution and bind failures are fatal and returned here.
    pub async fn new<L, R>(
        local: L,
        remote: R,
        timeout: Duration,
        metrics: Option<Arc<dyn MetricsSink>>,
    ) -> Result<Self, TwampError>
    where
        L: ToSocketAddrs,
        R: ToSocketAddrs,
    {
        let remote = lookup_host(remote).await?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "remote address resolved to nothing",
            )
        })?;
        let socket = UdpSocket::bind(local).await?;
        log::info!(
            "Initialized TWAMP light sender {} -> {}",
            socket.local_addr()?,
            remote
        );
        Ok(Sender {
            socket,
            remote,
            timeout,
            seq: AtomicU32::new(0),
            summary: Mutex::new(ProbeSummary::new()),
            metrics,
        })
    }

    /// Sends one unpadded probe and waits for its reply.
    pub async fn send_probe(&self) -> Result<ProbeResult, TwampError> {
        self.send_probe_with_padding(0).await
    }

    /// Sends one probe carrying `padding_len` zero bytes of padding and
    /// blocks for a reply, bounded by the configured timeout.
    ///
    /// Every failure path (write error, timeout, read error, undecodable
    /// reply) records a lost sample in the summary and returns the error;
    /// the sender stays usable for subsequent probes.
    pub async fn send_probe_with_padding(
        &self,
        padding_len: usize,
    ) -> Result<ProbeResult, TwampError> {
        if let Some(metrics) = &self.metrics {
            metrics.inc_probes_sent();
        }

        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        log::debug!("Sending probe seq={} padding={}", seq, padding_len);

        let sent = Utc::now();
        let start = Instant::now();
        let (sec, frac) = to_ntp(sent);
        let pkt = TestPacket {
            seq,
            timestamp_sec: sec,
            timestamp_frac: frac,
            error_estimate: 1,
            mbz: 0,
            recv_timestamp_sec: 0,
            recv_timestamp_frac: 0,
            padding: vec![0u8; padding_len],
        };

        if let Err(e) = self.socket.send_to(&pkt.to_bytes(), self.remote).await {
            self.record_lost();
            return Err(e.into());
        }

        let mut buf = [0u8; RECV_BUF_SIZE];
        let len = match tokio::time::timeout(self.timeout, self.socket.recv_from(&mut buf)).await {
            Err(_) => {
                self.record_lost();
                return Err(TwampError::Timeout(self.timeout));
            }
            Ok(Err(e)) => {
                self.record_lost();
                return Err(e.into());
            }
            Ok(Ok((len, _))) => len,
        };
        let received = Utc::now();
        let rtt = start.elapsed();

        let reply = match TestPacket::from_bytes(&buf[..len]) {
            Ok(reply) => reply,
            Err(e) => {
                self.record_lost();
                return Err(e.into());
            }
        };

        self.lock_summary().update(rtt, true);
        if let Some(metrics) = &self.metrics {
            metrics.observe_rtt(rtt.as_secs_f64());
        }

        log::debug!("Received reply seq={} rtt={:?}", reply.seq, rtt);

        Ok(ProbeResult {
            seq: reply.seq,
            rtt,
            sent,
            received,
        })
    }

    /// Returns a snapshot of the running summary.
    pub fn summary(&self) -> ProbeSummary {
        self.lock_summary().clone()
    }

    /// Clears the running summary, starting a new measurement session.
    pub fn reset_summary(&self) {
        self.lock_summary().reset();
    }

    fn record_lost(&self) {
        self.lock_summary().update(Duration::ZERO, false);
    }

    fn lock_summary(&self) -> MutexGuard<'_, ProbeSummary> {
        // The critical sections only touch plain counters, so a panic while
        // holding the lock cannot leave the summary half-updated.
        self.summary.lock().unwrap_or_else(|e| e.into_inner())
    }
}
