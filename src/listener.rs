//! UDP receive-dispatch loop for the reflector side.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{ToSocketAddrs, UdpSocket};
use tokio::sync::watch;

use crate::error::TwampError;
use crate::metrics::MetricsSink;
use crate::packets::MIN_PACKET_SIZE;
use crate::reflector::Reflector;

/// Bound on how long a single receive poll blocks. The shutdown signal is
/// re-checked at least this often even when no traffic arrives.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Owns a UDP socket and serves TWAMP-Light probes sequentially: datagrams
/// are read one at a time, dispatched to a [`Reflector`], and the reply is
/// written back to the originating address best-effort.
pub struct Listener {
    socket: UdpSocket,
    reflector: Reflector,
    bufsize: usize,
    metrics: Option<Arc<dyn MetricsSink>>,
}

impl Listener {
    /// Binds a listener to `addr` with the given receive buffer size.
    ///
    /// # Errors
    /// Address resolution and bind failures are fatal and returned here.
    pub async fn bind<A: ToSocketAddrs>(
        addr: A,
        bufsize: usize,
        metrics: Option<Arc<dyn MetricsSink>>,
    ) -> Result<Self, TwampError> {
        let socket = UdpSocket::bind(addr).await?;
        log::info!(
            "Initialized TWAMP light listener on {}",
            socket.local_addr()?
        );
        Ok(Listener {
            socket,
            reflector: Reflector::new(metrics.clone()),
            bufsize,
            metrics,
        })
    }

    /// Returns the bound local address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Runs the receive-dispatch loop until `shutdown` becomes true.
    ///
    /// Datagrams shorter than the fixed header are counted as dropped and
    /// never reach the reflector. Reply-write failures and reflector errors
    /// are logged and the loop continues; any other socket read error is
    /// logged and propagated, terminating the loop.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<(), TwampError> {
        log::info!("Running TWAMP light listener");

        let mut buf = vec![0u8; self.bufsize];
        loop {
            if *shutdown.borrow() {
                log::info!("TWAMP light listener stopped by shutdown signal");
                return Ok(());
            }

            let (len, from) =
                match tokio::time::timeout(POLL_INTERVAL, self.socket.recv_from(&mut buf)).await {
                    // Poll deadline with no data: go re-check the signal.
                    Err(_) => continue,
                    Ok(Ok(received)) => received,
                    Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionReset => {
                        // ICMP port-unreachable surfaced on the UDP socket.
                        log::debug!("Ignoring connection reset: {}", e);
                        continue;
                    }
                    Ok(Err(e)) => {
                        log::error!("Error reading from UDP: {}", e);
                        return Err(e.into());
                    }
                };

            if len < MIN_PACKET_SIZE {
                log::warn!("Received malformed packet of {} bytes from {}", len, from);
                if let Some(metrics) = &self.metrics {
                    metrics.inc_packets_dropped();
                }
                continue;
            }

            let resp = match self.reflector.handle_probe(&buf[..len], from) {
                Ok(resp) => resp,
                Err(e) => {
                    log::error!("Error handling probe: {}", e);
                    continue;
                }
            };

            if let Err(e) = self.socket.send_to(&resp, from).await {
                // Best-effort reply; keep serving.
                log::warn!("Error writing response to {}: {}", from, e);
            }
        }
    }
}
