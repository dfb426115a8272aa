//! Metrics reporting hooks for TWAMP traffic.
//!
//! Components take an `Option<Arc<dyn MetricsSink>>`; when it is `None`, all
//! reporting calls are no-ops. The provided [`RecorderSink`] records through
//! the `metrics` facade, so it is itself inert until the embedding process
//! installs a recorder (e.g. a Prometheus exporter). Registry and exporter
//! wiring are deliberately left to the embedder.

use metrics::{counter, histogram};

/// Counters and histograms the sender and listener report into.
pub trait MetricsSink: Send + Sync {
    /// Called once per probe attempt on the sender.
    fn inc_probes_sent(&self);
    /// Called once per inbound probe handed to the reflector.
    fn inc_probes_received(&self);
    /// Called once per malformed datagram discarded by the listener.
    fn inc_packets_dropped(&self);
    /// Records one round-trip time observation, in seconds.
    fn observe_rtt(&self, seconds: f64);
}

/// [`MetricsSink`] implementation backed by the global `metrics` recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecorderSink;

impl MetricsSink for RecorderSink {
    fn inc_probes_sent(&self) {
        counter!("twamp_probes_sent_total").increment(1);
    }

    fn inc_probes_received(&self) {
        counter!("twamp_probes_received_total").increment(1);
    }

    fn inc_packets_dropped(&self) {
        counter!("twamp_packets_dropped_total").increment(1);
    }

    fn observe_rtt(&self, seconds: f64) {
        histogram!("twamp_rtt_seconds").record(seconds);
    }
}
