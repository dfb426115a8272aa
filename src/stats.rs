//! Running RTT/jitter/loss aggregate for a probe session.

use std::time::Duration;

/// Mutable aggregate of probe outcomes, owned by one sender for the lifetime
/// of a measurement session.
///
/// `min_rtt`/`max_rtt` stay at zero until the first successful sample;
/// `jitter` accumulates the absolute difference between consecutive
/// successful RTT samples.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ProbeSummary {
    /// Number of successful probes.
    pub count: u64,
    /// Number of failed or timed-out probes.
    pub lost: u64,
    pub min_rtt: Duration,
    pub max_rtt: Duration,
    pub total_rtt: Duration,
    /// Sum of |RTT_i - RTT_{i-1}| over successful samples.
    pub jitter: Duration,
    pub last_rtt: Duration,
}

impl ProbeSummary {
    /// Creates an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one probe outcome.
    ///
    /// A failed probe only increments `lost`; the RTT argument is ignored.
    pub fn update(&mut self, rtt: Duration, ok: bool) {
        if !ok {
            self.lost += 1;
            return;
        }
        self.count += 1;
        self.total_rtt += rtt;
        if self.min_rtt.is_zero() || rtt < self.min_rtt {
            self.min_rtt = rtt;
        }
        if rtt > self.max_rtt {
            self.max_rtt = rtt;
        }
        if !self.last_rtt.is_zero() {
            self.jitter += self.last_rtt.abs_diff(rtt);
        }
        self.last_rtt = rtt;
    }

    /// Returns the mean RTT over successful probes, or zero if there are none.
    pub fn avg_rtt(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        self.total_rtt / self.count as u32
    }

    /// Clears all fields, starting a new session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
