//! TWAMP-Light active measurement.
//!
//! This crate implements the connectionless test-packet exchange of the
//! Two-Way Active Measurement Protocol (RFC 5357 "light" mode): a sender
//! emits timestamped UDP probes, a reflector stamps a receive time and
//! echoes them back, and the sender derives round-trip time, loss, and
//! jitter.
//!
//! # Usage
//!
//! Run as a reflector (server):
//! ```bash
//! twamp-light -i --local-addr 0.0.0.0 --local-port 862
//! ```
//!
//! Run as a sender (client):
//! ```bash
//! twamp-light --remote-addr 192.168.1.1 --remote-port 862 --count 10
//! ```

/// Command-line configuration and validation.
pub mod configuration;
/// Crate-wide error type.
pub mod error;
/// UDP receive-dispatch loop for the reflector side.
pub mod listener;
/// Metrics sink interface and recorder-backed implementation.
pub mod metrics;
/// TWAMP-Test packet structure and serialization.
pub mod packets;
/// Stateless probe echo logic.
pub mod reflector;
/// Probe sender and round-trip measurement.
pub mod sender;
/// Running RTT/jitter/loss summary statistics.
pub mod stats;
/// NTP timestamp conversion utilities.
pub mod time;
