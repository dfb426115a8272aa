//! Command-line configuration for the twamp-light binary.

use std::net::IpAddr;

use clap::Parser;
use thiserror::Error;

/// Raised when the parsed arguments are inconsistent.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConfigurationError(String);

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Configuration {
    /// Run as a reflector (listener) instead of a sender
    #[arg(short = 'i', long)]
    pub reflector: bool,

    /// Remote address of the reflector (sender mode)
    #[arg(short, long)]
    pub remote_addr: Option<IpAddr>,

    /// UDP port of the remote reflector
    #[arg(short = 'p', long, default_value_t = 862)]
    pub remote_port: u16,

    /// Local address to bind
    #[arg(short, long, default_value = "0.0.0.0")]
    pub local_addr: IpAddr,

    /// Local UDP port to bind (0 picks an ephemeral port)
    #[arg(short = 'o', long, default_value_t = 0)]
    pub local_port: u16,

    /// Reply timeout in seconds (sender mode)
    #[arg(short, long, default_value_t = 1)]
    pub timeout: u32,

    /// Number of probes to send (sender mode)
    #[arg(short, long, default_value_t = 5)]
    pub count: u32,

    /// Delay between probes in milliseconds (sender mode)
    #[arg(long, default_value_t = 1000)]
    pub interval: u64,

    /// Padding bytes appended to each probe (sender mode)
    #[arg(long, default_value_t = 0)]
    pub padding: usize,

    /// Receive buffer size in bytes (reflector mode)
    #[arg(long, default_value_t = 2048)]
    pub bufsize: usize,

    /// Report counters and RTT through the metrics facade
    #[arg(long)]
    pub metrics: bool,

    /// Print the final summary as JSON (sender mode)
    #[arg(long)]
    pub json: bool,
}

impl Configuration {
    /// Checks cross-field consistency that clap cannot express.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.reflector && self.remote_addr.is_none() {
            return Err(ConfigurationError(
                "sender mode requires --remote-addr".into(),
            ));
        }
        if self.timeout == 0 {
            return Err(ConfigurationError("--timeout must be at least 1".into()));
        }
        if self.bufsize < crate::packets::MIN_PACKET_SIZE {
            return Err(ConfigurationError(format!(
                "--bufsize must be at least {}",
                crate::packets::MIN_PACKET_SIZE
            )));
        }
        Ok(())
    }
}
