//! Conversion between wall-clock time and the 64-bit NTP timestamp format.

use chrono::{DateTime, Utc};

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch (1970-01-01).
pub const NTP_UNIX_OFFSET: i64 = 2_208_988_800;

/// Converts a wall-clock time to NTP wire format: whole seconds since 1900
/// and a 32-bit binary fraction of a second.
///
/// The fraction is truncated, so the round-trip error through [`from_ntp`] is
/// bounded by a fraction of a nanosecond.
pub fn to_ntp(t: DateTime<Utc>) -> (u32, u32) {
    let secs = (t.timestamp() + NTP_UNIX_OFFSET) as u32;
    let frac = (((t.timestamp_subsec_nanos() as u64) << 32) / 1_000_000_000) as u32;
    (secs, frac)
}

/// Converts an NTP wire timestamp back to wall-clock time.
pub fn from_ntp(secs: u32, frac: u32) -> DateTime<Utc> {
    let s = secs as i64 - NTP_UNIX_OFFSET;
    let nanos = ((frac as u64) * 1_000_000_000) >> 32;
    // s and nanos are always within chrono's representable range for any
    // 32-bit seconds value, so this cannot actually fail.
    DateTime::from_timestamp(s, nanos as u32).unwrap_or_default()
}
