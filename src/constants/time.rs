//! Time constants. The engine clock counts milliseconds.

/// Ticks per second of game time
pub const TICKS_PER_SECOND: u32 = 1000;
/// Interval between heartbeat script runs (ticks)
pub const HEARTBEAT_INTERVAL: u32 = 6000;

/// Convert a tick delta to seconds
#[inline]
pub fn ticks_to_seconds(ticks: u32) -> f32 {
    ticks as f32 / TICKS_PER_SECOND as f32
}
