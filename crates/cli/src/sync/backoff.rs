// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnection backoff schedule.

use rand::Rng;
use std::time::Duration;

/// Attempts below this use the deterministic curve.
pub const JITTER_FROM_ATTEMPT: u32 = 8;

/// Ceiling of the deterministic curve, in seconds.
pub const MAX_BASE_DELAY_SECS: f64 = 8.0;

/// Upper bound of the random extra delay added from attempt 8 on.
pub const MAX_JITTER_SECS: f64 = 5.0;

/// Delay before reconnect attempt `attempt`.
///
/// `min(8, 0.2 + attempt^1.5 * 0.4)` seconds for attempts 0..=7, then
/// `8 + uniform(0, 5)` seconds so many clients do not retry in lockstep.
pub fn reconnect_delay(attempt: u32) -> Duration {
    let jitter = rand::thread_rng().gen_range(0.0..MAX_JITTER_SECS);
    reconnect_delay_with(attempt, jitter)
}

/// [`reconnect_delay`] with the random component supplied by the caller.
pub fn reconnect_delay_with(attempt: u32, jitter_secs: f64) -> Duration {
    let secs = if attempt < JITTER_FROM_ATTEMPT {
        (0.2 + f64::from(attempt).powf(1.5) * 0.4).min(MAX_BASE_DELAY_SECS)
    } else {
        MAX_BASE_DELAY_SECS + jitter_secs.clamp(0.0, MAX_JITTER_SECS)
    };
    Duration::from_secs_f64(secs)
}
