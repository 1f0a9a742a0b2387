// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Message id generation.
//!
//! Request message ids are connection-scoped: each connection gets a fresh
//! [`MessageIdGenerator`]. An id packs the seconds elapsed since 2025-01-01
//! into the high 32 bits and a per-second sequence into the low 32 bits.

use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

/// 2025-01-01T00:00:00Z in Unix seconds.
pub const ID_EPOCH_SECS: u64 = 1_735_689_600;

/// A source of the current time.
pub trait ClockSource: Send + Sync {
    /// Returns the current time in seconds since the Unix epoch.
    fn now_secs(&self) -> u64;
}

/// System clock implementation using `std::time::SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

impl<C: ClockSource> ClockSource for &C {
    fn now_secs(&self) -> u64 {
        (*self).now_secs()
    }
}

/// Generates strictly increasing message ids for one connection.
#[derive(Debug)]
pub struct MessageIdGenerator<C: ClockSource = SystemClock> {
    clock: C,
    last_secs: u64,
    seq: u32,
}

impl MessageIdGenerator<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MessageIdGenerator<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ClockSource> MessageIdGenerator<C> {
    /// Creates a generator with a custom clock source.
    pub fn with_clock(clock: C) -> Self {
        MessageIdGenerator {
            clock,
            last_secs: 0,
            seq: 0,
        }
    }

    /// Returns the next id.
    ///
    /// A clock that steps backwards keeps the previous second, and an
    /// exhausted sequence rolls into the next second, so ids never repeat.
    pub fn next_id(&mut self) -> u64 {
        let secs = self.clock.now_secs().saturating_sub(ID_EPOCH_SECS);
        if secs > self.last_secs {
            self.last_secs = secs;
            self.seq = 0;
        }
        if self.seq == u32::MAX {
            self.last_secs += 1;
            self.seq = 0;
        }
        self.seq += 1;
        (self.last_secs << 32) | u64::from(self.seq)
    }
}

/// Returns a positive random id the server uses to deduplicate retried sends.
pub fn random_id() -> i64 {
    rand::thread_rng().gen_range(1..i64::MAX)
}

/// Returns the temporary message id used for an optimistic row.
pub fn temporary_message_id(random_id: i64) -> i64 {
    -(random_id.saturating_abs().max(1))
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
