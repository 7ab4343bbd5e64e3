// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Delay policies applied between failed attempts of one action.
//!
//! The orchestrator asks the policy for a delay after every failure. `None`
//! means the action is eligible again on the very next pass.

use std::time::Duration;

use rand::Rng;

/// Chooses how long a failed action waits before its next attempt.
pub trait RetryPolicy: Send + Sync {
    /// Delay after `retry_count` failures, or `None` to retry on the next pass.
    fn delay_for(&self, retry_count: u32) -> Option<Duration>;
}

/// Retries on the next pass with no delay.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedRetry;

impl RetryPolicy for FixedRetry {
    fn delay_for(&self, _retry_count: u32) -> Option<Duration> {
        None
    }
}

/// Doubles the delay after each failure, capped at `max`.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    pub base: Duration,
    pub max: Duration,
    /// Pick a uniformly random delay in `[0, computed]` ("full jitter").
    pub jitter: bool,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        ExponentialBackoff {
            base,
            max,
            jitter: false,
        }
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// The un-jittered delay for `retry_count` failures.
    pub fn ceiling(&self, retry_count: u32) -> Duration {
        let shift = retry_count.saturating_sub(1).min(31);
        self.base.saturating_mul(1u32 << shift).min(self.max)
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn delay_for(&self, retry_count: u32) -> Option<Duration> {
        if retry_count == 0 {
            return None;
        }
        let ceiling = self.ceiling(retry_count);
        if !self.jitter {
            return Some(ceiling);
        }
        let max_ms = u64::try_from(ceiling.as_millis()).unwrap_or(u64::MAX);
        Some(Duration::from_millis(
            rand::thread_rng().gen_range(0..=max_ms),
        ))
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
