// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rolling per-minute send-budget gate protecting the transport from overload.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::debug;

/// Length of the rolling rate window.
const WINDOW: Duration = Duration::from_secs(60);

/// Mutable window state, guarded by the limiter's mutex.
#[derive(Debug)]
struct RateWindow {
    /// Start of the current window; `None` until the first acquire.
    window_start: Option<Instant>,
    sent_count: u32,
}

/// Tracks a rolling per-minute send budget.
///
/// The window starts at the first call after a reset and rolls over 60
/// seconds later. When the counter would exceed the limit, [`try_acquire`]
/// returns `false` immediately; callers must not spin on it -- the outbound
/// queue absorbs denials through its own pacing.
///
/// [`try_acquire`]: RateLimiter::try_acquire
pub struct RateLimiter {
    limit: u32,
    state: Mutex<RateWindow>,
}

impl RateLimiter {
    /// Creates a limiter allowing `limit` sends per rolling minute.
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            state: Mutex::new(RateWindow {
                window_start: None,
                sent_count: 0,
            }),
        }
    }

    /// Attempts to take one unit of send budget.
    ///
    /// Returns `true` and increments the counter if budget remains in the
    /// current window; returns `false` without side effects otherwise.
    pub fn try_acquire(&self) -> bool {
        let mut window = self.lock();
        let now = Instant::now();

        let expired = match window.window_start {
            Some(start) => now.duration_since(start) >= WINDOW,
            None => true,
        };
        if expired {
            window.window_start = Some(now);
            window.sent_count = 0;
            debug!(limit = self.limit, "rate window reset");
        }

        if window.sent_count >= self.limit {
            return false;
        }
        window.sent_count += 1;
        true
    }

    /// Number of sends counted in the current window.
    pub fn counter(&self) -> u32 {
        self.lock().sent_count
    }

    /// Wall-clock time at which the current window rolls over, if a window
    /// is open.
    pub fn reset_time(&self) -> Option<DateTime<Utc>> {
        let window = self.lock();
        let start = window.window_start?;
        let elapsed = Instant::now().duration_since(start);
        let remaining = WINDOW.saturating_sub(elapsed);
        Some(Utc::now() + chrono::Duration::from_std(remaining).unwrap_or_default())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RateWindow> {
        // A poisoned lock only means a panicking thread observed the counter
        // mid-update; the u32 state is still coherent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
