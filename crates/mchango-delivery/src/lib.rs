// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery pipeline for the Mchango bot.
//!
//! Two pieces: the [`RateLimiter`] gate enforcing the per-minute send budget,
//! and the [`OutboundQueue`] that drains messages in FIFO order with pacing,
//! bounded per-call timeouts, and head-priority retry.

pub mod limiter;
pub mod queue;

pub use limiter::RateLimiter;
pub use queue::{OutboundQueue, QueueSettings};
