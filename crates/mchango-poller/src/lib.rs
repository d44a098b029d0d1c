// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound notification polling and dispatch.
//!
//! Two cooperating loops run until shutdown:
//!
//! - The **fetch loop** asks the gateway for at most one pending
//!   notification per tick, buffers it, then acknowledges it. Buffering
//!   before acknowledging gives at-least-once hand-off: a crash between the
//!   two redelivers the notification on restart.
//! - The **drain loop** empties the buffer on a faster tick and dispatches
//!   each notification to the conversation engine concurrently. Per-sender
//!   ordering is preserved by the engine's subject locks, not here.
//!
//! Fetch errors are classified: an empty queue is silent, transient errors
//! are logged and retried next tick, and an authentication failure halts
//! polling permanently until an operator intervenes.

pub mod poller;

pub use poller::{NotificationPoller, PollerSettings};
