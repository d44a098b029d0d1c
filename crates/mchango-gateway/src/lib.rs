// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator HTTP surface for the Mchango bot.
//!
//! A small axum server exposing health, outbound queue inspection and
//! clearing, the poller enable/disable toggle, and a test-message endpoint.
//! Bound to localhost by default; it carries no end-user traffic.

pub mod handlers;
pub mod server;

pub use server::{start_server, AdminState};
