// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP transport adapter for the WhatsApp messaging gateway.
//!
//! Implements [`TransportSender`] against the gateway's REST API: send
//! endpoints for each message shape, a pull endpoint returning at most one
//! pending notification, a delete endpoint for acknowledgement, and an
//! instance state endpoint. The API is used as-is; callers (the outbound
//! queue and the poller) wrap every call in a bounded timeout.

pub mod http;
pub mod wire;

pub use http::HttpTransport;
