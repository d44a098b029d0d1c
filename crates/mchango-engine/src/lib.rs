// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversational state machine for the Mchango bot.
//!
//! The [`ConversationEngine`] turns inbound notifications into enqueued
//! replies: a keyed [`ResponseCache`] is consulted first, then the sender's
//! session flow, then trigger-phrase rules, with a main-menu fallback.
//! Sessions live in the [`SessionStore`] and are evicted after idle timeout.

pub mod cache;
pub mod engine;
pub mod parse;
pub mod rules;
pub mod session;
pub mod templates;

pub use cache::ResponseCache;
pub use engine::{ConversationEngine, FlowLimits};
pub use session::{ActiveFlow, SessionStore};
