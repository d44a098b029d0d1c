// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Mchango integration tests.
//!
//! Provides deterministic mock implementations of the transport and
//! persistence collaborator traits.

pub mod mock_persistence;
pub mod mock_transport;

pub use mock_persistence::{ContributionRecord, MockPersistence};
pub use mock_transport::{MockTransport, SentMessage};
