// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the core pipeline.

pub mod persistence;
pub mod transport;

pub use persistence::PersistenceAdapter;
pub use transport::TransportSender;
