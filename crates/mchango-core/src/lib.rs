// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core error types, shared types, and collaborator traits for Mchango.
//!
//! Mchango is a WhatsApp chama (savings-group) bot. This crate is the leaf
//! of the workspace: everything else depends on it and it depends on
//! nothing else in the workspace.

pub mod error;
pub mod traits;
pub mod types;

pub use error::MchangoError;
pub use traits::{PersistenceAdapter, TransportSender};
