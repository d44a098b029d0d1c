// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyed response cache consulted before any flow or rule handling.
//!
//! Entries are keyed by (subject, normalized message) exactly; there is no
//! fuzzy matching and no global key space. A hit short-circuits the whole
//! dispatch, including registration, so operators seeding entries for a
//! subject take over that subject's conversation wholesale.

use dashmap::DashMap;
use tracing::debug;

use mchango_core::types::SubjectId;

use crate::parse::normalize;

/// Exact-match (subject, normalized message) -> reply cache.
#[derive(Default)]
pub struct ResponseCache {
    entries: DashMap<(String, String), String>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a canned reply for one subject and one normalized message.
    pub fn seed(
        &self,
        subject: &SubjectId,
        message: impl AsRef<str>,
        reply: impl Into<String>,
    ) {
        self.entries.insert(
            (subject.as_str().to_string(), normalize(message.as_ref())),
            reply.into(),
        );
    }

    /// Looks up a canned reply. The message is normalized before matching.
    pub fn lookup(&self, subject: &SubjectId, message: &str) -> Option<String> {
        let key = (subject.as_str().to_string(), normalize(message));
        let hit = self.entries.get(&key).map(|e| e.clone());
        if hit.is_some() {
            debug!(subject = %subject, message = key.1.as_str(), "response cache hit");
        }
        hit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
