// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence adapter trait for the user/group/contribution store.

use async_trait::async_trait;

use crate::error::MchangoError;
use crate::types::{Group, Role, SubjectId, UserProfile};

/// Opaque persistence collaborator.
///
/// The conversation engine treats every call as potentially failing and
/// assumes nothing beyond read-your-writes within a single dispatch.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Looks up a registered user by phone number.
    async fn find_user_by_phone(
        &self,
        phone: &SubjectId,
    ) -> Result<Option<UserProfile>, MchangoError>;

    /// Creates a new user profile.
    async fn create_user(
        &self,
        phone: &SubjectId,
        role: Role,
        name: &str,
    ) -> Result<(), MchangoError>;

    /// Updates an existing user's display name.
    async fn update_user_name(&self, phone: &SubjectId, name: &str) -> Result<(), MchangoError>;

    /// Lists the groups a user belongs to.
    async fn find_groups_for_user(&self, phone: &SubjectId) -> Result<Vec<Group>, MchangoError>;

    /// Records a completed contribution.
    async fn create_contribution_record(
        &self,
        phone: &SubjectId,
        group_code: Option<&str>,
        amount: u64,
    ) -> Result<(), MchangoError>;

    /// Creates a new group led by the given user. Returns the group with its
    /// generated join code.
    async fn create_group(
        &self,
        leader: &SubjectId,
        name: &str,
        contribution_amount: u64,
        max_members: u32,
    ) -> Result<Group, MchangoError>;

    /// Adds a user to the group with the given join code. `Ok(None)` means
    /// no group carries that code.
    async fn join_group(
        &self,
        phone: &SubjectId,
        code: &str,
    ) -> Result<Option<Group>, MchangoError>;
}
