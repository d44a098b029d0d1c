// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory persistence adapter for deterministic testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use mchango_core::types::{Group, Role, SubjectId, UserProfile};
use mchango_core::{MchangoError, PersistenceAdapter};

/// One recorded contribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionRecord {
    pub phone: SubjectId,
    pub group_code: Option<String>,
    pub amount: u64,
}

/// An in-memory user/group/contribution store.
///
/// Every mutation is visible to subsequent reads (read-your-writes), and
/// [`fail_next_calls`] scripts failures for testing the engine's error paths.
///
/// [`fail_next_calls`]: MockPersistence::fail_next_calls
pub struct MockPersistence {
    users: Mutex<HashMap<String, UserProfile>>,
    groups: Mutex<HashMap<String, Group>>,
    /// (member phone, group code) pairs.
    memberships: Mutex<Vec<(SubjectId, String)>>,
    contributions: Mutex<Vec<ContributionRecord>>,
    fail_calls_remaining: AtomicU32,
    group_counter: AtomicU32,
}

impl MockPersistence {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            groups: Mutex::new(HashMap::new()),
            memberships: Mutex::new(Vec::new()),
            contributions: Mutex::new(Vec::new()),
            fail_calls_remaining: AtomicU32::new(0),
            group_counter: AtomicU32::new(0),
        }
    }

    /// Pre-seed a registered user.
    pub async fn seed_user(&self, phone: &str, role: Role, name: &str) {
        self.users.lock().await.insert(
            phone.to_string(),
            UserProfile {
                phone: SubjectId::from(phone),
                role,
                name: name.to_string(),
            },
        );
    }

    /// Pre-seed a group with a known join code.
    pub async fn seed_group(&self, code: &str, name: &str, amount: u64, max_members: u32) {
        self.groups.lock().await.insert(
            code.to_string(),
            Group {
                code: code.to_string(),
                name: name.to_string(),
                contribution_amount: amount,
                max_members,
            },
        );
    }

    /// The next `n` adapter calls fail with a persistence error.
    pub fn fail_next_calls(&self, n: u32) {
        self.fail_calls_remaining.store(n, Ordering::SeqCst);
    }

    /// All recorded contributions, in order.
    pub async fn contributions(&self) -> Vec<ContributionRecord> {
        self.contributions.lock().await.clone()
    }

    /// Group codes the given phone has joined.
    pub async fn memberships_of(&self, phone: &str) -> Vec<String> {
        self.memberships
            .lock()
            .await
            .iter()
            .filter(|(p, _)| p.as_str() == phone)
            .map(|(_, code)| code.clone())
            .collect()
    }

    fn check_scripted_failure(&self) -> Result<(), MchangoError> {
        let remaining = self.fail_calls_remaining.load(Ordering::SeqCst);
        if remaining > 0
            && self
                .fail_calls_remaining
                .compare_exchange(remaining, remaining - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            return Err(MchangoError::persistence("scripted store failure"));
        }
        Ok(())
    }
}

impl Default for MockPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceAdapter for MockPersistence {
    async fn find_user_by_phone(
        &self,
        phone: &SubjectId,
    ) -> Result<Option<UserProfile>, MchangoError> {
        self.check_scripted_failure()?;
        Ok(self.users.lock().await.get(phone.as_str()).cloned())
    }

    async fn create_user(
        &self,
        phone: &SubjectId,
        role: Role,
        name: &str,
    ) -> Result<(), MchangoError> {
        self.check_scripted_failure()?;
        self.users.lock().await.insert(
            phone.as_str().to_string(),
            UserProfile {
                phone: phone.clone(),
                role,
                name: name.to_string(),
            },
        );
        Ok(())
    }

    async fn update_user_name(&self, phone: &SubjectId, name: &str) -> Result<(), MchangoError> {
        self.check_scripted_failure()?;
        let mut users = self.users.lock().await;
        match users.get_mut(phone.as_str()) {
            Some(profile) => {
                profile.name = name.to_string();
                Ok(())
            }
            None => Err(MchangoError::persistence(format!(
                "no user with phone {phone}"
            ))),
        }
    }

    async fn find_groups_for_user(&self, phone: &SubjectId) -> Result<Vec<Group>, MchangoError> {
        self.check_scripted_failure()?;
        let memberships = self.memberships.lock().await;
        let groups = self.groups.lock().await;
        Ok(memberships
            .iter()
            .filter(|(p, _)| p == phone)
            .filter_map(|(_, code)| groups.get(code).cloned())
            .collect())
    }

    async fn create_contribution_record(
        &self,
        phone: &SubjectId,
        group_code: Option<&str>,
        amount: u64,
    ) -> Result<(), MchangoError> {
        self.check_scripted_failure()?;
        self.contributions.lock().await.push(ContributionRecord {
            phone: phone.clone(),
            group_code: group_code.map(String::from),
            amount,
        });
        Ok(())
    }

    async fn create_group(
        &self,
        leader: &SubjectId,
        name: &str,
        contribution_amount: u64,
        max_members: u32,
    ) -> Result<Group, MchangoError> {
        self.check_scripted_failure()?;
        let n = self.group_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let group = Group {
            code: format!("CHAMA{n:03}"),
            name: name.to_string(),
            contribution_amount,
            max_members,
        };
        self.groups
            .lock()
            .await
            .insert(group.code.clone(), group.clone());
        self.memberships
            .lock()
            .await
            .push((leader.clone(), group.code.clone()));
        Ok(group)
    }

    async fn join_group(
        &self,
        phone: &SubjectId,
        code: &str,
    ) -> Result<Option<Group>, MchangoError> {
        self.check_scripted_failure()?;
        let Some(group) = self.groups.lock().await.get(code).cloned() else {
            return Ok(None);
        };
        self.memberships
            .lock()
            .await
            .push((phone.clone(), code.to_string()));
        Ok(Some(group))
    }
}
