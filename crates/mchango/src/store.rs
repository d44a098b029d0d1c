// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-file-backed persistence adapter.
//!
//! The default single-process store: all state lives in memory behind a
//! mutex and is written out as pretty JSON after every mutation. Suited to
//! one bot instance with modest group counts; swap in another
//! [`PersistenceAdapter`] for anything bigger.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use mchango_core::types::{Group, Role, SubjectId, UserProfile};
use mchango_core::{MchangoError, PersistenceAdapter};

/// One recorded contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredContribution {
    pub phone: String,
    pub group_code: Option<String>,
    pub amount: u64,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    users: HashMap<String, UserProfile>,
    groups: HashMap<String, Group>,
    /// (member phone, group code) pairs.
    memberships: Vec<(String, String)>,
    contributions: Vec<StoredContribution>,
}

/// File-backed store of users, groups, and contributions.
pub struct JsonStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl JsonStore {
    /// Opens the store, loading existing state from `path` if present.
    pub async fn open(path: PathBuf) -> Result<Self, MchangoError> {
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| MchangoError::Persistence {
                message: format!("corrupt store file {}", path.display()),
                source: Some(Box::new(e)),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => {
                return Err(MchangoError::Persistence {
                    message: format!("cannot read store file {}", path.display()),
                    source: Some(Box::new(e)),
                });
            }
        };

        info!(
            path = %path.display(),
            users = state.users.len(),
            groups = state.groups.len(),
            "store opened"
        );
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// The default store location under the platform data directory.
    pub fn default_path() -> Result<PathBuf, MchangoError> {
        let base = dirs::data_dir()
            .ok_or_else(|| MchangoError::Config("cannot determine data directory".into()))?;
        Ok(base.join("mchango").join("store.json"))
    }

    async fn save(&self, state: &StoreState) -> Result<(), MchangoError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MchangoError::Persistence {
                    message: format!("cannot create store directory {}", parent.display()),
                    source: Some(Box::new(e)),
                })?;
        }
        let bytes = serde_json::to_vec_pretty(state).map_err(|e| MchangoError::Persistence {
            message: "cannot serialize store state".into(),
            source: Some(Box::new(e)),
        })?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| MchangoError::Persistence {
                message: format!("cannot write store file {}", self.path.display()),
                source: Some(Box::new(e)),
            })?;
        debug!(path = %self.path.display(), "store saved");
        Ok(())
    }

    fn next_group_code(state: &StoreState) -> String {
        let mut n = state.groups.len() as u32 + 1;
        loop {
            let code = format!("CHAMA{n:03}");
            if !state.groups.contains_key(&code) {
                return code;
            }
            n += 1;
        }
    }
}

#[async_trait]
impl PersistenceAdapter for JsonStore {
    async fn find_user_by_phone(
        &self,
        phone: &SubjectId,
    ) -> Result<Option<UserProfile>, MchangoError> {
        Ok(self.state.lock().await.users.get(phone.as_str()).cloned())
    }

    async fn create_user(
        &self,
        phone: &SubjectId,
        role: Role,
        name: &str,
    ) -> Result<(), MchangoError> {
        let mut state = self.state.lock().await;
        state.users.insert(
            phone.as_str().to_string(),
            UserProfile {
                phone: phone.clone(),
                role,
                name: name.to_string(),
            },
        );
        self.save(&state).await
    }

    async fn update_user_name(&self, phone: &SubjectId, name: &str) -> Result<(), MchangoError> {
        let mut state = self.state.lock().await;
        let profile = state.users.get_mut(phone.as_str()).ok_or_else(|| {
            MchangoError::persistence(format!("no user with phone {phone}"))
        })?;
        profile.name = name.to_string();
        self.save(&state).await
    }

    async fn find_groups_for_user(&self, phone: &SubjectId) -> Result<Vec<Group>, MchangoError> {
        let state = self.state.lock().await;
        Ok(state
            .memberships
            .iter()
            .filter(|(p, _)| p == phone.as_str())
            .filter_map(|(_, code)| state.groups.get(code).cloned())
            .collect())
    }

    async fn create_contribution_record(
        &self,
        phone: &SubjectId,
        group_code: Option<&str>,
        amount: u64,
    ) -> Result<(), MchangoError> {
        let mut state = self.state.lock().await;
        state.contributions.push(StoredContribution {
            phone: phone.as_str().to_string(),
            group_code: group_code.map(String::from),
            amount,
            recorded_at: chrono::Utc::now(),
        });
        self.save(&state).await
    }

    async fn create_group(
        &self,
        leader: &SubjectId,
        name: &str,
        contribution_amount: u64,
        max_members: u32,
    ) -> Result<Group, MchangoError> {
        let mut state = self.state.lock().await;
        let code = Self::next_group_code(&state);
        let group = Group {
            code: code.clone(),
            name: name.to_string(),
            contribution_amount,
            max_members,
        };
        state.groups.insert(code.clone(), group.clone());
        state
            .memberships
            .push((leader.as_str().to_string(), code));
        self.save(&state).await?;
        Ok(group)
    }

    async fn join_group(
        &self,
        phone: &SubjectId,
        code: &str,
    ) -> Result<Option<Group>, MchangoError> {
        let mut state = self.state.lock().await;
        let Some(group) = state.groups.get(code).cloned() else {
            return Ok(None);
        };
        state
            .memberships
            .push((phone.as_str().to_string(), code.to_string()));
        self.save(&state).await?;
        Ok(Some(group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("store.json")
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_store_path(&dir);
        let phone = SubjectId::from("255700000001");

        {
            let store = JsonStore::open(path.clone()).await.unwrap();
            store.create_user(&phone, Role::Leader, "Asha").await.unwrap();
            store.create_group(&phone, "Umoja", 50_000, 10).await.unwrap();
        }

        let store = JsonStore::open(path).await.unwrap();
        let profile = store.find_user_by_phone(&phone).await.unwrap().unwrap();
        assert_eq!(profile.name, "Asha");
        let groups = store.find_groups_for_user(&phone).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].code, "CHAMA001");
    }

    #[tokio::test]
    async fn group_codes_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(temp_store_path(&dir)).await.unwrap();
        let leader = SubjectId::from("255700000001");

        let a = store.create_group(&leader, "A", 10_000, 5).await.unwrap();
        let b = store.create_group(&leader, "B", 10_000, 5).await.unwrap();
        assert_ne!(a.code, b.code);
    }

    #[tokio::test]
    async fn corrupt_store_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_store_path(&dir);
        tokio::fs::write(&path, b"not json").await.unwrap();
        assert!(JsonStore::open(path).await.is_err());
    }

    #[tokio::test]
    async fn join_unknown_group_returns_none_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(temp_store_path(&dir)).await.unwrap();
        let phone = SubjectId::from("255700000002");

        assert!(store.join_group(&phone, "NOPE").await.unwrap().is_none());
        assert!(store.find_groups_for_user(&phone).await.unwrap().is_empty());
    }
}
