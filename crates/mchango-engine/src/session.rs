// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-subject conversation sessions and the keyed session store.
//!
//! A session tracks which multi-step flow a subject is in and where. Flow
//! steps are a tagged union carrying their scratch data in the variants, so
//! clearing the flow drops the step cursor and scratch together.
//!
//! Sessions are ephemeral: the eviction sweep removes any session idle
//! beyond the timeout, and a fresh one is created transparently on the next
//! inbound message. Durable facts live in the persistence collaborator.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use mchango_core::types::{Role, SubjectId};

/// Steps of the registration flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationStep {
    /// Waiting for "1"/"kiongozi" or "2"/"mwanachama".
    RoleSelection,
    /// Role chosen; waiting for a display name of at least two characters.
    NameInput { role: Role },
}

/// Steps of the contribution flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContributionStep {
    /// Waiting for an amount within the configured bounds.
    AwaitAmount,
}

/// Steps of the group creation flow, in sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupCreationStep {
    AwaitName,
    AwaitAmount { name: String },
    AwaitMemberCount { name: String, amount: u64 },
}

/// Steps of the group joining flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupJoiningStep {
    AwaitCode,
}

/// The flow a subject is currently in, with its step cursor and scratch data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveFlow {
    Registration(RegistrationStep),
    Contribution(ContributionStep),
    GroupCreation(GroupCreationStep),
    GroupJoining(GroupJoiningStep),
    /// Single-step marker: any next input returns to the menu.
    Help,
}

impl std::fmt::Display for ActiveFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActiveFlow::Registration(_) => write!(f, "registration"),
            ActiveFlow::Contribution(_) => write!(f, "contribution"),
            ActiveFlow::GroupCreation(_) => write!(f, "group_creation"),
            ActiveFlow::GroupJoining(_) => write!(f, "group_joining"),
            ActiveFlow::Help => write!(f, "help"),
        }
    }
}

/// Ephemeral per-subject conversation state.
#[derive(Debug, Clone)]
pub struct Session {
    pub subject: SubjectId,
    pub active_flow: Option<ActiveFlow>,
    pub last_activity: Instant,
}

/// Keyed store of sessions with per-subject dispatch locks and idle eviction.
///
/// Exactly one session exists per subject (upsert semantics). The per-subject
/// lock serializes concurrent dispatches from the same sender; dispatches for
/// different subjects proceed in parallel.
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            locks: DashMap::new(),
            idle_timeout,
        }
    }

    /// The dispatch lock for a subject. Hold it for the whole of one
    /// message's handling to keep that subject's flow state consistent.
    pub fn subject_lock(&self, subject: &SubjectId) -> Arc<Mutex<()>> {
        self.locks
            .entry(subject.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Returns the subject's active flow, creating an empty session if
    /// absent and touching its last-activity timestamp either way.
    pub fn touch(&self, subject: &SubjectId) -> Option<ActiveFlow> {
        let mut entry = self
            .sessions
            .entry(subject.as_str().to_string())
            .or_insert_with(|| {
                debug!(subject = %subject, "created session");
                Session {
                    subject: subject.clone(),
                    active_flow: None,
                    last_activity: Instant::now(),
                }
            });
        entry.last_activity = Instant::now();
        entry.active_flow.clone()
    }

    /// Enters the given flow (upserting the session).
    pub fn start_flow(&self, subject: &SubjectId, flow: ActiveFlow) {
        debug!(subject = %subject, flow = %flow, "starting flow");
        self.set_flow(subject, Some(flow));
    }

    /// Clears the flow; the step cursor and scratch data go with it.
    pub fn end_flow(&self, subject: &SubjectId) {
        debug!(subject = %subject, "ending flow");
        self.set_flow(subject, None);
    }

    fn set_flow(&self, subject: &SubjectId, flow: Option<ActiveFlow>) {
        let mut entry = self
            .sessions
            .entry(subject.as_str().to_string())
            .or_insert_with(|| Session {
                subject: subject.clone(),
                active_flow: None,
                last_activity: Instant::now(),
            });
        entry.active_flow = flow;
        entry.last_activity = Instant::now();
    }

    pub fn contains(&self, subject: &SubjectId) -> bool {
        self.sessions.contains_key(subject.as_str())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Removes every session idle longer than the timeout. Returns the
    /// number evicted.
    ///
    /// Safe at any time: a new session is created transparently on the
    /// subject's next inbound message.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, s| now.duration_since(s.last_activity) < self.idle_timeout);
        let evicted = before - self.sessions.len();

        // Drop lock entries for evicted subjects. A lock whose Arc is held
        // outside the map belongs to a dispatch that has not touched its
        // session yet; keep it, or a concurrent message from the same
        // sender would mint a second lock and race it.
        self.locks.retain(|key, lock| {
            self.sessions.contains_key(key) || Arc::strong_count(lock) > 1
        });

        if evicted > 0 {
            info!(evicted, remaining = self.sessions.len(), "session sweep");
        }
        evicted
    }

    /// Runs the eviction sweep on an interval until cancelled.
    pub fn run_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        store.sweep();
                    }
                    _ = cancel.cancelled() => {
                        debug!("session sweeper stopped");
                        return;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(s: &str) -> SubjectId {
        SubjectId::from(s)
    }

    #[tokio::test(start_paused = true)]
    async fn touch_creates_session_with_no_flow() {
        let store = SessionStore::new(Duration::from_secs(1800));
        let s = subject("255700000001");

        assert!(!store.contains(&s));
        assert_eq!(store.touch(&s), None);
        assert!(store.contains(&s));
        assert_eq!(store.len(), 1);

        // Upsert: touching again does not create a second session.
        store.touch(&s);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ending_flow_clears_step_and_scratch() {
        let store = SessionStore::new(Duration::from_secs(1800));
        let s = subject("255700000001");

        store.start_flow(
            &s,
            ActiveFlow::GroupCreation(GroupCreationStep::AwaitMemberCount {
                name: "Umoja".into(),
                amount: 50_000,
            }),
        );
        assert!(matches!(
            store.touch(&s),
            Some(ActiveFlow::GroupCreation(_))
        ));

        store.end_flow(&s);
        // Scratch (name, amount) went with the flow variant.
        assert_eq!(store.touch(&s), None);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_evicted_active_survive() {
        let store = SessionStore::new(Duration::from_secs(1800));
        let idle = subject("255700000001");
        let active = subject("255700000002");

        store.touch(&idle);
        store.touch(&active);

        tokio::time::advance(Duration::from_secs(1700)).await;
        store.touch(&active); // refresh within the timeout
        tokio::time::advance(Duration::from_secs(200)).await;

        assert_eq!(store.sweep(), 1);
        assert!(!store.contains(&idle));
        assert!(store.contains(&active));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_task_evicts_on_interval() {
        let store = Arc::new(SessionStore::new(Duration::from_secs(1800)));
        let cancel = CancellationToken::new();
        let handle = store.run_sweeper(Duration::from_secs(60), cancel.clone());

        store.touch(&subject("255700000001"));
        tokio::time::advance(Duration::from_secs(1900)).await;
        // Let the sweeper tick run.
        tokio::task::yield_now().await;

        assert!(store.is_empty());
        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn subject_lock_serializes_same_subject() {
        let store = Arc::new(SessionStore::new(Duration::from_secs(1800)));
        let s = subject("255700000001");

        let lock = store.subject_lock(&s);
        let guard = lock.lock().await;

        // Same subject: second lock attempt must wait.
        let second = store.subject_lock(&s);
        assert!(second.try_lock().is_err());

        // Different subject: proceeds immediately.
        let other = store.subject_lock(&subject("255700000002"));
        assert!(other.try_lock().is_ok());

        drop(guard);
        assert!(second.try_lock().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_keeps_lock_held_by_in_flight_dispatch() {
        let store = SessionStore::new(Duration::from_secs(1800));
        let s = subject("255700000001");

        // A dispatch has taken the lock but not yet touched its session.
        let lock = store.subject_lock(&s);
        let guard = lock.lock().await;

        store.sweep();

        // A second message from the same sender must share that lock, not
        // mint a fresh one and run concurrently.
        let second = store.subject_lock(&s);
        assert!(Arc::ptr_eq(&lock, &second));
        assert!(second.try_lock().is_err());
        assert_eq!(store.locks.len(), 1);

        // Once nothing holds the lock and no session exists, the sweep
        // drops the entry.
        drop(guard);
        drop(second);
        drop(lock);
        store.sweep();
        assert_eq!(store.locks.len(), 0);
    }

    #[test]
    fn active_flow_display_names() {
        assert_eq!(
            ActiveFlow::Registration(RegistrationStep::RoleSelection).to_string(),
            "registration"
        );
        assert_eq!(
            ActiveFlow::Contribution(ContributionStep::AwaitAmount).to_string(),
            "contribution"
        );
        assert_eq!(ActiveFlow::Help.to_string(), "help");
    }
}
