// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation engine: one inbound notification in, replies enqueued out.
//!
//! Dispatch order for each message, under the sender's subject lock:
//!   1. response cache (exact subject+message match short-circuits everything)
//!   2. session touch
//!   3. registration for unknown senders
//!   4. menu escape hatch for senders stuck in a flow
//!   5. the sender's active flow step
//!   6. trigger-phrase rules
//!   7. main-menu fallback
//!
//! Any collaborator error aborts the dispatch with a generic apology and
//! leaves the session's flow untouched, so the sender can retry the same
//! step.

use std::sync::Arc;

use tracing::{debug, error, info};

use mchango_core::types::{
    Button, MessageKind, Notification, OutboundMessage, Role, SubjectId, UserProfile,
};
use mchango_core::{MchangoError, PersistenceAdapter};
use mchango_delivery::OutboundQueue;

use crate::cache::ResponseCache;
use crate::parse;
use crate::rules::{default_rules, match_rule, AutomationRule, RuleAction};
use crate::session::{
    ActiveFlow, ContributionStep, GroupCreationStep, GroupJoiningStep, RegistrationStep,
    SessionStore,
};
use crate::templates;

/// Validation bounds for flow inputs, from the `[flows]` config section.
#[derive(Debug, Clone, Copy)]
pub struct FlowLimits {
    pub min_contribution: u64,
    pub max_contribution: u64,
    pub min_members: u32,
    pub max_members: u32,
}

impl FlowLimits {
    pub fn from_config(flows: &mchango_config::model::FlowConfig) -> Self {
        Self {
            min_contribution: flows.min_contribution,
            max_contribution: flows.max_contribution,
            min_members: flows.min_members,
            max_members: flows.max_members,
        }
    }
}

/// Phrases that abandon an active flow and return to the main menu.
const MENU_ESCAPES: &[&str] = &["menu", "menyu", "anza"];

/// The conversational state machine.
pub struct ConversationEngine {
    sessions: Arc<SessionStore>,
    cache: Arc<ResponseCache>,
    persistence: Arc<dyn PersistenceAdapter>,
    queue: OutboundQueue,
    rules: Vec<AutomationRule>,
    limits: FlowLimits,
}

impl ConversationEngine {
    pub fn new(
        sessions: Arc<SessionStore>,
        cache: Arc<ResponseCache>,
        persistence: Arc<dyn PersistenceAdapter>,
        queue: OutboundQueue,
        limits: FlowLimits,
    ) -> Self {
        Self {
            sessions,
            cache,
            persistence,
            queue,
            rules: default_rules(),
            limits,
        }
    }

    /// Replaces the built-in rule set, keeping declaration order as the
    /// priority order.
    pub fn with_rules(mut self, rules: Vec<AutomationRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Handles one inbound notification end to end.
    ///
    /// Serialized per subject: a second message from the same sender waits
    /// until this one's handling completes. Messages from different senders
    /// are handled concurrently.
    pub async fn dispatch(&self, notification: &Notification) {
        let subject = &notification.sender;
        let lock = self.sessions.subject_lock(subject);
        let _guard = lock.lock().await;

        if let Err(err) = self.handle(subject, &notification.body).await {
            // Flow state is deliberately left as it was so the sender can
            // retry the same step.
            error!(subject = %subject, error = %err, "dispatch failed");
            self.reply(subject, templates::apology()).await;
        }
    }

    async fn handle(&self, subject: &SubjectId, body: &str) -> Result<(), MchangoError> {
        let normalized = parse::normalize(body);
        debug!(subject = %subject, message = normalized.as_str(), "handling message");

        // Cache hits short-circuit everything, registration included.
        if let Some(reply) = self.cache.lookup(subject, body) {
            self.sessions.touch(subject);
            self.reply(subject, reply).await;
            return Ok(());
        }

        let active_flow = self.sessions.touch(subject);
        let profile = self.persistence.find_user_by_phone(subject).await?;

        let Some(profile) = profile else {
            return self.handle_registration(subject, body, &normalized, active_flow).await;
        };

        if let Some(flow) = active_flow {
            // Escape hatch: a menu phrase abandons the flow mid-step.
            if MENU_ESCAPES.contains(&normalized.as_str()) {
                self.sessions.end_flow(subject);
                self.reply(subject, templates::main_menu()).await;
                return Ok(());
            }
            return self.handle_flow_step(subject, &profile, body, &normalized, flow).await;
        }

        if let Some(rule) = match_rule(&self.rules, &normalized, profile.role) {
            debug!(subject = %subject, rule = rule.name, "rule matched");
            for &action in &rule.actions {
                self.perform_action(subject, action, &normalized).await?;
            }
            return Ok(());
        }

        self.reply(subject, templates::main_menu()).await;
        Ok(())
    }

    /// Registration for senders with no stored profile. Unknown senders are
    /// always funneled here regardless of what they typed.
    async fn handle_registration(
        &self,
        subject: &SubjectId,
        body: &str,
        normalized: &str,
        active_flow: Option<ActiveFlow>,
    ) -> Result<(), MchangoError> {
        match active_flow {
            Some(ActiveFlow::Registration(RegistrationStep::RoleSelection)) => {
                let Some(role) = parse_role_choice(normalized) else {
                    self.reply(subject, templates::role_invalid()).await;
                    return Ok(());
                };
                self.sessions.start_flow(
                    subject,
                    ActiveFlow::Registration(RegistrationStep::NameInput { role }),
                );
                self.reply(subject, templates::name_prompt(role)).await;
                Ok(())
            }
            Some(ActiveFlow::Registration(RegistrationStep::NameInput { role })) => {
                // Names keep the sender's original casing.
                let name = body.trim();
                if name.chars().count() < 2 {
                    self.reply(subject, templates::name_too_short()).await;
                    return Ok(());
                }
                self.persistence.create_user(subject, role, name).await?;
                self.sessions.end_flow(subject);
                info!(subject = %subject, role = %role, "user registered");
                self.reply(subject, templates::registration_complete(name)).await;
                Ok(())
            }
            _ => {
                // Any first contact starts registration, whatever was typed.
                self.sessions.start_flow(
                    subject,
                    ActiveFlow::Registration(RegistrationStep::RoleSelection),
                );
                let buttons = vec![
                    Button {
                        id: "1".to_string(),
                        title: "Kiongozi".to_string(),
                    },
                    Button {
                        id: "2".to_string(),
                        title: "Mwanachama".to_string(),
                    },
                ];
                self.queue
                    .enqueue(OutboundMessage::new(
                        subject.clone(),
                        templates::welcome_role_prompt(),
                        MessageKind::Buttons(buttons),
                    ))
                    .await;
                Ok(())
            }
        }
    }

    async fn handle_flow_step(
        &self,
        subject: &SubjectId,
        profile: &UserProfile,
        body: &str,
        normalized: &str,
        flow: ActiveFlow,
    ) -> Result<(), MchangoError> {
        match flow {
            ActiveFlow::Registration(_) => {
                // Profile exists, so a leftover registration flow is stale.
                self.sessions.end_flow(subject);
                self.reply(subject, templates::main_menu()).await;
                Ok(())
            }
            ActiveFlow::Contribution(ContributionStep::AwaitAmount) => {
                let Some(amount) = parse::parse_amount_in_range(
                    normalized,
                    self.limits.min_contribution,
                    self.limits.max_contribution,
                ) else {
                    self.reply(
                        subject,
                        templates::invalid_amount(
                            self.limits.min_contribution,
                            self.limits.max_contribution,
                        ),
                    )
                    .await;
                    return Ok(());
                };
                self.record_contribution(subject, amount).await
            }
            ActiveFlow::GroupCreation(step) => {
                self.handle_group_creation_step(subject, profile, body, normalized, step)
                    .await
            }
            ActiveFlow::GroupJoining(GroupJoiningStep::AwaitCode) => {
                let Some(code) = parse::parse_group_code(normalized) else {
                    self.reply(subject, templates::join_code_invalid()).await;
                    return Ok(());
                };
                match self.persistence.join_group(subject, &code).await? {
                    Some(group) => {
                        self.sessions.end_flow(subject);
                        info!(subject = %subject, code = group.code.as_str(), "joined group");
                        self.reply(subject, templates::group_joined(&group)).await;
                    }
                    None => {
                        // Stay at the code step for another attempt.
                        self.reply(subject, templates::group_not_found(&code)).await;
                    }
                }
                Ok(())
            }
            ActiveFlow::Help => {
                // Help is single-step: the next message returns to the menu
                // and is handled fresh.
                self.sessions.end_flow(subject);
                if let Some(rule) = match_rule(&self.rules, normalized, profile.role) {
                    for &action in &rule.actions {
                        self.perform_action(subject, action, normalized).await?;
                    }
                    return Ok(());
                }
                self.reply(subject, templates::main_menu()).await;
                Ok(())
            }
        }
    }

    async fn handle_group_creation_step(
        &self,
        subject: &SubjectId,
        profile: &UserProfile,
        body: &str,
        normalized: &str,
        step: GroupCreationStep,
    ) -> Result<(), MchangoError> {
        match step {
            GroupCreationStep::AwaitName => {
                let name = body.trim();
                if name.chars().count() < 3 {
                    self.reply(subject, templates::group_name_invalid()).await;
                    return Ok(());
                }
                self.sessions.start_flow(
                    subject,
                    ActiveFlow::GroupCreation(GroupCreationStep::AwaitAmount {
                        name: name.to_string(),
                    }),
                );
                self.reply(
                    subject,
                    templates::group_amount_prompt(
                        self.limits.min_contribution,
                        self.limits.max_contribution,
                    ),
                )
                .await;
                Ok(())
            }
            GroupCreationStep::AwaitAmount { name } => {
                let Some(amount) = parse::parse_amount_in_range(
                    normalized,
                    self.limits.min_contribution,
                    self.limits.max_contribution,
                ) else {
                    self.reply(
                        subject,
                        templates::invalid_amount(
                            self.limits.min_contribution,
                            self.limits.max_contribution,
                        ),
                    )
                    .await;
                    return Ok(());
                };
                self.sessions.start_flow(
                    subject,
                    ActiveFlow::GroupCreation(GroupCreationStep::AwaitMemberCount {
                        name,
                        amount,
                    }),
                );
                self.reply(
                    subject,
                    templates::member_count_prompt(
                        self.limits.min_members,
                        self.limits.max_members,
                    ),
                )
                .await;
                Ok(())
            }
            GroupCreationStep::AwaitMemberCount { name, amount } => {
                let Some(count) = parse::parse_member_count(
                    normalized,
                    self.limits.min_members,
                    self.limits.max_members,
                ) else {
                    self.reply(
                        subject,
                        templates::member_count_invalid(
                            self.limits.min_members,
                            self.limits.max_members,
                        ),
                    )
                    .await;
                    return Ok(());
                };
                let group = self
                    .persistence
                    .create_group(subject, &name, amount, count)
                    .await?;
                self.sessions.end_flow(subject);
                info!(
                    subject = %subject,
                    leader = profile.name.as_str(),
                    code = group.code.as_str(),
                    "group created"
                );
                self.reply(subject, templates::group_created(&group)).await;
                Ok(())
            }
        }
    }

    async fn perform_action(
        &self,
        subject: &SubjectId,
        action: RuleAction,
        normalized: &str,
    ) -> Result<(), MchangoError> {
        match action {
            RuleAction::StartContribution => {
                // An inline amount ("toa 50000") completes in one step. An
                // out-of-range inline amount still enters the flow so the
                // correction lands at the amount step.
                match parse::extract_amount(normalized) {
                    Some(amount)
                        if (self.limits.min_contribution..=self.limits.max_contribution)
                            .contains(&amount) =>
                    {
                        self.record_contribution(subject, amount).await
                    }
                    Some(_) => {
                        self.sessions.start_flow(
                            subject,
                            ActiveFlow::Contribution(ContributionStep::AwaitAmount),
                        );
                        self.reply(
                            subject,
                            templates::invalid_amount(
                                self.limits.min_contribution,
                                self.limits.max_contribution,
                            ),
                        )
                        .await;
                        Ok(())
                    }
                    None => {
                        self.sessions.start_flow(
                            subject,
                            ActiveFlow::Contribution(ContributionStep::AwaitAmount),
                        );
                        self.reply(
                            subject,
                            templates::contribution_prompt(
                                self.limits.min_contribution,
                                self.limits.max_contribution,
                            ),
                        )
                        .await;
                        Ok(())
                    }
                }
            }
            RuleAction::PromptGroupName => {
                self.sessions.start_flow(
                    subject,
                    ActiveFlow::GroupCreation(GroupCreationStep::AwaitName),
                );
                self.reply(subject, templates::group_name_prompt()).await;
                Ok(())
            }
            RuleAction::PromptGroupCode => {
                self.sessions.start_flow(
                    subject,
                    ActiveFlow::GroupJoining(GroupJoiningStep::AwaitCode),
                );
                self.reply(subject, templates::join_code_prompt()).await;
                Ok(())
            }
            RuleAction::SendBalance => {
                let groups = self.persistence.find_groups_for_user(subject).await?;
                self.reply(subject, templates::balance(&groups)).await;
                Ok(())
            }
            RuleAction::SendStatus => {
                let groups = self.persistence.find_groups_for_user(subject).await?;
                self.reply(subject, templates::status(&groups)).await;
                Ok(())
            }
            RuleAction::SendHelp => {
                self.sessions.start_flow(subject, ActiveFlow::Help);
                self.reply(subject, templates::help_text()).await;
                Ok(())
            }
            RuleAction::SendMainMenu => {
                self.sessions.end_flow(subject);
                self.reply(subject, templates::main_menu()).await;
                Ok(())
            }
        }
    }

    async fn record_contribution(
        &self,
        subject: &SubjectId,
        amount: u64,
    ) -> Result<(), MchangoError> {
        self.persistence
            .create_contribution_record(subject, None, amount)
            .await?;
        self.sessions.end_flow(subject);
        info!(subject = %subject, amount, "contribution recorded");
        self.reply(subject, templates::contribution_confirmed(amount)).await;
        Ok(())
    }

    async fn reply(&self, subject: &SubjectId, body: String) {
        self.queue
            .enqueue(OutboundMessage::text(subject.clone(), body))
            .await;
    }
}

/// Parses a registration role choice: "1"/"kiongozi" or "2"/"mwanachama".
fn parse_role_choice(normalized: &str) -> Option<Role> {
    match normalized {
        "1" | "kiongozi" => Some(Role::Leader),
        "2" | "mwanachama" => Some(Role::Member),
        _ => None,
    }
}
