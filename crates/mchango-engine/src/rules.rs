// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trigger-phrase automation rules for registered users outside a flow.
//!
//! Rules are evaluated in declaration order; the first rule whose trigger
//! matches and whose precondition holds wins. A trigger matches when the
//! normalized message starts with one of the rule's phrases (so inline
//! arguments like `toa 50000` still trigger the contribution rule).

use mchango_core::types::Role;

/// What a matched rule does, interpreted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    /// Record an inline amount if present, otherwise enter the
    /// contribution flow.
    StartContribution,
    /// Enter the group creation flow at the name step.
    PromptGroupName,
    /// Enter the group joining flow at the code step.
    PromptGroupCode,
    SendBalance,
    SendStatus,
    SendHelp,
    SendMainMenu,
}

/// One trigger-phrase rule.
#[derive(Debug, Clone)]
pub struct AutomationRule {
    pub name: &'static str,
    pub trigger_phrases: &'static [&'static str],
    /// When set, the rule only fires for users of this role.
    pub precondition: Option<Role>,
    /// Executed in declaration order when the rule fires.
    pub actions: Vec<RuleAction>,
}

impl AutomationRule {
    /// Whether the normalized message triggers this rule for a user of the
    /// given role.
    pub fn matches(&self, normalized: &str, role: Role) -> bool {
        if let Some(required) = self.precondition {
            if role != required {
                return false;
            }
        }
        self.trigger_phrases.iter().any(|phrase| {
            normalized == *phrase
                || normalized
                    .strip_prefix(phrase)
                    .is_some_and(|rest| rest.starts_with(' '))
        })
    }
}

/// The built-in rule set, in priority order.
pub fn default_rules() -> Vec<AutomationRule> {
    vec![
        AutomationRule {
            name: "contribute",
            trigger_phrases: &["toa", "changia"],
            precondition: None,
            actions: vec![RuleAction::StartContribution],
        },
        AutomationRule {
            name: "create_group",
            trigger_phrases: &["fungua"],
            precondition: Some(Role::Leader),
            actions: vec![RuleAction::PromptGroupName],
        },
        AutomationRule {
            name: "join_group",
            trigger_phrases: &["jiunge"],
            precondition: None,
            actions: vec![RuleAction::PromptGroupCode],
        },
        AutomationRule {
            name: "balance",
            trigger_phrases: &["salio"],
            precondition: None,
            actions: vec![RuleAction::SendBalance],
        },
        AutomationRule {
            name: "status",
            trigger_phrases: &["taarifa", "hali"],
            precondition: None,
            actions: vec![RuleAction::SendStatus],
        },
        AutomationRule {
            name: "help",
            trigger_phrases: &["msaada", "help"],
            precondition: None,
            actions: vec![RuleAction::SendHelp],
        },
        AutomationRule {
            name: "menu",
            trigger_phrases: &["menu", "menyu", "anza"],
            precondition: None,
            actions: vec![RuleAction::SendMainMenu],
        },
    ]
}

/// Finds the first matching rule for a normalized message.
pub fn match_rule<'a>(
    rules: &'a [AutomationRule],
    normalized: &str,
    role: Role,
) -> Option<&'a AutomationRule> {
    rules.iter().find(|rule| rule.matches(normalized, role))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_prefixed_triggers_match() {
        let rules = default_rules();
        let hit = match_rule(&rules, "toa", Role::Member).unwrap();
        assert_eq!(hit.name, "contribute");

        // Inline argument still triggers the same rule.
        let hit = match_rule(&rules, "toa 50000", Role::Member).unwrap();
        assert_eq!(hit.name, "contribute");

        // Prefix without a word boundary does not.
        assert!(match_rule(&rules, "toana", Role::Member).is_none());
    }

    #[test]
    fn create_group_requires_leader() {
        let rules = default_rules();
        assert!(match_rule(&rules, "fungua", Role::Member).is_none());
        let hit = match_rule(&rules, "fungua", Role::Leader).unwrap();
        assert_eq!(hit.actions, vec![RuleAction::PromptGroupName]);
    }

    #[test]
    fn rules_carry_ordered_action_lists() {
        let rule = AutomationRule {
            name: "balance_then_menu",
            trigger_phrases: &["yote"],
            precondition: None,
            actions: vec![RuleAction::SendBalance, RuleAction::SendMainMenu],
        };
        assert!(rule.matches("yote", Role::Member));
        assert_eq!(
            rule.actions,
            vec![RuleAction::SendBalance, RuleAction::SendMainMenu]
        );
    }

    #[test]
    fn first_rule_in_order_wins() {
        let rules = default_rules();
        // "changia" is an alias of the contribute rule, declared first.
        let hit = match_rule(&rules, "changia 20000", Role::Leader).unwrap();
        assert_eq!(hit.name, "contribute");
    }

    #[test]
    fn unknown_phrase_matches_nothing() {
        let rules = default_rules();
        assert!(match_rule(&rules, "habari yako", Role::Member).is_none());
    }
}
