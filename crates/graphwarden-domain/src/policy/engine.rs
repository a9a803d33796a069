//! The policy engine: deny-overrides evaluation over an immutable rule set.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attributes::{Action, EnvironmentAttributes, ResourceAttributes, Role, SubjectAttributes};
use crate::policy::rules::RuleSet;

/// The outcome of a policy evaluation.
///
/// A denied decision is a normal result, not an error; callers must check
/// `authorized` explicitly. The `reason` is intended for internal audit
/// logging; HTTP-layer collaborators return a generic message to
/// unprivileged callers instead of leaking it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// Whether the request is allowed.
    pub authorized: bool,
    /// Human-readable explanation of the decision.
    pub reason: String,
}

impl PolicyDecision {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            authorized: true,
            reason: reason.into(),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            authorized: false,
            reason: reason.into(),
        }
    }
}

/// Evaluates subject/action/resource/environment tuples against a rule set.
///
/// Stateless per call; the rule set is immutable for the engine's lifetime
/// and shared via `Arc`, so concurrent evaluations need no locking. Reloading
/// rules means building a new engine value and swapping it at the composition
/// root, never mutating a live one.
///
/// Evaluation order is a safety invariant:
/// 1. Matching DENY rules short-circuit (deny wins over any allow).
/// 2. ALLOW rules are scanned in descending priority; first match allows.
/// 3. No match: default deny, except the hard-coded admin bypass.
///
/// The admin bypass covers ABAC only. Tenant isolation is an independent
/// layer and applies to admin subjects like everyone else.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    rules: Arc<RuleSet>,
}

impl PolicyEngine {
    /// Creates an engine over a validated rule set.
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    /// Creates an engine over the built-in standard rule table.
    pub fn standard() -> Self {
        Self::new(RuleSet::standard())
    }

    /// The rule set this engine evaluates.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Evaluates a request tuple. Pure: no side effects, never fails.
    pub fn authorize(
        &self,
        subject: &SubjectAttributes,
        action: Action,
        resource: &ResourceAttributes,
        environment: &EnvironmentAttributes,
    ) -> PolicyDecision {
        for rule in self.rules.deny_rules() {
            if rule.matches(subject, action, resource, environment) {
                debug!(
                    user_id = %subject.user_id,
                    action = %action,
                    rule = %rule.name,
                    "explicit deny"
                );
                return PolicyDecision::deny(format!("denied by rule '{}'", rule.name));
            }
        }

        for rule in self.rules.allow_rules() {
            if rule.matches(subject, action, resource, environment) {
                debug!(
                    user_id = %subject.user_id,
                    action = %action,
                    rule = %rule.name,
                    "allow"
                );
                return PolicyDecision::allow(format!("allowed by rule '{}'", rule.name));
            }
        }

        if subject.role == Role::Admin {
            debug!(user_id = %subject.user_id, action = %action, "admin bypass");
            return PolicyDecision::allow("admin bypass");
        }

        debug!(
            user_id = %subject.user_id,
            action = %action,
            resource_type = %resource.resource_type,
            "default deny: no matching rule"
        );
        PolicyDecision::deny(format!(
            "no rule allows {} on {} for role {}",
            action, resource.resource_type, subject.role
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::rules::{Effect, Operator, RuleDefinition, RuleSet};
    use serde_json::Value;

    fn subject(role: Role) -> SubjectAttributes {
        SubjectAttributes::new("u1", role).unwrap()
    }

    fn resource(sensitivity: u8) -> ResourceAttributes {
        ResourceAttributes::new("Business")
            .unwrap()
            .with_sensitivity_level(sensitivity)
    }

    #[test]
    fn test_deny_wins_over_allow() {
        let engine = PolicyEngine::new(
            RuleSet::builder()
                .rule(RuleDefinition::new("allow-all-reads", Effect::Allow).with_actions(["read"]))
                .rule(
                    RuleDefinition::new("deny-sensitive", Effect::Deny)
                        .with_actions(["read"])
                        .with_condition(
                            "resource.sensitivity_level",
                            Operator::GreaterOrEqual,
                            Value::from(3),
                        ),
                )
                .build()
                .unwrap(),
        );
        let env = EnvironmentAttributes::now();

        let open = engine.authorize(&subject(Role::User), Action::Read, &resource(0), &env);
        assert!(open.authorized);

        let blocked = engine.authorize(&subject(Role::User), Action::Read, &resource(3), &env);
        assert!(!blocked.authorized);
        assert!(blocked.reason.contains("deny-sensitive"));
    }

    #[test]
    fn test_matching_deny_beats_admin() {
        let engine = PolicyEngine::new(
            RuleSet::builder()
                .rule(RuleDefinition::new("deny-deletes", Effect::Deny).with_actions(["delete"]))
                .build()
                .unwrap(),
        );
        let decision = engine.authorize(
            &subject(Role::Admin),
            Action::Delete,
            &resource(0),
            &EnvironmentAttributes::now(),
        );
        assert!(!decision.authorized);
    }

    #[test]
    fn test_default_deny_except_admin_bypass() {
        let engine = PolicyEngine::new(
            RuleSet::builder()
                .rule(
                    RuleDefinition::new("auditor-read", Effect::Allow)
                        .with_roles(["auditor"])
                        .with_actions(["read"]),
                )
                .build()
                .unwrap(),
        );
        let env = EnvironmentAttributes::now();

        let denied = engine.authorize(&subject(Role::User), Action::Update, &resource(0), &env);
        assert!(!denied.authorized);

        let bypass = engine.authorize(&subject(Role::Admin), Action::Update, &resource(0), &env);
        assert!(bypass.authorized);
        assert_eq!(bypass.reason, "admin bypass");
    }

    #[test]
    fn test_priority_order_selects_first_allow() {
        let engine = PolicyEngine::new(
            RuleSet::builder()
                .rule(RuleDefinition::new("generic", Effect::Allow).with_priority(1))
                .rule(RuleDefinition::new("specific", Effect::Allow).with_priority(50))
                .build()
                .unwrap(),
        );
        let decision = engine.authorize(
            &subject(Role::User),
            Action::Read,
            &resource(0),
            &EnvironmentAttributes::now(),
        );
        assert!(decision.reason.contains("specific"));
    }

    #[test]
    fn test_standard_analyst_read_gated_on_sensitivity() {
        let engine = PolicyEngine::standard();
        let env = EnvironmentAttributes::now();
        let analyst = subject(Role::Analyst);

        assert!(
            engine
                .authorize(&analyst, Action::Read, &resource(1), &env)
                .authorized
        );
        // Sensitivity 2 exceeds the analyst ceiling: no rule matches, default deny
        assert!(
            !engine
                .authorize(&analyst, Action::Read, &resource(2), &env)
                .authorized
        );
        // Analyst writes have no allow rule at all
        assert!(
            !engine
                .authorize(&analyst, Action::Update, &resource(0), &env)
                .authorized
        );
    }

    #[test]
    fn test_standard_owner_write_requires_ownership() {
        let engine = PolicyEngine::standard();
        let env = EnvironmentAttributes::now();

        let owner = SubjectAttributes::new("u1", Role::Owner)
            .unwrap()
            .with_business_ids(["biz-1"])
            .unwrap();
        let owned = ResourceAttributes::new("Business")
            .unwrap()
            .with_business_id("biz-1")
            .unwrap();
        let foreign = ResourceAttributes::new("Business")
            .unwrap()
            .with_business_id("biz-9")
            .unwrap();

        assert!(engine.authorize(&owner, Action::Update, &owned, &env).authorized);
        assert!(!engine.authorize(&owner, Action::Update, &foreign, &env).authorized);
    }

    #[test]
    fn test_environment_hour_condition() {
        use chrono::TimeZone;
        let engine = PolicyEngine::new(
            RuleSet::builder()
                .rule(
                    RuleDefinition::new("business-hours-read", Effect::Allow)
                        .with_actions(["read"])
                        .with_condition("environment.hour", Operator::GreaterOrEqual, Value::from(9))
                        .with_condition("environment.hour", Operator::LessOrEqual, Value::from(17)),
                )
                .build()
                .unwrap(),
        );

        let noon = EnvironmentAttributes::at(
            chrono::Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap(),
        );
        let midnight = EnvironmentAttributes::at(
            chrono::Utc.with_ymd_and_hms(2026, 3, 2, 0, 30, 0).unwrap(),
        );

        assert!(
            engine
                .authorize(&subject(Role::User), Action::Read, &resource(0), &noon)
                .authorized
        );
        assert!(
            !engine
                .authorize(&subject(Role::User), Action::Read, &resource(0), &midnight)
                .authorized
        );
    }

    #[test]
    fn test_ip_allowlist_condition() {
        let engine = PolicyEngine::new(
            RuleSet::builder()
                .rule(
                    RuleDefinition::new("office-ips-only", Effect::Allow)
                        .with_actions(["read"])
                        .with_condition(
                            "environment.ip_address",
                            Operator::In,
                            serde_json::json!(["10.0.0.1", "10.0.0.2"]),
                        ),
                )
                .build()
                .unwrap(),
        );

        let inside = EnvironmentAttributes::now().with_ip_address("10.0.0.1");
        let outside = EnvironmentAttributes::now().with_ip_address("203.0.113.9");
        let unknown = EnvironmentAttributes::now();

        assert!(
            engine
                .authorize(&subject(Role::User), Action::Read, &resource(0), &inside)
                .authorized
        );
        assert!(
            !engine
                .authorize(&subject(Role::User), Action::Read, &resource(0), &outside)
                .authorized
        );
        // Missing attribute never matches
        assert!(
            !engine
                .authorize(&subject(Role::User), Action::Read, &resource(0), &unknown)
                .authorized
        );
    }
}
