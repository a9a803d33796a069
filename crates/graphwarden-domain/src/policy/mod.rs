//! Rule-based policy evaluation.
//!
//! This module contains:
//! - Rule definitions and the validating [`RuleSet`] builder
//! - The [`PolicyEngine`] (deny-overrides, priority allow scan, default deny)
//! - Declarative rule-file loading ([`PolicyConfig`])
//!
//! Rule sets are validated when built, so evaluation never fails: an
//! `authorize` call is a pure function from attributes to a
//! [`PolicyDecision`].

mod config;
mod engine;
mod rules;

pub use config::PolicyConfig;
pub use engine::{PolicyDecision, PolicyEngine};
pub use rules::{
    AttributePath, CompiledRule, Condition, ConditionDefinition, Effect, Operator, RuleDefinition,
    RuleSet, RuleSetBuilder,
};
