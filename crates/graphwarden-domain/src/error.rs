//! Domain error types for attribute validation and policy configuration.

use thiserror::Error;

/// Domain-specific errors for attribute construction and rule-set loading.
///
/// Authorization denial is NOT an error: `PolicyEngine::authorize` returns a
/// [`crate::policy::PolicyDecision`] with `authorized = false` as a normal
/// result, and evaluation itself never fails once a rule set has been built.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Subject role string is not in the closed role set.
    #[error("invalid role: {value}")]
    InvalidRole { value: String },

    /// Action string does not name a known action.
    #[error("invalid action: {value}")]
    InvalidAction { value: String },

    /// An id-like attribute was present but empty.
    #[error("{field} cannot be empty")]
    EmptyIdentifier { field: &'static str },

    /// An attribute value failed validation.
    #[error("invalid attribute {field}: {message}")]
    InvalidAttribute { field: &'static str, message: String },

    /// A rule condition references an attribute path the engine does not know.
    #[error("rule '{rule}' references unknown attribute: {attribute}")]
    UnknownAttribute { rule: String, attribute: String },

    /// A rule names an action outside the closed action set.
    #[error("rule '{rule}' references unknown action: {action}")]
    UnknownAction { rule: String, action: String },

    /// A rule condition pairs an operator with an incompatible value.
    #[error("rule '{rule}' has invalid condition on {attribute}: {message}")]
    InvalidCondition {
        rule: String,
        attribute: String,
        message: String,
    },

    /// A rule set was built with no rules at all.
    #[error("rule set must contain at least one rule")]
    EmptyRuleSet,

    /// Failure reading or deserializing a policy configuration source.
    #[error("policy configuration error: {message}")]
    ConfigLoad { message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
