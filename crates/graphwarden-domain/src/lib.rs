//! graphwarden-domain: Attribute model and ABAC policy engine
//!
//! This crate contains the decision side of graphwarden:
//! - Typed subject/resource/environment attributes
//! - Rule-based policy evaluation (deny-overrides, default deny)
//! - Rule-set validation at load time
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              graphwarden-domain              │
//! ├─────────────────────────────────────────────┤
//! │  attributes/ - Subject/Resource/Environment │
//! │  policy/     - Rules, engine, config loader │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Query scoping (translating decisions into query predicates) lives in
//! `graphwarden-query`; tenant isolation lives in `graphwarden-tenant`.
//! Both build on the types defined here.

pub mod attributes;
pub mod error;
pub mod policy;

// Re-export commonly used types at the crate root
pub use attributes::{
    Action, EnvironmentAttributes, ResourceAttributes, Role, SubjectAttributes,
};
pub use error::{DomainError, DomainResult};
pub use policy::{PolicyDecision, PolicyEngine, RuleSet};
