//! graphwarden-query: predicate fragments and query rewriting
//!
//! This crate turns authorization attributes into query-level scoping:
//! - A small boolean AST for filter fragments (conjunctive only)
//! - Structured query templates with an explicit filter extension point
//! - Role-based node/relationship predicate builders
//! - The ABAC rewriter and the independent tenant rewriter
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              graphwarden-query               │
//! ├─────────────────────────────────────────────┤
//! │  fragment.rs       - Expr AST + Fragment    │
//! │  template.rs       - QueryTemplate builder  │
//! │  predicates.rs     - Role predicate tables  │
//! │  rewriter.rs       - ABAC rewriting pass    │
//! │  tenant_rewriter.rs- Tenant isolation pass  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The two rewriting passes are independent conjuncts and compose in either
//! order. Rewriters never deny: allow/deny is the policy engine's job in
//! `graphwarden-domain`; rewriters only tighten what a query can see.

pub mod error;
pub mod fragment;
pub mod predicates;
pub mod rewriter;
pub mod template;
pub mod tenant_rewriter;

// Re-export commonly used types
pub use error::{RewriteError, RewriteResult};
pub use fragment::{CmpOp, Expr, Fragment, Params, PropMap, Row};
pub use predicates::PredicateBuilder;
pub use rewriter::{PermissionRewriter, RewrittenQuery};
pub use template::QueryTemplate;
pub use tenant_rewriter::TenantQueryRewriter;
