//! graphwarden-tenant: Tenant registry and request-scoped context
//!
//! This crate provides the tenant side of graphwarden's isolation model:
//! - Tenant metadata (status transitions, never hard-deleted)
//! - TenantRegistry trait with an in-memory implementation
//! - Task-local request-scoped tenant context
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              graphwarden-tenant              │
//! ├─────────────────────────────────────────────┤
//! │  tenant.rs   - Tenant model & status        │
//! │  registry.rs - TenantRegistry trait + memory│
//! │  context.rs  - Request-scoped context       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Tenant isolation is independent of ABAC: admin subjects bypass permission
//! predicates but never tenant scoping. The query-side injection of tenant
//! predicates lives in `graphwarden-query`.

pub mod context;
pub mod error;
pub mod registry;
#[cfg(test)]
mod registry_proptest;
pub mod tenant;

// Re-export commonly used types
pub use context::TenantContext;
pub use error::{TenantError, TenantResult};
pub use registry::{MemoryTenantRegistry, TenantRegistry};
pub use tenant::{Tenant, TenantStatus};
