//! Tenant error types.

use thiserror::Error;

/// Tenant-specific errors.
#[derive(Debug, Error)]
pub enum TenantError {
    /// Tenant not found.
    #[error("tenant not found: {tenant_id}")]
    NotFound { tenant_id: String },

    /// Tenant already exists.
    #[error("tenant already exists: {tenant_id}")]
    AlreadyExists { tenant_id: String },

    /// Tenant exists but is not active.
    #[error("tenant {tenant_id} is {status}")]
    NotActive { tenant_id: String, status: String },

    /// Tenant id failed validation.
    #[error("invalid tenant id: {message}")]
    InvalidTenantId { message: String },

    /// Tenant name failed validation.
    #[error("invalid tenant name: {message}")]
    InvalidTenantName { message: String },

    /// A tenant-scoped operation ran with no tenant in request context.
    #[error("no tenant in request context for endpoint: {endpoint}")]
    MissingContext { endpoint: String },
}

/// Result type for tenant operations.
pub type TenantResult<T> = Result<T, TenantError>;
