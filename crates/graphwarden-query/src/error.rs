//! Rewrite error types.

use thiserror::Error;

/// Rewrite-specific errors.
///
/// The rewriting passes themselves are total: a template always has a valid
/// injection point (one is synthesized from an always-true base predicate
/// when the template has no WHERE), so rewriting never fails and never drops
/// a fragment. Errors here cover the write-path helpers instead.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// A write-path stamp was requested with no tenant in context.
    ///
    /// Unlike the read-path tenant rewrite, which fails open with a warning,
    /// writing an unstamped node would permanently violate the invariant
    /// that every tenant-aware record carries a `tenant_id`.
    #[error("no tenant in request context; refusing unstamped write")]
    MissingTenantForWrite,
}

/// Result type for rewrite operations.
pub type RewriteResult<T> = Result<T, RewriteError>;
