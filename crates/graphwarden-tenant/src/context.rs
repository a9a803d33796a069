//! Request-scoped tenant context.
//!
//! The current tenant is task-local state, never a process-wide mutable:
//! concurrent requests for different tenants must not observe each other.
//! [`TenantContext::scope`] pairs set-on-entry with clear-on-exit on every
//! path (normal return, early error, or panic) so a worker task reused for
//! the next request can never leak the previous request's tenant.

use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use crate::error::{TenantError, TenantResult};
use crate::tenant::Tenant;

tokio::task_local! {
    static CURRENT_TENANT: Option<Arc<Tenant>>;
}

/// Endpoints allowed to run without tenant context: health probes and the
/// tenant bootstrap flow itself.
pub const EXEMPT_ENDPOINTS: &[&str] = &["/health", "/ready", "/tenants/bootstrap"];

/// Access to the current request's tenant.
///
/// All constructors are scoped: there is no `set` without a matching,
/// guaranteed clear.
pub struct TenantContext;

impl TenantContext {
    /// Runs `fut` with `tenant` as the current tenant.
    ///
    /// The context is confined to the wrapped future: once it completes (or
    /// panics), the binding is gone.
    pub async fn scope<F>(tenant: Arc<Tenant>, fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_TENANT.scope(Some(tenant), fut).await
    }

    /// Runs `fut` with the tenant binding explicitly absent.
    ///
    /// Used by tenant-exempt endpoints and by tests simulating a cleared
    /// end-of-request context.
    pub async fn without_tenant<F>(fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_TENANT.scope(None, fut).await
    }

    /// Returns the current tenant, if any.
    ///
    /// Works from synchronous code as long as it runs inside a
    /// [`TenantContext::scope`] task; outside any scope it returns `None`.
    pub fn current() -> Option<Arc<Tenant>> {
        CURRENT_TENANT.try_with(|t| t.clone()).ok().flatten()
    }

    /// Fail-closed front door for request handling.
    ///
    /// Returns the current tenant, or rejects the request with
    /// [`TenantError::MissingContext`] unless the endpoint is on the exempt
    /// allow-list. Collaborators call this before reaching business logic,
    /// which is what keeps the rewriter's fail-open path from ever being the
    /// only line of defense.
    pub fn require(endpoint: &str) -> TenantResult<Option<Arc<Tenant>>> {
        Self::require_with(endpoint, EXEMPT_ENDPOINTS)
    }

    /// [`TenantContext::require`] with a caller-supplied allow-list.
    pub fn require_with(
        endpoint: &str,
        exempt: &[&str],
    ) -> TenantResult<Option<Arc<Tenant>>> {
        match Self::current() {
            Some(tenant) => Ok(Some(tenant)),
            None if exempt.contains(&endpoint) => Ok(None),
            None => {
                warn!(endpoint, "request rejected: no tenant in context");
                Err(TenantError::MissingContext {
                    endpoint: endpoint.to_string(),
                })
            }
        }
    }
}
