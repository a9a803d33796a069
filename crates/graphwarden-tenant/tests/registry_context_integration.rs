//! End-to-end tenant lifecycle: provision a tenant in the registry, resolve
//! it for a request, and run the request body inside a tenant scope.

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use graphwarden_tenant::{
    MemoryTenantRegistry, Tenant, TenantContext, TenantError, TenantRegistry, TenantStatus,
};

#[tokio::test]
async fn provision_resolve_and_scope_request() -> Result<()> {
    let registry = MemoryTenantRegistry::new_shared();

    let tenant = Tenant::new("acme", "Acme Corp")
        .with_domain("acme.example.com")
        .with_config("max_nodes", json!(10_000));
    registry.create_tenant(tenant).await?;

    // Request arrives with a host header; resolve and scope it.
    let resolved = registry.get_tenant_by_domain("acme.example.com").await?;
    let resolved = registry.get_active_tenant(&resolved.tenant_id).await?;

    TenantContext::scope(Arc::new(resolved), async {
        let current = TenantContext::require("/api/query")?.expect("tenant set in scope");
        assert_eq!(current.tenant_id, "acme");
        assert_eq!(current.config.get("max_nodes"), Some(&json!(10_000)));
        Ok::<_, TenantError>(())
    })
    .await?;

    Ok(())
}

#[tokio::test]
async fn suspended_tenant_is_rejected_at_resolution() -> Result<()> {
    let registry = MemoryTenantRegistry::new_shared();
    registry.create_tenant(Tenant::new("beta", "Beta Inc")).await?;
    registry.update_status("beta", TenantStatus::Suspended).await?;

    let err = registry.get_active_tenant("beta").await.unwrap_err();
    assert!(matches!(err, TenantError::NotActive { .. }));

    // The record itself survives suspension
    let tenant = registry.get_tenant("beta").await?;
    assert_eq!(tenant.status, TenantStatus::Suspended);
    Ok(())
}

#[tokio::test]
async fn unscoped_request_fails_require_but_health_is_exempt() -> Result<()> {
    let err = TenantContext::require("/api/query").unwrap_err();
    assert!(matches!(err, TenantError::MissingContext { .. }));

    assert!(TenantContext::require("/health")?.is_none());
    Ok(())
}
