//! TenantRegistry trait definition and in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::instrument;

use crate::error::{TenantError, TenantResult};
use crate::tenant::{Tenant, TenantStatus};

/// Maximum length accepted for tenant ids and names.
const MAX_ID_LENGTH: usize = 64;
const MAX_NAME_LENGTH: usize = 256;

/// Validates a tenant id: non-empty, bounded length, url-safe characters.
pub fn validate_tenant_id(tenant_id: &str) -> TenantResult<()> {
    if tenant_id.is_empty() {
        return Err(TenantError::InvalidTenantId {
            message: "tenant id cannot be empty".to_string(),
        });
    }
    if tenant_id.len() > MAX_ID_LENGTH {
        return Err(TenantError::InvalidTenantId {
            message: format!("tenant id exceeds {MAX_ID_LENGTH} characters"),
        });
    }
    if !tenant_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(TenantError::InvalidTenantId {
            message: format!("tenant id contains invalid characters: {tenant_id}"),
        });
    }
    Ok(())
}

/// Validates a tenant display name: non-empty, bounded length.
pub fn validate_tenant_name(name: &str) -> TenantResult<()> {
    if name.trim().is_empty() {
        return Err(TenantError::InvalidTenantName {
            message: "tenant name cannot be empty".to_string(),
        });
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(TenantError::InvalidTenantName {
            message: format!("tenant name exceeds {MAX_NAME_LENGTH} characters"),
        });
    }
    Ok(())
}

/// Abstract tenant registry.
///
/// Implementations must be thread-safe (Send + Sync). Provisioning and
/// status transitions happen through admin flows; request handling only
/// reads. Tenants are never deleted, only transitioned.
#[async_trait]
pub trait TenantRegistry: Send + Sync + 'static {
    /// Creates a new tenant.
    async fn create_tenant(&self, tenant: Tenant) -> TenantResult<Tenant>;

    /// Gets a tenant by id.
    async fn get_tenant(&self, tenant_id: &str) -> TenantResult<Tenant>;

    /// Looks a tenant up by its registered domain.
    async fn get_tenant_by_domain(&self, domain: &str) -> TenantResult<Tenant>;

    /// Transitions a tenant's status. Returns the updated record.
    async fn update_status(&self, tenant_id: &str, status: TenantStatus) -> TenantResult<Tenant>;

    /// Merges config entries into a tenant's config bag.
    async fn update_config(
        &self,
        tenant_id: &str,
        config: Vec<(String, serde_json::Value)>,
    ) -> TenantResult<Tenant>;

    /// Lists all tenants.
    async fn list_tenants(&self) -> TenantResult<Vec<Tenant>>;

    /// Gets a tenant by id, failing unless it is active.
    ///
    /// This is the lookup request handling should use: suspended and
    /// inactive tenants must not establish request context.
    async fn get_active_tenant(&self, tenant_id: &str) -> TenantResult<Tenant> {
        let tenant = self.get_tenant(tenant_id).await?;
        if !tenant.is_active() {
            return Err(TenantError::NotActive {
                tenant_id: tenant.tenant_id,
                status: tenant.status.to_string(),
            });
        }
        Ok(tenant)
    }
}

/// In-memory implementation of TenantRegistry.
///
/// Uses DashMap for thread-safe concurrent access without a global lock.
/// Intended for tests and single-process deployments; production registries
/// back onto the storage driver.
#[derive(Debug, Default)]
pub struct MemoryTenantRegistry {
    tenants: DashMap<String, Tenant>,
}

impl MemoryTenantRegistry {
    /// Creates a new in-memory registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory registry wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl TenantRegistry for MemoryTenantRegistry {
    #[instrument(skip(self, tenant), fields(tenant_id = %tenant.tenant_id))]
    async fn create_tenant(&self, tenant: Tenant) -> TenantResult<Tenant> {
        validate_tenant_id(&tenant.tenant_id)?;
        validate_tenant_name(&tenant.name)?;

        use dashmap::mapref::entry::Entry;
        match self.tenants.entry(tenant.tenant_id.clone()) {
            Entry::Occupied(_) => Err(TenantError::AlreadyExists {
                tenant_id: tenant.tenant_id,
            }),
            Entry::Vacant(entry) => {
                entry.insert(tenant.clone());
                Ok(tenant)
            }
        }
    }

    async fn get_tenant(&self, tenant_id: &str) -> TenantResult<Tenant> {
        self.tenants
            .get(tenant_id)
            .map(|t| t.clone())
            .ok_or_else(|| TenantError::NotFound {
                tenant_id: tenant_id.to_string(),
            })
    }

    async fn get_tenant_by_domain(&self, domain: &str) -> TenantResult<Tenant> {
        self.tenants
            .iter()
            .find(|t| t.domain.as_deref() == Some(domain))
            .map(|t| t.clone())
            .ok_or_else(|| TenantError::NotFound {
                tenant_id: domain.to_string(),
            })
    }

    #[instrument(skip(self))]
    async fn update_status(&self, tenant_id: &str, status: TenantStatus) -> TenantResult<Tenant> {
        let mut entry = self
            .tenants
            .get_mut(tenant_id)
            .ok_or_else(|| TenantError::NotFound {
                tenant_id: tenant_id.to_string(),
            })?;
        entry.status = status;
        entry.updated_at = chrono::Utc::now();
        Ok(entry.clone())
    }

    async fn update_config(
        &self,
        tenant_id: &str,
        config: Vec<(String, serde_json::Value)>,
    ) -> TenantResult<Tenant> {
        let mut entry = self
            .tenants
            .get_mut(tenant_id)
            .ok_or_else(|| TenantError::NotFound {
                tenant_id: tenant_id.to_string(),
            })?;
        for (key, value) in config {
            entry.config.insert(key, value);
        }
        entry.updated_at = chrono::Utc::now();
        Ok(entry.clone())
    }

    async fn list_tenants(&self) -> TenantResult<Vec<Tenant>> {
        let mut tenants: Vec<Tenant> = self.tenants.iter().map(|t| t.clone()).collect();
        tenants.sort_by(|a, b| a.tenant_id.cmp(&b.tenant_id));
        Ok(tenants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = MemoryTenantRegistry::new();
        registry
            .create_tenant(Tenant::new("tenant-a", "Tenant A"))
            .await
            .unwrap();

        let tenant = registry.get_tenant("tenant-a").await.unwrap();
        assert_eq!(tenant.name, "Tenant A");
        assert!(tenant.is_active());
    }

    #[tokio::test]
    async fn test_duplicate_create_fails() {
        let registry = MemoryTenantRegistry::new();
        registry
            .create_tenant(Tenant::new("tenant-a", "Tenant A"))
            .await
            .unwrap();
        let result = registry.create_tenant(Tenant::new("tenant-a", "Other")).await;
        assert!(matches!(result, Err(TenantError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_invalid_ids_rejected() {
        let registry = MemoryTenantRegistry::new();
        assert!(matches!(
            registry.create_tenant(Tenant::new("", "x")).await,
            Err(TenantError::InvalidTenantId { .. })
        ));
        assert!(matches!(
            registry.create_tenant(Tenant::new("bad id!", "x")).await,
            Err(TenantError::InvalidTenantId { .. })
        ));
        assert!(matches!(
            registry.create_tenant(Tenant::new("ok", "  ")).await,
            Err(TenantError::InvalidTenantName { .. })
        ));
    }

    #[tokio::test]
    async fn test_domain_lookup() {
        let registry = MemoryTenantRegistry::new();
        registry
            .create_tenant(Tenant::new("tenant-a", "Tenant A").with_domain("a.example.com"))
            .await
            .unwrap();

        let tenant = registry.get_tenant_by_domain("a.example.com").await.unwrap();
        assert_eq!(tenant.tenant_id, "tenant-a");
        assert!(registry.get_tenant_by_domain("b.example.com").await.is_err());
    }

    #[tokio::test]
    async fn test_status_transition_not_deletion() {
        let registry = MemoryTenantRegistry::new();
        registry
            .create_tenant(Tenant::new("tenant-a", "Tenant A"))
            .await
            .unwrap();

        let suspended = registry
            .update_status("tenant-a", TenantStatus::Suspended)
            .await
            .unwrap();
        assert_eq!(suspended.status, TenantStatus::Suspended);

        // Record still present and listable
        assert_eq!(registry.list_tenants().await.unwrap().len(), 1);

        // But no longer usable for request context
        assert!(matches!(
            registry.get_active_tenant("tenant-a").await,
            Err(TenantError::NotActive { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_config_merges() {
        let registry = MemoryTenantRegistry::new();
        registry
            .create_tenant(
                Tenant::new("tenant-a", "Tenant A")
                    .with_config("retention_days", serde_json::json!(30)),
            )
            .await
            .unwrap();

        let updated = registry
            .update_config(
                "tenant-a",
                vec![("max_nodes".to_string(), serde_json::json!(500))],
            )
            .await
            .unwrap();
        assert_eq!(updated.config.len(), 2);
        assert!(updated.updated_at >= updated.created_at);
    }
}
