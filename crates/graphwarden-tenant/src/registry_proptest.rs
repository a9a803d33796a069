//! Property-based tests for the in-memory tenant registry.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::registry::{MemoryTenantRegistry, TenantRegistry};
    use crate::tenant::Tenant;

    /// Strategy for ids that pass `validate_tenant_id`.
    fn tenant_id_strategy() -> impl Strategy<Value = String> {
        "[a-z0-9][a-z0-9_-]{0,63}".prop_map(String::from)
    }

    /// Strategy for names that pass `validate_tenant_name`.
    fn tenant_name_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 ]{0,39}".prop_map(String::from)
    }

    fn block_on<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(fut)
    }

    proptest! {
        #[test]
        fn test_create_then_get_roundtrips(
            tenant_id in tenant_id_strategy(),
            name in tenant_name_strategy(),
        ) {
            block_on(async {
                let registry = MemoryTenantRegistry::new();
                let created = registry
                    .create_tenant(Tenant::new(&tenant_id, &name))
                    .await
                    .unwrap();
                let fetched = registry.get_tenant(&tenant_id).await.unwrap();
                assert_eq!(fetched, created);
                assert_eq!(fetched.tenant_id, tenant_id);
                assert_eq!(fetched.name, name);
                assert!(fetched.is_active());
            });
        }

        #[test]
        fn test_domain_lookup_roundtrips(
            tenant_id in tenant_id_strategy(),
            name in tenant_name_strategy(),
        ) {
            block_on(async {
                let registry = MemoryTenantRegistry::new();
                let domain = format!("{tenant_id}.example.com");
                registry
                    .create_tenant(Tenant::new(&tenant_id, &name).with_domain(&domain))
                    .await
                    .unwrap();
                let fetched = registry.get_tenant_by_domain(&domain).await.unwrap();
                assert_eq!(fetched.tenant_id, tenant_id);
            });
        }
    }
}
