//! The tenant isolation rewriting pass.
//!
//! Independent of ABAC: admin subjects bypass permission predicates but
//! never tenant scoping. The two passes inject disjoint, conjunctive
//! fragments and compose in either order.
//!
//! The current tenant is read from [`TenantContext`]. When no tenant is in
//! context the rewrite is a no-op with a warning, a fail-open preserved
//! from the calling contract. The fail-closed counterpart is
//! `TenantContext::require`, which request handling calls before any query
//! is built; this pass is the second line of defense, not the first.

use serde_json::Value;
use tracing::{instrument, warn};

use graphwarden_tenant::TenantContext;

use crate::error::{RewriteError, RewriteResult};
use crate::fragment::{CmpOp, Expr, Params, PropMap};
use crate::rewriter::RewrittenQuery;
use crate::template::QueryTemplate;

/// Property stamped onto every tenant-aware node and relationship.
const TENANT_PROPERTY: &str = "tenant_id";

/// Namespaced parameter bound to the current tenant's id.
const PARAM_TENANT_ID: &str = "tenant_tenant_id";

/// Injects tenant-id predicates sourced from request-scoped context.
#[derive(Debug, Clone, Default)]
pub struct TenantQueryRewriter;

impl TenantQueryRewriter {
    pub fn new() -> Self {
        Self
    }

    /// Scopes a single-node query to the current tenant.
    #[instrument(skip_all, fields(alias = %alias))]
    pub fn rewrite_node_query(
        &self,
        template: QueryTemplate,
        params: Params,
        alias: &str,
    ) -> RewrittenQuery {
        self.rewrite_aliases(template, params, &[alias])
    }

    /// Scopes a relationship query to the current tenant. Relationships
    /// written through the tenant-aware path carry `tenant_id` like nodes.
    #[instrument(skip_all, fields(rel_alias = %rel_alias))]
    pub fn rewrite_relationship_query(
        &self,
        template: QueryTemplate,
        params: Params,
        rel_alias: &str,
    ) -> RewrittenQuery {
        self.rewrite_aliases(template, params, &[rel_alias])
    }

    /// Scopes a traversal query: every alias reachable in the returned
    /// pattern must be constrained to the current tenant. Constraining only
    /// the anchor node is a correctness bug, so callers pass every alias.
    #[instrument(skip_all, fields(aliases = ?aliases))]
    pub fn rewrite_traversal_query(
        &self,
        template: QueryTemplate,
        params: Params,
        aliases: &[&str],
    ) -> RewrittenQuery {
        self.rewrite_aliases(template, params, aliases)
    }

    fn rewrite_aliases(
        &self,
        template: QueryTemplate,
        mut params: Params,
        aliases: &[&str],
    ) -> RewrittenQuery {
        let tenant = match TenantContext::current() {
            Some(tenant) => tenant,
            None => {
                // Known gap: fail-open by contract. require() upstream is
                // the fail-closed gate.
                warn!("tenant rewrite skipped: no tenant in request context");
                return RewrittenQuery { template, params };
            }
        };

        let mut clauses: Vec<Expr> = aliases
            .iter()
            .map(|alias| Expr::Cmp {
                alias: (*alias).to_string(),
                property: TENANT_PROPERTY.to_string(),
                op: CmpOp::Eq,
                param: PARAM_TENANT_ID.to_string(),
            })
            .collect();
        let expr = match clauses.len() {
            1 => clauses.remove(0),
            _ => Expr::And(clauses),
        };

        params.insert(
            PARAM_TENANT_ID.to_string(),
            Value::from(tenant.tenant_id.clone()),
        );

        RewrittenQuery {
            template: template.with_filter(expr),
            params,
        }
    }
}

/// Stamps the current tenant's id onto a write-path property map.
///
/// Every node and relationship created through the tenant-aware path must
/// carry `tenant_id`; unlike the read-path rewrite this fails closed, since
/// an unstamped write would be a permanent isolation violation rather than
/// a recoverable over-broad read.
pub fn stamp_tenant_properties(properties: &mut PropMap) -> RewriteResult<()> {
    let tenant = TenantContext::current().ok_or(RewriteError::MissingTenantForWrite)?;
    properties.insert(
        TENANT_PROPERTY.to_string(),
        Value::from(tenant.tenant_id.clone()),
    );
    Ok(())
}
