//! The ABAC rewriting pass.
//!
//! Injects permission fragments produced by the predicate builders into a
//! query template and merges their parameters. The rewriter only tightens:
//! it never denies (the policy engine does that) and never drops a fragment
//! (the template synthesizes a base WHERE when it has none).

use tracing::{debug, instrument};

use graphwarden_domain::{Action, SubjectAttributes};

use crate::fragment::{Fragment, Params, Row};
use crate::predicates::PredicateBuilder;
use crate::template::QueryTemplate;

/// A scoped query: template plus merged parameters, ready for the storage
/// driver. The rewriter never executes anything.
#[derive(Debug, Clone, PartialEq)]
pub struct RewrittenQuery {
    pub template: QueryTemplate,
    pub params: Params,
}

impl RewrittenQuery {
    /// Renders the final query text.
    pub fn cypher(&self) -> String {
        self.template.render()
    }

    /// Evaluates the injected restrictions against a fixture row.
    ///
    /// Used by tests to assert row-level exclusion without a live store;
    /// the caller's raw WHERE (if any) is not part of this evaluation.
    pub fn matches_row(&self, row: &Row) -> bool {
        self.template.effective_filter().matches(row, &self.params)
    }

    fn pass_through(template: QueryTemplate, params: Params) -> Self {
        Self { template, params }
    }

    fn with_fragment(template: QueryTemplate, mut params: Params, fragment: Fragment) -> Self {
        let Fragment { expr, params: new } = fragment;
        params.extend(new);
        Self {
            template: template.with_filter(expr),
            params,
        }
    }
}

/// Applies permission predicates to query templates.
///
/// Stateless aside from alias configuration; one value can serve every
/// request concurrently.
#[derive(Debug, Clone, Default)]
pub struct PermissionRewriter {
    builder: PredicateBuilder,
}

impl PermissionRewriter {
    /// Rewriter over the default aliases `n` and `r`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewriter over explicit aliases.
    pub fn with_aliases(node_alias: impl Into<String>, rel_alias: impl Into<String>) -> Self {
        Self {
            builder: PredicateBuilder::new()
                .with_node_alias(node_alias)
                .with_rel_alias(rel_alias),
        }
    }

    /// Scopes a single-node query to what the subject may see.
    ///
    /// No-op fast path when the subject's role carries no restriction
    /// (admin, auditor): the original template and params pass through
    /// unchanged.
    #[instrument(skip_all, fields(action = %action, role = %subject.role))]
    pub fn rewrite_node_query(
        &self,
        template: QueryTemplate,
        params: Params,
        action: Action,
        subject: &SubjectAttributes,
    ) -> RewrittenQuery {
        match self.builder.build_node_predicate(action, subject) {
            None => {
                debug!("no node restriction; query passes through");
                RewrittenQuery::pass_through(template, params)
            }
            Some(fragment) => RewrittenQuery::with_fragment(template, params, fragment),
        }
    }

    /// Scopes a traversal query: the node restriction is applied to every
    /// node alias in the pattern and the relationship restriction to the
    /// relationship alias. Partial scoping of a traversal is a leak, which
    /// is why the node aliases are taken as a slice rather than one anchor.
    #[instrument(skip_all, fields(action = %action, role = %subject.role))]
    pub fn rewrite_traversal_with_permissions(
        &self,
        template: QueryTemplate,
        params: Params,
        action: Action,
        subject: &SubjectAttributes,
        node_aliases: &[&str],
        rel_alias: &str,
    ) -> RewrittenQuery {
        let rel_builder = self.builder.clone().with_rel_alias(rel_alias);

        let mut combined: Option<Fragment> = None;
        for alias in node_aliases {
            if let Some(fragment) =
                self.builder
                    .build_node_predicate_for_alias(action, subject, alias)
            {
                combined = Some(match combined {
                    Some(existing) => existing.and(fragment),
                    None => fragment,
                });
            }
        }
        if let Some(fragment) = rel_builder.build_relationship_predicate(action, subject) {
            combined = Some(match combined {
                Some(existing) => existing.and(fragment),
                None => fragment,
            });
        }

        match combined {
            None => {
                debug!("no traversal restriction; query passes through");
                RewrittenQuery::pass_through(template, params)
            }
            Some(fragment) => RewrittenQuery::with_fragment(template, params, fragment),
        }
    }
}
