//! Role-based predicate builders.
//!
//! Translates a subject's role and ownership attributes into node-level and
//! relationship-level filter fragments. The mapping is an exhaustive match
//! over [`Role`], so adding a role forces every predicate site to be
//! revisited at compile time.
//!
//! `None` means "no additional restriction", which is only the same thing
//! as "allow" for admin and auditor. For analyst writes, and for
//! unprivileged roles requesting a write with no ownership scope, the
//! builder also returns `None`: the policy engine's default deny is what
//! keeps those writes out, and the engine must always be consulted before a
//! rewritten query is executed.

use serde_json::Value;

use graphwarden_domain::{Action, Role, SubjectAttributes};

use crate::fragment::{CmpOp, Expr, Fragment, Params};

/// Sensitivity ceiling applied to analysts and ownerless readers.
const DEFAULT_SENSITIVITY_CEILING: i64 = 1;

/// Parameter names, namespaced under `perm_` so they can never collide with
/// caller-supplied parameters.
const PARAM_MAX_SENSITIVITY: &str = "perm_max_sensitivity";
const PARAM_REL_MAX_SENSITIVITY: &str = "perm_rel_max_sensitivity";
const PARAM_BUSINESS_IDS: &str = "perm_business_ids";
const PARAM_OWNER_IDS: &str = "perm_owner_ids";

/// Builds permission fragments for fixed node/relationship aliases.
#[derive(Debug, Clone)]
pub struct PredicateBuilder {
    node_alias: String,
    rel_alias: String,
}

impl Default for PredicateBuilder {
    fn default() -> Self {
        Self {
            node_alias: "n".to_string(),
            rel_alias: "r".to_string(),
        }
    }
}

impl PredicateBuilder {
    /// Builder with the default aliases `n` and `r`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the node alias the fragments reference.
    pub fn with_node_alias(mut self, alias: impl Into<String>) -> Self {
        self.node_alias = alias.into();
        self
    }

    /// Sets the relationship alias the fragments reference.
    pub fn with_rel_alias(mut self, alias: impl Into<String>) -> Self {
        self.rel_alias = alias.into();
        self
    }

    /// Node-level permission fragment for the configured node alias.
    pub fn build_node_predicate(
        &self,
        action: Action,
        subject: &SubjectAttributes,
    ) -> Option<Fragment> {
        self.build_node_predicate_for_alias(action, subject, &self.node_alias)
    }

    /// Node-level permission fragment for an explicit alias (traversals
    /// apply the same restriction to every node alias in the pattern).
    pub fn build_node_predicate_for_alias(
        &self,
        action: Action,
        subject: &SubjectAttributes,
        alias: &str,
    ) -> Option<Fragment> {
        match subject.role {
            // No node restriction; tenant isolation still applies.
            Role::Admin | Role::Auditor => None,
            // Analysts cannot write at all; the engine denies those, so the
            // fragment only shapes reads.
            Role::Analyst => action.is_read().then(|| sensitivity_fragment(alias)),
            Role::Owner | Role::User => {
                if subject.has_ownership_scope() {
                    Some(ownership_fragment(subject, alias))
                } else if action.is_read() {
                    Some(coalesce_sensitivity_fragment(
                        alias,
                        PARAM_MAX_SENSITIVITY,
                    ))
                } else {
                    // No restriction generated; the policy engine's default
                    // deny is the gate for ownerless writes.
                    None
                }
            }
        }
    }

    /// Relationship-level permission fragment for the configured alias.
    pub fn build_relationship_predicate(
        &self,
        action: Action,
        subject: &SubjectAttributes,
    ) -> Option<Fragment> {
        match subject.role {
            Role::Admin | Role::Auditor => None,
            Role::Analyst | Role::Owner | Role::User => {
                if action.is_read() {
                    Some(coalesce_sensitivity_fragment(
                        &self.rel_alias,
                        PARAM_REL_MAX_SENSITIVITY,
                    ))
                } else {
                    None
                }
            }
        }
    }
}

/// `alias.sensitivity_level <= $perm_max_sensitivity`
fn sensitivity_fragment(alias: &str) -> Fragment {
    let mut params = Params::new();
    params.insert(
        PARAM_MAX_SENSITIVITY.to_string(),
        Value::from(DEFAULT_SENSITIVITY_CEILING),
    );
    Fragment::new(
        Expr::Cmp {
            alias: alias.to_string(),
            property: "sensitivity_level".to_string(),
            op: CmpOp::Le,
            param: PARAM_MAX_SENSITIVITY.to_string(),
        },
        params,
    )
}

/// `coalesce(alias.sensitivity_level, 0) <= $param`
fn coalesce_sensitivity_fragment(alias: &str, param: &str) -> Fragment {
    let mut params = Params::new();
    params.insert(param.to_string(), Value::from(DEFAULT_SENSITIVITY_CEILING));
    Fragment::new(
        Expr::CoalesceCmp {
            alias: alias.to_string(),
            property: "sensitivity_level".to_string(),
            default: 0,
            op: CmpOp::Le,
            param: param.to_string(),
        },
        params,
    )
}

/// Ownership membership fragment; both clauses AND-combined when both
/// ownership sets are present. Tightening only, never OR.
fn ownership_fragment(subject: &SubjectAttributes, alias: &str) -> Fragment {
    let mut clauses = Vec::new();
    let mut params = Params::new();

    if !subject.business_ids.is_empty() {
        clauses.push(Expr::In {
            alias: alias.to_string(),
            property: "business_id".to_string(),
            param: PARAM_BUSINESS_IDS.to_string(),
        });
        params.insert(
            PARAM_BUSINESS_IDS.to_string(),
            Value::from(
                subject
                    .business_ids
                    .iter()
                    .cloned()
                    .collect::<Vec<String>>(),
            ),
        );
    }

    if !subject.owner_ids.is_empty() {
        clauses.push(Expr::In {
            alias: alias.to_string(),
            property: "owner_id".to_string(),
            param: PARAM_OWNER_IDS.to_string(),
        });
        params.insert(
            PARAM_OWNER_IDS.to_string(),
            Value::from(subject.owner_ids.iter().cloned().collect::<Vec<String>>()),
        );
    }

    let expr = match clauses.len() {
        1 => clauses.remove(0),
        _ => Expr::And(clauses),
    };
    Fragment::new(expr, params)
}
