//! Predicate fragments: a small boolean AST plus bound parameters.
//!
//! Fragments are the unit of scoping: every restriction a rewriter injects
//! is an [`Expr`] with its parameters. Composition is conjunction only:
//! there is no `Or` variant, so a rewritten query can never widen access
//! relative to the unscoped query.
//!
//! An [`Expr`] both renders to Cypher text and evaluates against in-memory
//! property maps. The latter is what integration fixtures use to assert
//! row-level exclusion without a live graph store.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// Query parameters, keyed by parameter name.
///
/// A BTreeMap keeps rendering and merging deterministic.
pub type Params = BTreeMap<String, Value>;

/// Properties of a single node or relationship.
pub type PropMap = BTreeMap<String, Value>;

/// A fixture row: properties per pattern alias (e.g. `n`, `m`, `r`).
pub type Row = BTreeMap<String, PropMap>;

/// Comparison operator for property predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Le,
}

impl CmpOp {
    fn as_cypher(&self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Le => "<=",
        }
    }
}

/// A boolean filter expression over pattern aliases.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Always satisfied; the synthesized base predicate for templates with
    /// no WHERE clause.
    AlwaysTrue,
    /// `alias.property <op> $param`
    Cmp {
        alias: String,
        property: String,
        op: CmpOp,
        param: String,
    },
    /// `alias.property IN $param`
    In {
        alias: String,
        property: String,
        param: String,
    },
    /// `coalesce(alias.property, default) <op> $param`
    CoalesceCmp {
        alias: String,
        property: String,
        default: i64,
        op: CmpOp,
        param: String,
    },
    /// Conjunction of sub-expressions.
    And(Vec<Expr>),
    /// Opaque caller-supplied boolean text (a template's original WHERE).
    /// Never produced by predicate builders; carried verbatim and treated
    /// as satisfied during in-memory evaluation.
    Raw(String),
}

impl Expr {
    /// Conjunction of two expressions, flattening nested `And`s.
    pub fn and(self, other: Expr) -> Expr {
        let mut children = match self {
            Expr::And(children) => children,
            expr => vec![expr],
        };
        match other {
            Expr::And(more) => children.extend(more),
            expr => children.push(expr),
        }
        Expr::And(children)
    }

    /// Evaluates the expression against a fixture row.
    ///
    /// Missing aliases, properties, or parameters never satisfy a
    /// comparison (except `CoalesceCmp`, whose default fills a missing
    /// property). `Raw` text cannot be evaluated in-process and counts as
    /// satisfied; fixtures should express every restriction structurally.
    pub fn matches(&self, row: &Row, params: &Params) -> bool {
        match self {
            Expr::AlwaysTrue | Expr::Raw(_) => true,
            Expr::And(children) => children.iter().all(|c| c.matches(row, params)),
            Expr::Cmp {
                alias,
                property,
                op,
                param,
            } => {
                let actual = match row.get(alias).and_then(|props| props.get(property)) {
                    Some(v) => v,
                    None => return false,
                };
                let expected = match params.get(param) {
                    Some(v) => v,
                    None => return false,
                };
                compare(actual, *op, expected)
            }
            Expr::In {
                alias,
                property,
                param,
            } => {
                let actual = match row.get(alias).and_then(|props| props.get(property)) {
                    Some(v) => v,
                    None => return false,
                };
                params
                    .get(param)
                    .and_then(Value::as_array)
                    .map(|list| list.contains(actual))
                    .unwrap_or(false)
            }
            Expr::CoalesceCmp {
                alias,
                property,
                default,
                op,
                param,
            } => {
                let actual = row
                    .get(alias)
                    .and_then(|props| props.get(property))
                    .and_then(Value::as_i64)
                    .unwrap_or(*default);
                let expected = match params.get(param).and_then(Value::as_i64) {
                    Some(v) => v,
                    None => return false,
                };
                match op {
                    CmpOp::Eq => actual == expected,
                    CmpOp::Le => actual <= expected,
                }
            }
        }
    }
}

fn compare(actual: &Value, op: CmpOp, expected: &Value) -> bool {
    match op {
        CmpOp::Eq => actual == expected,
        CmpOp::Le => match (actual.as_i64(), expected.as_i64()) {
            (Some(a), Some(e)) => a <= e,
            _ => false,
        },
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::AlwaysTrue => f.write_str("true"),
            Expr::Cmp {
                alias,
                property,
                op,
                param,
            } => write!(f, "{alias}.{property} {} ${param}", op.as_cypher()),
            Expr::In {
                alias,
                property,
                param,
            } => write!(f, "{alias}.{property} IN ${param}"),
            Expr::CoalesceCmp {
                alias,
                property,
                default,
                op,
                param,
            } => write!(
                f,
                "coalesce({alias}.{property}, {default}) {} ${param}",
                op.as_cypher()
            ),
            Expr::And(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    match child {
                        Expr::And(_) | Expr::Raw(_) => write!(f, "({child})")?,
                        _ => write!(f, "{child}")?,
                    }
                }
                Ok(())
            }
            Expr::Raw(text) => f.write_str(text),
        }
    }
}

/// A filter expression plus the parameters it binds.
///
/// Fragment parameters are namespaced by their producer (`perm_*` for ABAC,
/// `tenant_*` for tenant isolation) so they can never collide with
/// caller-supplied query parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub expr: Expr,
    pub params: Params,
}

impl Fragment {
    pub fn new(expr: Expr, params: Params) -> Self {
        Self { expr, params }
    }

    /// Conjunction of two fragments, merging parameters.
    ///
    /// Both sides derive their parameters deterministically from the same
    /// subject/tenant, so a shared key always carries the same value.
    pub fn and(mut self, other: Fragment) -> Fragment {
        self.expr = self.expr.and(other.expr);
        self.params.extend(other.params);
        self
    }

    /// Evaluates the fragment against a fixture row using its own params.
    pub fn matches(&self, row: &Row) -> bool {
        self.expr.matches(row, &self.params)
    }
}
