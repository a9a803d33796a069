//! Structured query templates with an explicit filter extension point.
//!
//! A template is the shape of a query before scoping: a pattern clause, an
//! optional caller-written WHERE (carried as opaque text), and a trailing
//! clause. Rewriters add restrictions through [`QueryTemplate::with_filter`];
//! there is no text surgery, so there is no injection point to miss. When
//! a template has no WHERE of its own, rendering synthesizes one from an
//! always-true base predicate so appended fragments are always valid
//! conjuncts.

use std::fmt;

use crate::fragment::Expr;

/// A structured query template.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTemplate {
    pattern: String,
    base_where: Option<String>,
    filters: Vec<Expr>,
    tail: Option<String>,
}

impl QueryTemplate {
    /// Creates a template from a pattern clause, e.g. `MATCH (n:Business)`.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            base_where: None,
            filters: Vec::new(),
            tail: None,
        }
    }

    /// Sets the caller's own WHERE condition (without the `WHERE` keyword).
    ///
    /// The text is opaque to the rewriters: it is carried verbatim as the
    /// first conjunct and never parsed.
    pub fn where_raw(mut self, condition: impl Into<String>) -> Self {
        self.base_where = Some(condition.into());
        self
    }

    /// Sets the trailing clause, e.g. `RETURN n ORDER BY n.name`.
    pub fn returning(mut self, tail: impl Into<String>) -> Self {
        self.tail = Some(tail.into());
        self
    }

    /// Appends a filter expression as a conjunct. The extension point used
    /// by every rewriting pass.
    pub fn with_filter(mut self, filter: Expr) -> Self {
        self.filters.push(filter);
        self
    }

    /// Filters injected so far.
    pub fn filters(&self) -> &[Expr] {
        &self.filters
    }

    /// True when no restriction has been injected.
    pub fn is_unscoped(&self) -> bool {
        self.filters.is_empty()
    }

    /// The effective filter: every injected restriction as one conjunction.
    ///
    /// `AlwaysTrue` when nothing was injected; the caller's raw WHERE is not
    /// included (it cannot be evaluated in-process).
    pub fn effective_filter(&self) -> Expr {
        match self.filters.len() {
            0 => Expr::AlwaysTrue,
            1 => self.filters[0].clone(),
            _ => Expr::And(self.filters.to_vec()),
        }
    }

    /// Renders the final query text.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for QueryTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)?;

        match (&self.base_where, self.filters.is_empty()) {
            (None, true) => {}
            (Some(base), _) => {
                write!(f, " WHERE {base}")?;
                for filter in &self.filters {
                    match filter {
                        Expr::And(_) => write!(f, " AND ({filter})")?,
                        _ => write!(f, " AND {filter}")?,
                    }
                }
            }
            (None, false) => {
                // Synthesized base: appended fragments are always conjuncts
                write!(f, " WHERE true")?;
                for filter in &self.filters {
                    match filter {
                        Expr::And(_) => write!(f, " AND ({filter})")?,
                        _ => write!(f, " AND {filter}")?,
                    }
                }
            }
        }

        if let Some(tail) = &self.tail {
            write!(f, " {tail}")?;
        }
        Ok(())
    }
}
