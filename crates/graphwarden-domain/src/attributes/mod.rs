//! Attribute model: typed inputs to every authorization decision.
//!
//! This module contains:
//! - [`Role`] and [`Action`] closed enums
//! - [`SubjectAttributes`] (the authenticated caller)
//! - [`ResourceAttributes`] (the target of an action)
//! - [`EnvironmentAttributes`] (contextual facts at decision time)

mod types;
#[cfg(test)]
mod types_proptest;

pub use types::*;
