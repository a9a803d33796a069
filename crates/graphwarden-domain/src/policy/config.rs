//! Declarative policy configuration loading.
//!
//! Rule sets are process-lifetime configuration: loaded once at startup from
//! a YAML file (with environment overrides), compiled and validated into a
//! [`RuleSet`], and treated as immutable afterwards. Loading a new file means
//! building a new engine; there is no in-place rule mutation.
//!
//! Environment variables are prefixed with `GRAPHWARDEN_` and use `__` as
//! separator, e.g. `GRAPHWARDEN_POLICY__USE_STANDARD_RULES=false`.
//!
//! # Example
//!
//! ```ignore
//! use graphwarden_domain::policy::{PolicyConfig, PolicyEngine};
//!
//! let config = PolicyConfig::load("policy.yaml")?;
//! let engine = PolicyEngine::new(config.build_rule_set()?);
//! ```

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::policy::rules::{RuleDefinition, RuleSet};

/// Top-level policy configuration file shape.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PolicyConfig {
    /// Policy settings.
    #[serde(default)]
    pub policy: PolicySettings,
}

/// Policy settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PolicySettings {
    /// Prepend the built-in standard rule table before `rules`.
    #[serde(default = "default_true")]
    pub use_standard_rules: bool,

    /// Additional declarative rules.
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            use_standard_rules: true,
            rules: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl PolicyConfig {
    /// Loads configuration from a YAML file with environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> DomainResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DomainError::ConfigLoad {
                message: format!("configuration file not found: {}", path.display()),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&PolicyConfig::default()).map_err(load_error)?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(
                Environment::with_prefix("GRAPHWARDEN")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(load_error)?;

        config.try_deserialize().map_err(load_error)
    }

    /// Loads configuration from environment variables over defaults.
    pub fn from_env() -> DomainResult<Self> {
        let config = Config::builder()
            .add_source(Config::try_from(&PolicyConfig::default()).map_err(load_error)?)
            .add_source(
                Environment::with_prefix("GRAPHWARDEN")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(load_error)?;

        config.try_deserialize().map_err(load_error)
    }

    /// Compiles the configured rules into a validated [`RuleSet`].
    ///
    /// Any unknown attribute, role, or action in the file surfaces here, at
    /// load time, never during request evaluation.
    pub fn build_rule_set(&self) -> DomainResult<RuleSet> {
        let mut builder = RuleSet::builder();
        if self.policy.use_standard_rules {
            builder = builder.rules(RuleSet::standard_definitions());
        }
        builder.rules(self.policy.rules.iter().cloned()).build()
    }
}

fn load_error(error: config::ConfigError) -> DomainError {
    DomainError::ConfigLoad {
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // Serializes tests that read or mutate GRAPHWARDEN_* variables; the
    // Environment source reads the process environment on every load.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_build_standard_rules() {
        let config = PolicyConfig::default();
        let rules = config.build_rule_set().unwrap();
        assert_eq!(rules.len(), 6);
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(matches!(
            PolicyConfig::load("/nonexistent/policy.yaml"),
            Err(DomainError::ConfigLoad { .. })
        ));
    }

    #[test]
    fn test_load_yaml_file_with_extra_rule() {
        let _guard = ENV_LOCK.lock().unwrap();
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            concat!(
                "policy:\n",
                "  use_standard_rules: true\n",
                "  rules:\n",
                "    - name: deny-night-writes\n",
                "      effect: deny\n",
                "      priority: 50\n",
                "      actions: [update, delete]\n",
                "      conditions:\n",
                "        - attribute: environment.hour\n",
                "          operator: greater_or_equal\n",
                "          value: 22\n",
            )
        )
        .unwrap();

        let config = PolicyConfig::load(file.path()).unwrap();
        assert!(config.policy.use_standard_rules);
        assert_eq!(config.policy.rules.len(), 1);

        let rules = config.build_rule_set().unwrap();
        assert_eq!(rules.len(), 7);
    }

    #[test]
    fn test_from_env_overrides_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();

        let config = PolicyConfig::from_env().unwrap();
        assert!(config.policy.use_standard_rules);

        std::env::set_var("GRAPHWARDEN_POLICY__USE_STANDARD_RULES", "false");
        let config = PolicyConfig::from_env().unwrap();
        std::env::remove_var("GRAPHWARDEN_POLICY__USE_STANDARD_RULES");

        assert!(!config.policy.use_standard_rules);
        // No standard table and no file rules leaves nothing to build
        assert!(matches!(
            config.build_rule_set(),
            Err(DomainError::EmptyRuleSet)
        ));
    }

    #[test]
    fn test_bad_rule_in_file_fails_at_build() {
        let config = PolicyConfig {
            policy: PolicySettings {
                use_standard_rules: false,
                rules: vec![crate::policy::rules::RuleDefinition::new(
                    "bad",
                    crate::policy::rules::Effect::Allow,
                )
                .with_actions(["transmogrify"])],
            },
        };
        assert!(matches!(
            config.build_rule_set(),
            Err(DomainError::UnknownAction { .. })
        ));
    }
}
