//! Rule definitions, condition evaluation, and rule-set validation.
//!
//! Rules are declarative data: a set of role/action matchers plus attribute
//! conditions, paired with an effect and a priority. Definitions are compiled
//! into [`CompiledRule`]s by [`RuleSetBuilder::build`], which rejects unknown
//! attribute paths, unknown actions/roles, and operator/value mismatches up
//! front. Evaluation afterwards is total: a condition over a missing optional
//! attribute simply does not match.

use std::fmt;
use std::str::FromStr;

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attributes::{Action, EnvironmentAttributes, ResourceAttributes, Role, SubjectAttributes};
use crate::error::{DomainError, DomainResult};

/// Rule effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

/// The closed set of attribute paths a rule condition may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributePath {
    SubjectUserId,
    SubjectRole,
    SubjectBusinessIds,
    SubjectOwnerIds,
    SubjectPermissions,
    ResourceType,
    ResourceId,
    ResourceBusinessId,
    ResourceSensitivityLevel,
    EnvironmentHour,
    EnvironmentLocation,
    EnvironmentIpAddress,
    Action,
}

impl AttributePath {
    /// Canonical dotted name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributePath::SubjectUserId => "subject.user_id",
            AttributePath::SubjectRole => "subject.role",
            AttributePath::SubjectBusinessIds => "subject.business_ids",
            AttributePath::SubjectOwnerIds => "subject.owner_ids",
            AttributePath::SubjectPermissions => "subject.permissions",
            AttributePath::ResourceType => "resource.type",
            AttributePath::ResourceId => "resource.id",
            AttributePath::ResourceBusinessId => "resource.business_id",
            AttributePath::ResourceSensitivityLevel => "resource.sensitivity_level",
            AttributePath::EnvironmentHour => "environment.hour",
            AttributePath::EnvironmentLocation => "environment.location",
            AttributePath::EnvironmentIpAddress => "environment.ip_address",
            AttributePath::Action => "action",
        }
    }

    /// True when the path resolves to a numeric value.
    fn is_numeric(&self) -> bool {
        matches!(
            self,
            AttributePath::ResourceSensitivityLevel | AttributePath::EnvironmentHour
        )
    }

    /// True when the path resolves to a set of strings.
    fn is_set(&self) -> bool {
        matches!(
            self,
            AttributePath::SubjectBusinessIds
                | AttributePath::SubjectOwnerIds
                | AttributePath::SubjectPermissions
        )
    }
}

impl FromStr for AttributePath {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, ()> {
        match value {
            "subject.user_id" => Ok(AttributePath::SubjectUserId),
            "subject.role" => Ok(AttributePath::SubjectRole),
            "subject.business_ids" => Ok(AttributePath::SubjectBusinessIds),
            "subject.owner_ids" => Ok(AttributePath::SubjectOwnerIds),
            "subject.permissions" => Ok(AttributePath::SubjectPermissions),
            "resource.type" => Ok(AttributePath::ResourceType),
            "resource.id" => Ok(AttributePath::ResourceId),
            "resource.business_id" => Ok(AttributePath::ResourceBusinessId),
            "resource.sensitivity_level" => Ok(AttributePath::ResourceSensitivityLevel),
            "environment.hour" => Ok(AttributePath::EnvironmentHour),
            "environment.location" => Ok(AttributePath::EnvironmentLocation),
            "environment.ip_address" => Ok(AttributePath::EnvironmentIpAddress),
            "action" => Ok(AttributePath::Action),
            _ => Err(()),
        }
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Attribute equals the rule value (string or number).
    Equals,
    /// Attribute is present and differs from the rule value.
    NotEquals,
    /// String attribute is one of the rule's list values.
    In,
    /// Set attribute contains the rule's string value.
    Contains,
    /// Numeric attribute is at most the rule value.
    LessOrEqual,
    /// Numeric attribute is at least the rule value.
    GreaterOrEqual,
    /// Resource ownership link is in the subject's matching ownership set
    /// (`resource.business_id` against `subject.business_ids`, `resource.id`
    /// against `subject.owner_ids`). Takes no rule value.
    OwnedBySubject,
}

/// A declarative rule condition, as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDefinition {
    /// Dotted attribute path, e.g. "resource.sensitivity_level".
    pub attribute: String,
    /// Comparison operator.
    pub operator: Operator,
    /// Right-hand value; `null` for value-less operators.
    #[serde(default)]
    pub value: Value,
}

/// A compiled rule condition with a resolved attribute path.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub attribute: AttributePath,
    pub operator: Operator,
    pub value: Value,
}

impl Condition {
    /// Evaluates the condition. Total: missing optional attributes never
    /// match, for any operator.
    fn evaluate(
        &self,
        subject: &SubjectAttributes,
        action: Action,
        resource: &ResourceAttributes,
        environment: &EnvironmentAttributes,
    ) -> bool {
        match self.operator {
            Operator::OwnedBySubject => match self.attribute {
                AttributePath::ResourceBusinessId => resource
                    .business_id
                    .as_ref()
                    .map(|id| subject.business_ids.contains(id))
                    .unwrap_or(false),
                AttributePath::ResourceId => resource
                    .id
                    .as_ref()
                    .map(|id| subject.owner_ids.contains(id))
                    .unwrap_or(false),
                // Unreachable after build-time validation.
                _ => false,
            },
            Operator::Contains => {
                let needle = match self.value.as_str() {
                    Some(s) => s,
                    None => return false,
                };
                match self.attribute {
                    AttributePath::SubjectBusinessIds => subject.business_ids.contains(needle),
                    AttributePath::SubjectOwnerIds => subject.owner_ids.contains(needle),
                    AttributePath::SubjectPermissions => subject.has_permission(needle),
                    _ => false,
                }
            }
            Operator::LessOrEqual | Operator::GreaterOrEqual => {
                let attr = match self.numeric_attribute(resource, environment) {
                    Some(n) => n,
                    None => return false,
                };
                let bound = match self.value.as_i64() {
                    Some(n) => n,
                    None => return false,
                };
                if self.operator == Operator::LessOrEqual {
                    attr <= bound
                } else {
                    attr >= bound
                }
            }
            Operator::In => {
                let attr = match self.string_attribute(subject, action, resource, environment) {
                    Some(s) => s,
                    None => return false,
                };
                self.value
                    .as_array()
                    .map(|list| list.iter().any(|v| v.as_str() == Some(attr)))
                    .unwrap_or(false)
            }
            Operator::Equals | Operator::NotEquals => {
                let matched = if let Some(n) = self.numeric_attribute(resource, environment) {
                    self.value.as_i64() == Some(n)
                } else {
                    match self.string_attribute(subject, action, resource, environment) {
                        Some(s) => self.value.as_str() == Some(s),
                        None => return false,
                    }
                };
                if self.operator == Operator::Equals {
                    matched
                } else {
                    !matched
                }
            }
        }
    }

    fn numeric_attribute(
        &self,
        resource: &ResourceAttributes,
        environment: &EnvironmentAttributes,
    ) -> Option<i64> {
        match self.attribute {
            AttributePath::ResourceSensitivityLevel => Some(i64::from(resource.sensitivity_level)),
            AttributePath::EnvironmentHour => Some(i64::from(environment.time.hour())),
            _ => None,
        }
    }

    fn string_attribute<'a>(
        &self,
        subject: &'a SubjectAttributes,
        action: Action,
        resource: &'a ResourceAttributes,
        environment: &'a EnvironmentAttributes,
    ) -> Option<&'a str> {
        match self.attribute {
            AttributePath::SubjectUserId => Some(subject.user_id.as_str()),
            AttributePath::SubjectRole => Some(subject.role.as_str()),
            AttributePath::ResourceType => Some(resource.resource_type.as_str()),
            AttributePath::ResourceId => resource.id.as_deref(),
            AttributePath::ResourceBusinessId => resource.business_id.as_deref(),
            AttributePath::EnvironmentLocation => environment.location.as_deref(),
            AttributePath::EnvironmentIpAddress => environment.ip_address.as_deref(),
            AttributePath::Action => Some(action.as_str()),
            _ => None,
        }
    }
}

/// A declarative rule, as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// Unique rule name, used in decision reasons.
    pub name: String,
    /// Allow or deny.
    pub effect: Effect,
    /// Higher priority rules are scanned first within their effect class.
    #[serde(default)]
    pub priority: i32,
    /// Roles the rule applies to; empty means every role.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Actions the rule applies to; empty means every action.
    #[serde(default)]
    pub actions: Vec<String>,
    /// Conditions, combined with AND; empty means unconditional.
    #[serde(default)]
    pub conditions: Vec<ConditionDefinition>,
}

impl RuleDefinition {
    /// Shorthand for an unconditional rule over the given roles and actions.
    pub fn new(name: impl Into<String>, effect: Effect) -> Self {
        Self {
            name: name.into(),
            effect,
            priority: 0,
            roles: Vec::new(),
            actions: Vec::new(),
            conditions: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_condition(
        mut self,
        attribute: impl Into<String>,
        operator: Operator,
        value: Value,
    ) -> Self {
        self.conditions.push(ConditionDefinition {
            attribute: attribute.into(),
            operator,
            value,
        });
        self
    }
}

/// A rule compiled and validated by [`RuleSetBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub name: String,
    pub effect: Effect,
    pub priority: i32,
    pub roles: Vec<Role>,
    pub actions: Vec<Action>,
    pub conditions: Vec<Condition>,
}

impl CompiledRule {
    /// Whether the rule matches the request tuple.
    pub(crate) fn matches(
        &self,
        subject: &SubjectAttributes,
        action: Action,
        resource: &ResourceAttributes,
        environment: &EnvironmentAttributes,
    ) -> bool {
        if !self.roles.is_empty() && !self.roles.contains(&subject.role) {
            return false;
        }
        if !self.actions.is_empty() && !self.actions.contains(&action) {
            return false;
        }
        self.conditions
            .iter()
            .all(|c| c.evaluate(subject, action, resource, environment))
    }
}

/// An immutable, validated set of rules.
///
/// Deny rules and allow rules are pre-sorted by descending priority at build
/// time; the engine never sorts or validates on the request path.
#[derive(Debug, Clone)]
pub struct RuleSet {
    deny_rules: Vec<CompiledRule>,
    allow_rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Starts an empty builder.
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    pub(crate) fn deny_rules(&self) -> &[CompiledRule] {
        &self.deny_rules
    }

    pub(crate) fn allow_rules(&self) -> &[CompiledRule] {
        &self.allow_rules
    }

    /// Total number of rules.
    pub fn len(&self) -> usize {
        self.deny_rules.len() + self.allow_rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The built-in rule table covering the standard role semantics:
    ///
    /// - admin: everything (also covered by the engine's default bypass)
    /// - auditor: unrestricted read
    /// - analyst: read up to sensitivity level 1
    /// - owner/user: any action on resources they own, plus read of
    ///   low-sensitivity resources
    ///
    /// Writes by subjects without a matching ownership link fall through to
    /// the engine's default deny.
    pub fn standard() -> RuleSet {
        RuleSet::builder()
            .rules(Self::standard_definitions())
            .build()
            .expect("standard rule set is valid")
    }

    /// The standard rule table as definitions, so configured rules can layer
    /// on top of it through the same validating build path.
    pub fn standard_definitions() -> Vec<RuleDefinition> {
        vec![
            RuleDefinition::new("admin-full-access", Effect::Allow)
                .with_priority(100)
                .with_roles(["admin"]),
            RuleDefinition::new("auditor-read", Effect::Allow)
                .with_priority(90)
                .with_roles(["auditor"])
                .with_actions(["read"]),
            RuleDefinition::new("analyst-read-low-sensitivity", Effect::Allow)
                .with_priority(80)
                .with_roles(["analyst"])
                .with_actions(["read"])
                .with_condition(
                    "resource.sensitivity_level",
                    Operator::LessOrEqual,
                    Value::from(1),
                ),
            RuleDefinition::new("owner-access-owned-business", Effect::Allow)
                .with_priority(70)
                .with_roles(["owner", "user"])
                .with_condition("resource.business_id", Operator::OwnedBySubject, Value::Null),
            RuleDefinition::new("owner-access-owned-resource", Effect::Allow)
                .with_priority(70)
                .with_roles(["owner", "user"])
                .with_condition("resource.id", Operator::OwnedBySubject, Value::Null),
            RuleDefinition::new("default-read-public", Effect::Allow)
                .with_priority(10)
                .with_roles(["owner", "user"])
                .with_actions(["read"])
                .with_condition(
                    "resource.sensitivity_level",
                    Operator::LessOrEqual,
                    Value::from(1),
                ),
        ]
    }
}

/// Validating builder for [`RuleSet`].
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    definitions: Vec<RuleDefinition>,
}

impl RuleSetBuilder {
    /// Adds a rule definition.
    pub fn rule(mut self, definition: RuleDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Adds every definition from an iterator.
    pub fn rules<I>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = RuleDefinition>,
    {
        self.definitions.extend(definitions);
        self
    }

    /// Compiles and validates the rule set.
    ///
    /// Rejects empty rule sets, unknown roles/actions/attribute paths, and
    /// operator/value pairings that could never evaluate meaningfully.
    pub fn build(self) -> DomainResult<RuleSet> {
        if self.definitions.is_empty() {
            return Err(DomainError::EmptyRuleSet);
        }

        let mut deny_rules = Vec::new();
        let mut allow_rules = Vec::new();

        for definition in self.definitions {
            let compiled = compile_rule(definition)?;
            match compiled.effect {
                Effect::Deny => deny_rules.push(compiled),
                Effect::Allow => allow_rules.push(compiled),
            }
        }

        deny_rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        allow_rules.sort_by(|a, b| b.priority.cmp(&a.priority));

        Ok(RuleSet {
            deny_rules,
            allow_rules,
        })
    }
}

fn compile_rule(definition: RuleDefinition) -> DomainResult<CompiledRule> {
    let RuleDefinition {
        name,
        effect,
        priority,
        roles,
        actions,
        conditions,
    } = definition;

    let roles = roles
        .iter()
        .map(|r| r.parse::<Role>())
        .collect::<DomainResult<Vec<_>>>()?;

    let actions = actions
        .iter()
        .map(|a| {
            a.parse::<Action>().map_err(|_| DomainError::UnknownAction {
                rule: name.clone(),
                action: a.clone(),
            })
        })
        .collect::<DomainResult<Vec<_>>>()?;

    let conditions = conditions
        .into_iter()
        .map(|c| compile_condition(&name, c))
        .collect::<DomainResult<Vec<_>>>()?;

    Ok(CompiledRule {
        name,
        effect,
        priority,
        roles,
        actions,
        conditions,
    })
}

fn compile_condition(rule: &str, definition: ConditionDefinition) -> DomainResult<Condition> {
    let attribute = definition.attribute.parse::<AttributePath>().map_err(|_| {
        DomainError::UnknownAttribute {
            rule: rule.to_string(),
            attribute: definition.attribute.clone(),
        }
    })?;

    let invalid = |message: &str| DomainError::InvalidCondition {
        rule: rule.to_string(),
        attribute: attribute.as_str().to_string(),
        message: message.to_string(),
    };

    match definition.operator {
        Operator::OwnedBySubject => {
            if !matches!(
                attribute,
                AttributePath::ResourceBusinessId | AttributePath::ResourceId
            ) {
                return Err(invalid(
                    "owned_by_subject applies only to resource.business_id or resource.id",
                ));
            }
            if !definition.value.is_null() {
                return Err(invalid("owned_by_subject takes no value"));
            }
        }
        Operator::LessOrEqual | Operator::GreaterOrEqual => {
            if !attribute.is_numeric() {
                return Err(invalid("ordering comparison requires a numeric attribute"));
            }
            if !definition.value.is_i64() && !definition.value.is_u64() {
                return Err(invalid("ordering comparison requires an integer value"));
            }
        }
        Operator::In => {
            if attribute.is_set() || attribute.is_numeric() {
                return Err(invalid("in requires a string-valued attribute"));
            }
            let all_strings = definition
                .value
                .as_array()
                .map(|list| list.iter().all(Value::is_string))
                .unwrap_or(false);
            if !all_strings {
                return Err(invalid("in requires a list of strings"));
            }
        }
        Operator::Contains => {
            if !attribute.is_set() {
                return Err(invalid("contains requires a set-valued attribute"));
            }
            if !definition.value.is_string() {
                return Err(invalid("contains requires a string value"));
            }
        }
        Operator::Equals | Operator::NotEquals => {
            if attribute.is_set() {
                return Err(invalid("equality does not apply to set attributes"));
            }
            let compatible = if attribute.is_numeric() {
                definition.value.is_i64() || definition.value.is_u64()
            } else {
                definition.value.is_string()
            };
            if !compatible {
                return Err(invalid("value type does not match attribute type"));
            }
        }
    }

    Ok(Condition {
        attribute,
        operator: definition.operator,
        value: definition.value,
    })
}
