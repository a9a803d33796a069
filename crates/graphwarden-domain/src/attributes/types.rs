//! Core attribute type definitions.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// The closed set of subject roles.
///
/// Roles are a closed enum rather than free-form strings so that every
/// predicate-building and decision site can match exhaustively; an unknown
/// role string fails at parse time, not deep inside evaluation. Subjects
/// that fit none of the privileged roles carry [`Role::User`], the
/// least-privileged default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access; bypasses ABAC predicates but never tenant isolation.
    Admin,
    /// Owns one or more businesses; access scoped to owned resources.
    Owner,
    /// Read access up to sensitivity level 1.
    Analyst,
    /// Unrestricted read for audit purposes.
    Auditor,
    /// Default least-privileged role.
    User,
}

impl Role {
    /// Returns the canonical lowercase name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Owner => "owner",
            Role::Analyst => "analyst",
            Role::Auditor => "auditor",
            Role::User => "user",
        }
    }

    /// All roles in the closed set.
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Owner,
        Role::Analyst,
        Role::Auditor,
        Role::User,
    ];
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(value: &str) -> DomainResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            "analyst" => Ok(Role::Analyst),
            "auditor" => Ok(Role::Auditor),
            "user" => Ok(Role::User),
            _ => Err(DomainError::InvalidRole {
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of actions a subject can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    /// Returns the canonical lowercase name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    /// True for the only non-mutating action.
    pub fn is_read(&self) -> bool {
        matches!(self, Action::Read)
    }

    /// All actions in the closed set.
    pub const ALL: [Action; 4] = [Action::Read, Action::Create, Action::Update, Action::Delete];
}

impl FromStr for Action {
    type Err = DomainError;

    fn from_str(value: &str) -> DomainResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "read" => Ok(Action::Read),
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            _ => Err(DomainError::InvalidAction {
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller.
///
/// Built once per request from validated credentials and immutable for the
/// request's lifetime. Never persisted beyond the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectAttributes {
    /// Unique id of the authenticated user.
    pub user_id: String,
    /// The subject's role.
    pub role: Role,
    /// Businesses the subject owns; empty means none.
    pub business_ids: BTreeSet<String>,
    /// Alias set for ownership-based filtering.
    pub owner_ids: BTreeSet<String>,
    /// Capability strings; `"*"` grants all.
    pub permissions: BTreeSet<String>,
}

impl SubjectAttributes {
    /// Creates a subject with the given id and role and no ownership sets.
    pub fn new(user_id: impl Into<String>, role: Role) -> DomainResult<Self> {
        let user_id = user_id.into();
        if user_id.is_empty() {
            return Err(DomainError::EmptyIdentifier { field: "user_id" });
        }
        Ok(Self {
            user_id,
            role,
            business_ids: BTreeSet::new(),
            owner_ids: BTreeSet::new(),
            permissions: BTreeSet::new(),
        })
    }

    /// Sets the owned-business id set. Rejects empty ids.
    pub fn with_business_ids<I, S>(mut self, ids: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.business_ids = validated_id_set(ids, "business_ids")?;
        Ok(self)
    }

    /// Sets the ownership alias id set. Rejects empty ids.
    pub fn with_owner_ids<I, S>(mut self, ids: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.owner_ids = validated_id_set(ids, "owner_ids")?;
        Ok(self)
    }

    /// Sets the permission set. Rejects empty capability strings.
    pub fn with_permissions<I, S>(mut self, permissions: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = validated_id_set(permissions, "permissions")?;
        Ok(self)
    }

    /// Whether the subject holds a capability, honoring the `"*"` wildcard.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains("*") || self.permissions.contains(permission)
    }

    /// Whether any ownership set is non-empty.
    pub fn has_ownership_scope(&self) -> bool {
        !self.business_ids.is_empty() || !self.owner_ids.is_empty()
    }
}

fn validated_id_set<I, S>(ids: I, field: &'static str) -> DomainResult<BTreeSet<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut set = BTreeSet::new();
    for id in ids {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::EmptyIdentifier { field });
        }
        set.insert(id);
    }
    Ok(set)
}

/// The target of an action.
///
/// Constructed per-query from caller-supplied parameters; a transient
/// authorization input, never persisted as an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAttributes {
    /// Node label / entity kind, e.g. "Business" or "Transaction".
    pub resource_type: String,
    /// Specific resource id, when the action targets one.
    pub id: Option<String>,
    /// Owning business, when the resource belongs to one.
    pub business_id: Option<String>,
    /// Ordinal confidentiality class; 0 = public, higher = more restricted.
    pub sensitivity_level: u8,
}

impl ResourceAttributes {
    /// Creates resource attributes for the given type at sensitivity 0.
    pub fn new(resource_type: impl Into<String>) -> DomainResult<Self> {
        let resource_type = resource_type.into();
        if resource_type.is_empty() {
            return Err(DomainError::EmptyIdentifier {
                field: "resource_type",
            });
        }
        Ok(Self {
            resource_type,
            id: None,
            business_id: None,
            sensitivity_level: 0,
        })
    }

    /// Sets the specific resource id. Rejects an empty id.
    pub fn with_id(mut self, id: impl Into<String>) -> DomainResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::EmptyIdentifier { field: "id" });
        }
        self.id = Some(id);
        Ok(self)
    }

    /// Sets the owning business id. Rejects an empty id.
    pub fn with_business_id(mut self, business_id: impl Into<String>) -> DomainResult<Self> {
        let business_id = business_id.into();
        if business_id.is_empty() {
            return Err(DomainError::EmptyIdentifier {
                field: "business_id",
            });
        }
        self.business_id = Some(business_id);
        Ok(self)
    }

    /// Sets the sensitivity level.
    pub fn with_sensitivity_level(mut self, level: u8) -> Self {
        self.sensitivity_level = level;
        self
    }
}

/// Contextual facts at decision time, built fresh per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentAttributes {
    /// Decision time.
    pub time: DateTime<Utc>,
    /// Caller location, when known.
    pub location: Option<String>,
    /// Caller IP address, when known.
    pub ip_address: Option<String>,
}

impl EnvironmentAttributes {
    /// Environment snapshot at the current instant with no optional facts.
    pub fn now() -> Self {
        Self {
            time: Utc::now(),
            location: None,
            ip_address: None,
        }
    }

    /// Environment snapshot at a fixed instant (tests, replay).
    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            time,
            location: None,
            ip_address: None,
        }
    }

    /// Sets the caller location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Sets the caller IP address.
    pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }
}

impl Default for EnvironmentAttributes {
    fn default() -> Self {
        Self::now()
    }
}
