//! Tenant model.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tenant lifecycle status.
///
/// Tenants are never physically deleted; deactivation is a status
/// transition so historical data keeps a resolvable owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    Active,
    Suspended,
    Inactive,
}

impl TenantStatus {
    /// Returns the canonical lowercase name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantStatus::Active => "active",
            TenantStatus::Suspended => "suspended",
            TenantStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for TenantStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, String> {
        match value.to_ascii_lowercase().as_str() {
            "active" => Ok(TenantStatus::Active),
            "suspended" => Ok(TenantStatus::Suspended),
            "inactive" => Ok(TenantStatus::Inactive),
            _ => Err(format!("unknown tenant status: {value}")),
        }
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tenant metadata.
///
/// The registry is the sole owner of tenant records; per-request context
/// holds a read-only `Arc<Tenant>` whose lifetime is the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    /// Unique tenant id; stamped onto every tenant-scoped node and
    /// relationship as the `tenant_id` property.
    pub tenant_id: String,
    /// Display name.
    pub name: String,
    /// Optional domain for subdomain-based resolution.
    pub domain: Option<String>,
    /// Lifecycle status.
    pub status: TenantStatus,
    /// Opaque per-tenant configuration bag.
    pub config: HashMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Creates an active tenant with empty config.
    pub fn new(tenant_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            tenant_id: tenant_id.into(),
            name: name.into(),
            domain: None,
            status: TenantStatus::Active,
            config: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the tenant's domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets a config entry.
    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    /// True only for active tenants.
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }
}
