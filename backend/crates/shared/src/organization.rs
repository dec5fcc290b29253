//! Organization Types
//!
//! The three organisation roles of the platform. Providers own games,
//! integrators distribute them, operators are downstream end-sites.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::app_error::AppError;
use crate::id::OrganizationId;

/// Organization summary carried inside account and session snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRef {
    pub id: OrganizationId,
    pub name: String,
    #[serde(rename = "type")]
    pub organization_type: OrganizationType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationType {
    Integrator,
    Provider,
    Operator,
}

impl OrganizationType {
    pub const ALL: [OrganizationType; 3] = [
        OrganizationType::Integrator,
        OrganizationType::Provider,
        OrganizationType::Operator,
    ];

    /// Stored representation (`organizations.type`)
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrganizationType::Integrator => "integrator",
            OrganizationType::Provider => "provider",
            OrganizationType::Operator => "operator",
        }
    }
}

impl fmt::Display for OrganizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrganizationType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "integrator" => Ok(OrganizationType::Integrator),
            "provider" => Ok(OrganizationType::Provider),
            "operator" => Ok(OrganizationType::Operator),
            other => Err(AppError::bad_request(format!(
                "Unknown organization type: {}",
                other
            ))),
        }
    }
}
