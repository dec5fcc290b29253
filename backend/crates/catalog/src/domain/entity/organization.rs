//! Organization Entity

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use kernel::error::app_error::AppError;
use kernel::id::{AccountId, OrganizationId, OrganizationPairId};
use kernel::organization::{OrganizationRef, OrganizationType};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationStatus {
    #[default]
    Active,
    Blocked,
}

impl OrganizationStatus {
    pub const fn code(&self) -> &'static str {
        match self {
            OrganizationStatus::Active => "active",
            OrganizationStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for OrganizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for OrganizationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(OrganizationStatus::Active),
            "blocked" => Ok(OrganizationStatus::Blocked),
            other => Err(AppError::bad_request(format!(
                "Unknown organization status: {}",
                other
            ))),
        }
    }
}

/// Provider, integrator or operator
///
/// `(name, type)` is unique among live rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    #[serde(rename = "type")]
    pub organization_type: OrganizationType,
    pub status: OrganizationStatus,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(name: impl Into<String>, organization_type: OrganizationType) -> Self {
        let now = Utc::now();
        Self {
            id: OrganizationId::new(),
            name: name.into(),
            organization_type,
            status: OrganizationStatus::Active,
            api_key: platform::crypto::random_token(32),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_ref(&self) -> OrganizationRef {
        OrganizationRef {
            id: self.id,
            name: self.name.clone(),
            organization_type: self.organization_type,
        }
    }

    pub fn expect_type(&self, expected: OrganizationType) -> CatalogResult<()> {
        if self.organization_type == expected {
            Ok(())
        } else {
            Err(CatalogError::WrongOrganizationType(expected))
        }
    }

    /// Only the sole attached account (or nobody) may delete an organization
    pub fn ensure_deletable(attached: &[AccountId], requester: AccountId) -> CatalogResult<()> {
        match attached {
            [] => Ok(()),
            [only] if *only == requester => Ok(()),
            [_] => Err(CatalogError::OrganizationInUse(
                "attached to another account".to_string(),
            )),
            many => Err(CatalogError::OrganizationInUse(format!(
                "{} accounts attached",
                many.len()
            ))),
        }
    }
}

/// Which link table a pair lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairKind {
    /// `integrator_providers`: (provider, integrator)
    ProviderIntegrator,
    /// `operator_integrators`: (integrator, operator)
    IntegratorOperator,
}

impl PairKind {
    /// Required types of the (owner, counterpart) sides
    pub const fn sides(&self) -> (OrganizationType, OrganizationType) {
        match self {
            PairKind::ProviderIntegrator => (OrganizationType::Provider, OrganizationType::Integrator),
            PairKind::IntegratorOperator => (OrganizationType::Integrator, OrganizationType::Operator),
        }
    }
}

/// One row of a pair table
///
/// `owner` is the provider (provider/integrator) or the integrator
/// (integrator/operator); `counterpart` is the other side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationPair {
    pub id: OrganizationPairId,
    pub kind: PairKind,
    pub owner: OrganizationRef,
    pub counterpart: OrganizationRef,
}

impl OrganizationPair {
    /// Provider side of a provider/integrator pair
    pub fn provider(&self) -> &OrganizationRef {
        &self.owner
    }

    /// Integrator side of a provider/integrator pair
    pub fn integrator(&self) -> &OrganizationRef {
        &self.counterpart
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_organization_gets_api_key() {
        let a = Organization::new("Acme", OrganizationType::Provider);
        let b = Organization::new("Acme", OrganizationType::Provider);
        assert!(!a.api_key.is_empty());
        assert_ne!(a.api_key, b.api_key);
        assert_eq!(a.status, OrganizationStatus::Active);
    }

    #[test]
    fn test_expect_type() {
        let org = Organization::new("Acme", OrganizationType::Integrator);
        assert!(org.expect_type(OrganizationType::Integrator).is_ok());
        assert!(matches!(
            org.expect_type(OrganizationType::Provider),
            Err(CatalogError::WrongOrganizationType(OrganizationType::Provider))
        ));
    }

    #[test]
    fn test_delete_allowed_only_for_sole_attached_account() {
        let me = AccountId::new();
        let other = AccountId::new();
        assert!(Organization::ensure_deletable(&[], me).is_ok());
        assert!(Organization::ensure_deletable(&[me], me).is_ok());
        assert!(matches!(
            Organization::ensure_deletable(&[other], me),
            Err(CatalogError::OrganizationInUse(_))
        ));
        assert!(matches!(
            Organization::ensure_deletable(&[me, other], me),
            Err(CatalogError::OrganizationInUse(_))
        ));
    }
}
