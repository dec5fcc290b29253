//! Currency Set Entity

use kernel::id::{CurrencySetId, OrganizationId};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// Named list of currency titles offered by an organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencySet {
    pub id: CurrencySetId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub currencies: Vec<String>,
}

impl CurrencySet {
    pub fn normalize(&mut self) -> CatalogResult<()> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::validation("name", "must not be empty"));
        }
        for c in self.currencies.iter_mut() {
            *c = c.trim().to_lowercase();
        }
        self.currencies.retain(|c| !c.is_empty());
        self.currencies.sort();
        self.currencies.dedup();
        if self.currencies.is_empty() {
            return Err(CatalogError::validation("currencies", "must not be empty"));
        }
        Ok(())
    }
}
