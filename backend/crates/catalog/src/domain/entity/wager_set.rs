//! Wager Set Entity

use chrono::{DateTime, Utc};
use kernel::id::{OrganizationId, WagerSetId};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// Bet ladder offered by a game
///
/// Invariant: `wager_levels` is strictly increasing, every level is
/// positive and `default_wager` is one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WagerSet {
    pub id: WagerSetId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub wager_levels: Vec<i64>,
    pub default_wager: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WagerSet {
    pub fn new(
        organization_id: OrganizationId,
        name: impl Into<String>,
        wager_levels: Vec<i64>,
        default_wager: i64,
    ) -> CatalogResult<Self> {
        let now = Utc::now();
        let mut set = Self {
            id: WagerSetId::new(),
            organization_id,
            name: name.into(),
            wager_levels,
            default_wager,
            created_at: now,
            updated_at: now,
        };
        set.normalize()?;
        Ok(set)
    }

    /// Sort and dedup the levels, then check the invariant
    pub fn normalize(&mut self) -> CatalogResult<()> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::validation("name", "must not be empty"));
        }
        if self.wager_levels.is_empty() {
            return Err(CatalogError::validation("wager_levels", "must not be empty"));
        }
        if self.wager_levels.iter().any(|w| *w <= 0) || self.default_wager <= 0 {
            return Err(CatalogError::NegativeWager);
        }
        self.wager_levels.sort_unstable();
        self.wager_levels.dedup();
        if self.wager_levels.binary_search(&self.default_wager).is_err() {
            return Err(CatalogError::DefaultWagerOutOfList);
        }
        Ok(())
    }
}
