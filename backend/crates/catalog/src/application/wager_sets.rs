//! Wager set administration

use std::sync::Arc;

use chrono::Utc;
use gateway::Overlord;
use kernel::id::{OrganizationId, WagerSetId};
use kernel::pagination::{Page, PageRequest};
use serde::Deserialize;

use crate::application::CatalogRepository;
use crate::application::config_sender::ConfigSender;
use crate::domain::entity::WagerSet;
use crate::error::{CatalogError, CatalogResult};

#[derive(Debug, Clone, Deserialize)]
pub struct WagerSetInput {
    pub organization_id: OrganizationId,
    pub name: String,
    pub wager_levels: Vec<i64>,
    pub default_wager: i64,
}

pub struct WagerSetUseCase<R: CatalogRepository> {
    repo: Arc<R>,
    sender: ConfigSender<R>,
}

impl<R: CatalogRepository> WagerSetUseCase<R> {
    pub fn new(repo: Arc<R>, overlord: Arc<dyn Overlord>) -> Self {
        Self {
            sender: ConfigSender::new(Arc::clone(&repo), overlord),
            repo,
        }
    }

    pub async fn list(&self, request: &PageRequest) -> CatalogResult<Page<WagerSet>> {
        self.repo.list_wager_sets(request).await
    }

    pub async fn get(&self, id: WagerSetId) -> CatalogResult<WagerSet> {
        self.repo
            .find_wager_set(id)
            .await?
            .ok_or(CatalogError::WagerSetNotFound)
    }

    pub async fn create(&self, input: WagerSetInput) -> CatalogResult<WagerSet> {
        self.repo
            .find_organization(input.organization_id)
            .await?
            .ok_or(CatalogError::OrganizationNotFound)?;
        let set = WagerSet::new(
            input.organization_id,
            input.name.trim(),
            input.wager_levels,
            input.default_wager,
        )?;
        self.repo.insert_wager_set(&set).await?;

        tracing::info!(wager_set_id = %set.id, levels = set.wager_levels.len(), "Wager set created");
        Ok(set)
    }

    /// Games already point at the set, so the snapshot is republished
    pub async fn update(&self, id: WagerSetId, input: WagerSetInput) -> CatalogResult<WagerSet> {
        let mut set = self.get(id).await?;
        set.organization_id = input.organization_id;
        set.name = input.name.trim().to_string();
        set.wager_levels = input.wager_levels;
        set.default_wager = input.default_wager;
        set.normalize()?;
        set.updated_at = Utc::now();
        self.repo.update_wager_set(&set).await?;

        tracing::info!(wager_set_id = %id, "Wager set updated");
        self.sender.notify("wager set updated");
        Ok(set)
    }

    pub async fn delete(&self, id: WagerSetId) -> CatalogResult<()> {
        if !self.repo.delete_wager_set(id).await? {
            return Err(CatalogError::WagerSetNotFound);
        }

        tracing::info!(wager_set_id = %id, "Wager set deleted");
        self.sender.notify("wager set deleted");
        Ok(())
    }
}
