//! Organizations, pairs and integrator assignments

use std::sync::Arc;

use gateway::Overlord;
use kernel::id::{AccountId, GameId, OrganizationId, WagerSetId};
use kernel::organization::OrganizationType;
use kernel::pagination::{Page, PageRequest};

use crate::application::CatalogRepository;
use crate::application::config_sender::ConfigSender;
use crate::domain::entity::{Game, Organization, OrganizationPair, OrganizationStatus, PairKind};
use crate::error::{CatalogError, CatalogResult};

pub struct CreateOrganizationInput {
    pub name: String,
    pub organization_type: OrganizationType,
}

/// The type of an organization never changes
pub struct UpdateOrganizationInput {
    pub name: Option<String>,
    pub status: Option<OrganizationStatus>,
}

pub struct OrganizationUseCase<R: CatalogRepository> {
    repo: Arc<R>,
    sender: ConfigSender<R>,
}

impl<R: CatalogRepository> OrganizationUseCase<R> {
    pub fn new(repo: Arc<R>, overlord: Arc<dyn Overlord>) -> Self {
        Self {
            sender: ConfigSender::new(Arc::clone(&repo), overlord),
            repo,
        }
    }

    pub async fn list(&self, request: &PageRequest) -> CatalogResult<Page<Organization>> {
        self.repo.list_organizations(request).await
    }

    pub async fn get(&self, id: OrganizationId) -> CatalogResult<Organization> {
        self.repo
            .find_organization(id)
            .await?
            .ok_or(CatalogError::OrganizationNotFound)
    }

    /// The creating account is attached to the new organization
    pub async fn create(
        &self,
        creator: AccountId,
        input: CreateOrganizationInput,
    ) -> CatalogResult<Organization> {
        let name = validate_name(&input.name)?;
        let organization = Organization::new(name, input.organization_type);
        self.repo.insert_organization(&organization, creator).await?;

        tracing::info!(
            organization_id = %organization.id,
            organization_type = %organization.organization_type,
            "Organization created"
        );
        self.sender.notify("organization created");
        Ok(organization)
    }

    pub async fn update(
        &self,
        id: OrganizationId,
        input: UpdateOrganizationInput,
    ) -> CatalogResult<Organization> {
        let mut organization = self.get(id).await?;
        if let Some(name) = input.name {
            organization.name = validate_name(&name)?;
        }
        if let Some(status) = input.status {
            organization.status = status;
        }
        organization.updated_at = chrono::Utc::now();
        self.repo.update_organization(&organization).await?;

        tracing::info!(organization_id = %id, "Organization updated");
        self.sender.notify("organization updated");
        Ok(organization)
    }

    pub async fn delete(&self, requester: AccountId, id: OrganizationId) -> CatalogResult<()> {
        self.get(id).await?;
        self.repo.delete_organization(id, requester).await?;

        tracing::info!(organization_id = %id, requester = %requester, "Organization deleted");
        self.sender.notify("organization deleted");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Pairs
    // ------------------------------------------------------------------------

    pub async fn pairs(
        &self,
        kind: PairKind,
        owner: OrganizationId,
    ) -> CatalogResult<Vec<OrganizationPair>> {
        let (owner_type, _) = kind.sides();
        self.get(owner).await?.expect_type(owner_type)?;
        self.repo.list_pairs(kind, owner).await
    }

    pub async fn pair(
        &self,
        kind: PairKind,
        owner: OrganizationId,
        counterpart: OrganizationId,
    ) -> CatalogResult<OrganizationPair> {
        let (owner_type, counterpart_type) = kind.sides();
        self.get(owner).await?.expect_type(owner_type)?;
        self.get(counterpart).await?.expect_type(counterpart_type)?;

        let id = self.repo.insert_pair(kind, owner, counterpart).await?;
        let pair = self
            .repo
            .find_pair(id)
            .await?
            .ok_or(CatalogError::PairNotFound)?;

        tracing::info!(pair_id = %id, kind = ?kind, "Organizations paired");
        self.sender.notify("organizations paired");
        Ok(pair)
    }

    pub async fn unpair(
        &self,
        kind: PairKind,
        owner: OrganizationId,
        counterpart: OrganizationId,
    ) -> CatalogResult<()> {
        if !self.repo.delete_pair(kind, owner, counterpart).await? {
            return Err(CatalogError::PairNotFound);
        }

        tracing::info!(owner = %owner, counterpart = %counterpart, kind = ?kind, "Organizations unpaired");
        self.sender.notify("organizations unpaired");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Integrator assignments
    // ------------------------------------------------------------------------

    pub async fn games(&self, integrator: OrganizationId) -> CatalogResult<Vec<Game>> {
        self.integrator(integrator).await?;
        self.repo.assigned_games(integrator).await
    }

    pub async fn assign_game(&self, integrator: OrganizationId, game: GameId) -> CatalogResult<()> {
        self.integrator(integrator).await?;
        self.repo
            .find_game(game)
            .await?
            .ok_or(CatalogError::GameNotFound)?;
        self.repo.assign_game(integrator, game).await?;

        tracing::info!(integrator = %integrator, game_id = %game, "Game assigned");
        self.sender.notify("game assigned");
        Ok(())
    }

    pub async fn unassign_game(
        &self,
        integrator: OrganizationId,
        game: GameId,
    ) -> CatalogResult<()> {
        if !self.repo.unassign_game(integrator, game).await? {
            return Err(CatalogError::GameNotAssigned);
        }

        tracing::info!(integrator = %integrator, game_id = %game, "Game unassigned");
        self.sender.notify("game unassigned");
        Ok(())
    }

    /// The game must already be assigned to the integrator
    pub async fn assign_wager_set(
        &self,
        integrator: OrganizationId,
        game: GameId,
        wager_set: WagerSetId,
    ) -> CatalogResult<()> {
        self.integrator(integrator).await?;
        let assigned = self.repo.assigned_games(integrator).await?;
        if !assigned.iter().any(|g| g.id == game) {
            return Err(CatalogError::GameNotAssigned);
        }
        self.repo
            .find_wager_set(wager_set)
            .await?
            .ok_or(CatalogError::WagerSetNotFound)?;
        self.repo.assign_wager_set(integrator, game, wager_set).await?;

        tracing::info!(integrator = %integrator, game_id = %game, wager_set_id = %wager_set, "Wager set assigned");
        self.sender.notify("wager set assigned");
        Ok(())
    }

    pub async fn unassign_wager_set(
        &self,
        integrator: OrganizationId,
        game: GameId,
        wager_set: WagerSetId,
    ) -> CatalogResult<()> {
        if !self
            .repo
            .unassign_wager_set(integrator, game, wager_set)
            .await?
        {
            return Err(CatalogError::WagerSetNotFound);
        }

        tracing::info!(integrator = %integrator, game_id = %game, wager_set_id = %wager_set, "Wager set unassigned");
        self.sender.notify("wager set unassigned");
        Ok(())
    }

    async fn integrator(&self, id: OrganizationId) -> CatalogResult<Organization> {
        let organization = self.get(id).await?;
        organization.expect_type(OrganizationType::Integrator)?;
        Ok(organization)
    }
}

fn validate_name(name: &str) -> CatalogResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::validation("name", "must not be empty"));
    }
    Ok(name.to_string())
}
