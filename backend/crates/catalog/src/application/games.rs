//! Game administration

use std::sync::Arc;

use chrono::Utc;
use gateway::Overlord;
use kernel::id::{GameId, OrganizationId, WagerSetId};
use kernel::organization::OrganizationType;
use kernel::pagination::{Page, PageRequest};
use serde::Deserialize;

use crate::application::CatalogRepository;
use crate::application::config_sender::ConfigSender;
use crate::domain::entity::Game;
use crate::error::{CatalogError, CatalogResult};

/// Editable game attributes, shared by create and update
#[derive(Debug, Clone, Deserialize)]
pub struct GameInput {
    /// Owning provider
    pub organization_id: OrganizationId,
    pub name: String,
    #[serde(default)]
    pub jurisdictions: Vec<String>,
    #[serde(default)]
    pub currencies: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub user_locales: Vec<String>,
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub client_url: String,
    pub wager_set_id: WagerSetId,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_statistic_shown: bool,
    #[serde(default)]
    pub is_demo: bool,
    #[serde(default)]
    pub is_freespins: bool,
    #[serde(default)]
    pub online_volatility: bool,
    pub rtp: Option<i32>,
    pub volatility: Option<String>,
    #[serde(default)]
    pub available_rtp: Vec<i32>,
    #[serde(default)]
    pub available_volatility: Vec<String>,
    #[serde(default)]
    pub available_wager_sets: Vec<WagerSetId>,
    #[serde(default)]
    pub gamble_double_up: i32,
}

pub struct GameUseCase<R: CatalogRepository> {
    repo: Arc<R>,
    sender: ConfigSender<R>,
}

impl<R: CatalogRepository> GameUseCase<R> {
    pub fn new(repo: Arc<R>, overlord: Arc<dyn Overlord>) -> Self {
        Self {
            sender: ConfigSender::new(Arc::clone(&repo), overlord),
            repo,
        }
    }

    pub async fn list(&self, request: &PageRequest) -> CatalogResult<Page<Game>> {
        self.repo.list_games(request).await
    }

    pub async fn get(&self, id: GameId) -> CatalogResult<Game> {
        self.repo
            .find_game(id)
            .await?
            .ok_or(CatalogError::GameNotFound)
    }

    pub async fn create(&self, input: GameInput) -> CatalogResult<Game> {
        let now = Utc::now();
        let mut game = Game {
            id: GameId::new(),
            organization_id: input.organization_id,
            name: String::new(),
            jurisdictions: Vec::new(),
            currencies: Vec::new(),
            languages: Vec::new(),
            user_locales: Vec::new(),
            api_url: String::new(),
            client_url: String::new(),
            wager_set_id: input.wager_set_id,
            is_public: false,
            is_statistic_shown: false,
            is_demo: false,
            is_freespins: false,
            online_volatility: false,
            rtp: None,
            volatility: None,
            available_rtp: Vec::new(),
            available_volatility: Vec::new(),
            available_wager_sets: Vec::new(),
            gamble_double_up: 0,
            created_at: now,
            updated_at: now,
        };
        apply(&mut game, input);
        self.check(&mut game).await?;
        self.repo.insert_game(&game).await?;

        tracing::info!(game_id = %game.id, name = %game.name, "Game created");
        self.sender.notify("game created");
        Ok(game)
    }

    pub async fn update(&self, id: GameId, input: GameInput) -> CatalogResult<Game> {
        let mut game = self.get(id).await?;
        apply(&mut game, input);
        game.updated_at = Utc::now();
        self.check(&mut game).await?;
        self.repo.update_game(&game).await?;

        tracing::info!(game_id = %id, "Game updated");
        self.sender.notify("game updated");
        Ok(game)
    }

    pub async fn delete(&self, id: GameId) -> CatalogResult<()> {
        if !self.repo.delete_game(id).await? {
            return Err(CatalogError::GameNotFound);
        }

        tracing::info!(game_id = %id, "Game deleted");
        self.sender.notify("game deleted");
        Ok(())
    }

    /// Field checks first, then the references they point at
    async fn check(&self, game: &mut Game) -> CatalogResult<()> {
        CatalogError::check(game.validate())?;

        let provider = self
            .repo
            .find_organization(game.organization_id)
            .await?
            .ok_or(CatalogError::OrganizationNotFound)?;
        provider.expect_type(OrganizationType::Provider)?;

        if !game.available_wager_sets.contains(&game.wager_set_id) {
            game.available_wager_sets.push(game.wager_set_id);
        }
        game.available_wager_sets.sort();
        game.available_wager_sets.dedup();
        let found = self.repo.find_wager_sets(&game.available_wager_sets).await?;
        if found.len() != game.available_wager_sets.len() {
            return Err(CatalogError::WagerSetNotFound);
        }
        Ok(())
    }
}

fn apply(game: &mut Game, input: GameInput) {
    game.organization_id = input.organization_id;
    game.name = input.name.trim().to_string();
    game.jurisdictions = input.jurisdictions;
    game.currencies = input.currencies.iter().map(|c| c.trim().to_lowercase()).collect();
    game.languages = input.languages;
    game.user_locales = input.user_locales;
    game.api_url = input.api_url;
    game.client_url = input.client_url;
    game.wager_set_id = input.wager_set_id;
    game.is_public = input.is_public;
    game.is_statistic_shown = input.is_statistic_shown;
    game.is_demo = input.is_demo;
    game.is_freespins = input.is_freespins;
    game.online_volatility = input.online_volatility;
    game.rtp = input.rtp;
    game.volatility = input.volatility;
    game.available_rtp = input.available_rtp;
    game.available_volatility = input.available_volatility;
    game.available_wager_sets = input.available_wager_sets;
    game.gamble_double_up = input.gamble_double_up;
}
