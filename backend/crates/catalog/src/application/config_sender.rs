//! Configuration distribution
//!
//! Every mutation that can change what a game launch sees calls
//! [`ConfigSender::notify`]. The sender rebuilds the full
//! game/currency snapshot and publishes it on the overlord bus; there are
//! no deltas, so concurrent notifications converge on the latest state.

use std::collections::BTreeMap;
use std::sync::Arc;

use gateway::Overlord;
use gateway::overlord::{MESSAGE_CURRENCY_CONFIG, QUEUE_OVERLORD};
use kernel::error::app_error::AppError;
use kernel::id::{OrganizationId, OrganizationPairId};
use tokio::task::JoinHandle;

use crate::domain::entity::{
    CurrencyGameConfig, MultiplierGroup, OrganizationPair, PairKind, PairedMultiplier, PublicGame,
};
use crate::domain::repository::{CurrencyRepository, GameRepository};
use crate::error::{CatalogError, CatalogResult};

pub struct ConfigSender<R> {
    repo: Arc<R>,
    overlord: Arc<dyn Overlord>,
}

impl<R> Clone for ConfigSender<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            overlord: Arc::clone(&self.overlord),
        }
    }
}

impl<R> ConfigSender<R>
where
    R: GameRepository + CurrencyRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, overlord: Arc<dyn Overlord>) -> Self {
        Self { repo, overlord }
    }

    /// Build and send the snapshot; returns the number of entries sent
    pub async fn publish(&self) -> CatalogResult<usize> {
        let multipliers = self.repo.paired_multipliers().await?;
        let games = self.repo.public_games().await?;
        let configs = assemble(&multipliers, &games)?;

        let payload = serde_json::to_value(&configs).map_err(AppError::from)?;
        self.overlord
            .send(QUEUE_OVERLORD, MESSAGE_CURRENCY_CONFIG, &payload)
            .await?;

        tracing::info!(entries = configs.len(), "Currency config published");
        Ok(configs.len())
    }

    /// Publish in a detached task; failures are only logged
    pub fn notify(&self, reason: &'static str) -> JoinHandle<()> {
        let sender = self.clone();
        tokio::spawn(async move {
            match sender.publish().await {
                Ok(_) => {}
                Err(CatalogError::EmptyConfig) => {
                    tracing::warn!(reason, "Currency config is empty, nothing published");
                }
                Err(e) => {
                    tracing::error!(reason, error = %e, "Currency config publish failed");
                }
            }
        })
    }
}

/// Denormalise multipliers and public games into one entry per
/// (provider/integrator pair, provider game)
///
/// Output is ordered by (integrator, provider, game).
pub fn assemble(
    multipliers: &[PairedMultiplier],
    games: &[PublicGame],
) -> CatalogResult<Vec<CurrencyGameConfig>> {
    let mut games_by_provider: BTreeMap<OrganizationId, Vec<&PublicGame>> = BTreeMap::new();
    for public in games {
        games_by_provider
            .entry(public.game.organization_id)
            .or_default()
            .push(public);
    }

    let mut by_pair: BTreeMap<OrganizationPairId, (&OrganizationPair, MultiplierGroup)> =
        BTreeMap::new();
    for paired in multipliers
        .iter()
        .filter(|m| m.pair.kind == PairKind::ProviderIntegrator)
    {
        by_pair
            .entry(paired.pair.id)
            .or_insert_with(|| (&paired.pair, MultiplierGroup::default()))
            .1
            .push(&paired.multiplier);
    }

    let mut configs = Vec::new();
    for (pair, group) in by_pair.values() {
        let Some(provider_games) = games_by_provider.get(&pair.provider().id) else {
            continue;
        };
        for public in provider_games {
            let game = &public.game;
            configs.push(CurrencyGameConfig {
                integrator: pair.integrator().name.clone(),
                provider: pair.provider().name.clone(),
                game: game.name.clone(),
                game_id: game.id,
                default_wager: public.wager_set.default_wager,
                wager_levels: public.wager_set.wager_levels.clone(),
                multipliers: group.multipliers.clone(),
                synonyms: group.synonyms.clone(),
                available_rtp: game.available_rtp.clone(),
                available_volatility: game.available_volatility.clone(),
                online_volatility: game.online_volatility,
                gamble_double_up: game.gamble_double_up,
            });
        }
    }

    if configs.is_empty() {
        return Err(CatalogError::EmptyConfig);
    }
    configs.sort_by(|a, b| {
        (&a.integrator, &a.provider, &a.game).cmp(&(&b.integrator, &b.provider, &b.game))
    });
    Ok(configs)
}
