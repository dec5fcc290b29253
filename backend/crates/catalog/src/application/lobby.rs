//! Lobby launch links
//!
//! A short link stores the launch parameters on the overlord bus and hands
//! out only the session id; the long form carries everything in the query.

use std::sync::Arc;

use gateway::Overlord;
use kernel::error::app_error::AppError;
use kernel::id::{GameId, WagerSetId};
use serde::Deserialize;
use url::Url;
use url::form_urlencoded::Serializer;
use uuid::Uuid;

use crate::application::config::LobbyConfig;
use crate::domain::entity::Game;
use crate::domain::repository::GameRepository;
use crate::error::{CatalogError, CatalogResult};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartGameInput {
    #[serde(default)]
    pub short_link: bool,
    /// Game name, or its id
    pub game: String,
    #[serde(default)]
    pub integrator: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub jurisdiction: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub user_locale: String,
    pub wager_set_id: Option<WagerSetId>,
    pub rtp: Option<i32>,
    pub volatility: Option<String>,
    pub showcheats: Option<bool>,
    pub low_balance: Option<bool>,
    #[serde(alias = "lobbyurl")]
    pub lobby_url: Option<String>,
}

pub struct LobbyUseCase<R> {
    repo: Arc<R>,
    overlord: Arc<dyn Overlord>,
    config: Arc<LobbyConfig>,
}

impl<R> LobbyUseCase<R>
where
    R: GameRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, overlord: Arc<dyn Overlord>, config: Arc<LobbyConfig>) -> Self {
        Self {
            repo,
            overlord,
            config,
        }
    }

    pub async fn start_game(&self, input: StartGameInput) -> CatalogResult<String> {
        let game = self.find_game(&input.game).await?;
        let host = self.host(&game);

        if !input.short_link {
            return long_link(&host, &game, &input);
        }

        let wager_set_id = validate_short_link(&game, &input)?;
        let session_id = Uuid::new_v4();
        let params = serde_json::json!({
            "game": game.name,
            "game_id": game.id,
            "integrator": input.integrator,
            "user_id": input.user_id,
            "jurisdiction": input.jurisdiction,
            "currency": input.currency.to_lowercase(),
            "user_locale": input.user_locale,
            "wager_set_id": wager_set_id,
            "rtp": input.rtp,
            "volatility": input.volatility,
            "showcheats": input.showcheats,
            "low_balance": input.low_balance,
            "lobbyurl": input.lobby_url,
        });
        self.overlord.save_params(session_id, &params).await?;

        tracing::info!(game = %game.name, session_id = %session_id, "Short lobby link issued");
        let query = Serializer::new(String::new())
            .append_pair("integrator", &input.integrator)
            .append_pair("session_id", &session_id.to_string())
            .finish();
        game_url(&host, &game.name, &query)
    }

    async fn find_game(&self, reference: &str) -> CatalogResult<Game> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(CatalogError::validation("game", "required"));
        }
        let found = match reference.parse::<GameId>() {
            Ok(id) => self.repo.find_game(id).await?,
            Err(_) => self.repo.find_game_by_name(reference).await?,
        };
        found.ok_or(CatalogError::GameNotFound)
    }

    /// Origin of the game's client or api url, unless it is a dev host
    fn host(&self, game: &Game) -> String {
        [game.client_url.as_str(), game.api_url.as_str()]
            .into_iter()
            .find_map(|raw| {
                let url = Url::parse(raw.trim()).ok()?;
                let host = url.host_str()?;
                if self.config.is_dev_host(host) || !url.origin().is_tuple() {
                    return None;
                }
                Some(url.origin().ascii_serialization())
            })
            .unwrap_or_else(|| self.config.default_host.trim_end_matches('/').to_string())
    }
}

/// First failing field wins
fn validate_short_link(game: &Game, input: &StartGameInput) -> CatalogResult<WagerSetId> {
    let wager_set_id = input
        .wager_set_id
        .ok_or_else(|| CatalogError::validation("wager_set_id", "required"))?;
    if !game.available_wager_sets.contains(&wager_set_id) {
        return Err(CatalogError::validation(
            "wager_set_id",
            "is not available for the game",
        ));
    }
    if let Some(rtp) = input.rtp {
        if !game.available_rtp.contains(&rtp) {
            return Err(CatalogError::validation("rtp", "is not available for the game"));
        }
    }
    if let Some(volatility) = &input.volatility {
        if !game.available_volatility.contains(volatility) {
            return Err(CatalogError::validation(
                "volatility",
                "is not available for the game",
            ));
        }
    }
    if !game.supports_currency(&input.currency) {
        return Err(CatalogError::validation("currency", "is not supported by the game"));
    }
    if !game.user_locales.contains(&input.user_locale) {
        return Err(CatalogError::validation(
            "user_locale",
            "is not supported by the game",
        ));
    }
    Ok(wager_set_id)
}

/// `{host}/{name}/?{query}` with the name percent-encoded as one path segment
fn game_url(host: &str, name: &str, query: &str) -> CatalogResult<String> {
    let mut url = Url::parse(host)
        .map_err(|e| AppError::internal(format!("Invalid lobby host {}: {}", host, e)))?;
    url.path_segments_mut()
        .map_err(|_| AppError::internal(format!("Lobby host {} cannot carry a path", host)))?
        .pop_if_empty()
        .push(name)
        .push("");
    url.set_query(Some(query));
    Ok(url.into())
}

fn long_link(host: &str, game: &Game, input: &StartGameInput) -> CatalogResult<String> {
    let mut query = Serializer::new(String::new());
    query
        .append_pair("user_id", &input.user_id)
        .append_pair("jurisdiction", &input.jurisdiction)
        .append_pair("currency", &input.currency)
        .append_pair("user_locale", &input.user_locale)
        .append_pair("integrator", &input.integrator);
    if let Some(showcheats) = input.showcheats {
        query.append_pair("showcheats", &showcheats.to_string());
    }
    if let Some(low_balance) = input.low_balance {
        query.append_pair("low_balance", &low_balance.to_string());
    }
    if let Some(lobby_url) = &input.lobby_url {
        query.append_pair("lobbyurl", lobby_url);
    }
    game_url(host, &game.name, &query.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::game::fixtures;
    use kernel::id::OrganizationId;

    #[test]
    fn test_long_link_optional_params() {
        let game = fixtures::game(OrganizationId::new(), WagerSetId::new(), "book");
        let input = StartGameInput {
            game: "book".into(),
            integrator: "alpha".into(),
            user_id: "u1".into(),
            jurisdiction: "mt".into(),
            currency: "usd".into(),
            user_locale: "en-US".into(),
            low_balance: Some(true),
            lobby_url: Some("https://casino.example/lobby".into()),
            ..Default::default()
        };
        let link = long_link("https://games.example", &game, &input).unwrap();
        assert_eq!(
            link,
            "https://games.example/book/?user_id=u1&jurisdiction=mt&currency=usd&user_locale=en-US\
             &integrator=alpha&low_balance=true&lobbyurl=https%3A%2F%2Fcasino.example%2Flobby"
        );
        assert!(!link.contains("showcheats"));
    }

    #[test]
    fn test_volatility_checked_before_currency() {
        let ws = WagerSetId::new();
        let mut game = fixtures::game(OrganizationId::new(), ws, "book");
        game.available_volatility = vec!["low".into()];
        let input = StartGameInput {
            short_link: true,
            game: "book".into(),
            wager_set_id: Some(ws),
            volatility: Some("high".into()),
            ..Default::default()
        };
        match validate_short_link(&game, &input) {
            Err(CatalogError::Validation(fields)) => assert_eq!(fields[0].field, "volatility"),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_game_name_is_one_encoded_segment() {
        let url = game_url("https://games.example", "Book of Ra/Deluxe?", "integrator=a").unwrap();
        assert_eq!(url, "https://games.example/Book%20of%20Ra%2FDeluxe%3F/?integrator=a");

        let url = game_url("https://games.example/launch", "book", "x=1").unwrap();
        assert_eq!(url, "https://games.example/launch/book/?x=1");
    }

    #[test]
    fn test_unusable_host_is_an_error() {
        assert!(game_url("not a url", "book", "").is_err());
        assert!(game_url("mailto:ops@casino.example", "book", "").is_err());
    }
}
