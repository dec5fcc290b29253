//! Game Entity

use chrono::{DateTime, Utc};
use kernel::error::app_error::FieldError;
use kernel::id::{GameId, OrganizationId, WagerSetId};
use serde::{Deserialize, Serialize};

use crate::domain::entity::wager_set::WagerSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    /// Owning provider
    pub organization_id: OrganizationId,
    /// Globally unique, also the lobby path segment
    pub name: String,
    pub jurisdictions: Vec<String>,
    pub currencies: Vec<String>,
    pub languages: Vec<String>,
    pub user_locales: Vec<String>,
    pub api_url: String,
    pub client_url: String,
    /// Default wager set
    pub wager_set_id: WagerSetId,
    pub is_public: bool,
    pub is_statistic_shown: bool,
    pub is_demo: bool,
    pub is_freespins: bool,
    pub online_volatility: bool,
    pub rtp: Option<i32>,
    pub volatility: Option<String>,
    pub available_rtp: Vec<i32>,
    pub available_volatility: Vec<String>,
    /// Alternate wager sets a launch may pick
    pub available_wager_sets: Vec<WagerSetId>,
    pub gamble_double_up: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    /// Field-level checks that need no storage lookups
    pub fn validate(&self) -> Vec<FieldError> {
        let mut fields = Vec::new();
        if self.name.trim().is_empty() {
            fields.push(FieldError::new("name", "must not be empty"));
        }
        if let Some(rtp) = self.rtp {
            if !self.available_rtp.is_empty() && !self.available_rtp.contains(&rtp) {
                fields.push(FieldError::new("rtp", "must be one of available_rtp"));
            }
        }
        if let Some(volatility) = &self.volatility {
            if !self.available_volatility.is_empty() && !self.available_volatility.contains(volatility) {
                fields.push(FieldError::new("volatility", "must be one of available_volatility"));
            }
        }
        if self.gamble_double_up < 0 {
            fields.push(FieldError::new("gamble_double_up", "must not be negative"));
        }
        fields
    }

    /// Case-insensitive membership in `currencies`
    pub fn supports_currency(&self, currency: &str) -> bool {
        self.currencies.iter().any(|c| c.eq_ignore_ascii_case(currency))
    }
}

/// Public game joined with its default wager set
#[derive(Debug, Clone, PartialEq)]
pub struct PublicGame {
    pub game: Game,
    pub wager_set: WagerSet,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn game(provider: OrganizationId, wager_set_id: WagerSetId, name: &str) -> Game {
        let now = Utc::now();
        Game {
            id: GameId::new(),
            organization_id: provider,
            name: name.to_string(),
            jurisdictions: vec!["mt".into()],
            currencies: vec!["usd".into()],
            languages: vec!["en".into()],
            user_locales: vec!["en-US".into()],
            api_url: String::new(),
            client_url: String::new(),
            wager_set_id,
            is_public: true,
            is_statistic_shown: true,
            is_demo: true,
            is_freespins: false,
            online_volatility: false,
            rtp: None,
            volatility: None,
            available_rtp: Vec::new(),
            available_volatility: Vec::new(),
            available_wager_sets: vec![wager_set_id],
            gamble_double_up: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rtp_must_be_available() {
        let mut game = fixtures::game(OrganizationId::new(), WagerSetId::new(), "book");
        game.available_rtp = vec![94, 96];
        game.rtp = Some(95);
        let fields = game.validate();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "rtp");

        game.rtp = Some(96);
        assert!(game.validate().is_empty());
    }

    #[test]
    fn test_supports_currency_ignores_case() {
        let game = fixtures::game(OrganizationId::new(), WagerSetId::new(), "book");
        assert!(game.supports_currency("USD"));
        assert!(!game.supports_currency("eur"));
    }
}
