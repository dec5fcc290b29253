//! Materialised game/currency configuration

use std::collections::BTreeMap;

use kernel::id::GameId;
use serde::{Deserialize, Serialize};

/// One (integrator, provider, game) entry of the snapshot sent to overlord
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyGameConfig {
    pub integrator: String,
    pub provider: String,
    pub game: String,
    pub game_id: GameId,
    pub default_wager: i64,
    pub wager_levels: Vec<i64>,
    pub multipliers: BTreeMap<String, i64>,
    pub synonyms: BTreeMap<String, String>,
    pub available_rtp: Vec<i32>,
    pub available_volatility: Vec<String>,
    pub online_volatility: bool,
    pub gamble_double_up: i32,
}
