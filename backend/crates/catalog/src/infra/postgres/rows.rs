//! Row types for sqlx mapping

use chrono::{DateTime, Utc};
use kernel::error::app_error::AppError;
use kernel::id::{CurrencySetId, GameId, OrganizationId, OrganizationPairId, WagerSetId};
use kernel::organization::OrganizationRef;

use crate::domain::entity::{
    Currency, CurrencyMultiplier, CurrencySet, Game, Organization, OrganizationPair, PairKind,
    PairedMultiplier, WagerSet,
};
use crate::error::CatalogResult;

pub(super) const ORGANIZATION_COLUMNS: &str =
    "id, name, type, status, api_key, created_at, updated_at";

pub(super) const GAME_COLUMNS: &str = r#"
    id, organization_id, name, jurisdictions, currencies, languages, user_locales,
    api_url, client_url, wager_set_id, is_public, is_statistic_shown, is_demo,
    is_freespins, online_volatility, rtp, volatility, available_rtp,
    available_volatility, available_wager_sets, gamble_double_up, created_at, updated_at
"#;

pub(super) const WAGER_SET_COLUMNS: &str =
    "id, organization_id, name, wager_levels, default_wager, created_at, updated_at";

pub(super) const CURRENCY_COLUMNS: &str = "title, alias, type, base_currency, alias_rate";

pub(super) const MULTIPLIER_COLUMNS: &str = "organization_pair_id, title, multiplier, synonym";

pub(super) const CURRENCY_SET_COLUMNS: &str = "id, organization_id, name, currencies";

#[derive(sqlx::FromRow)]
pub(super) struct OrganizationRow {
    id: OrganizationId,
    name: String,
    #[sqlx(rename = "type")]
    organization_type: String,
    status: String,
    api_key: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrganizationRow {
    pub(super) fn into_organization(self) -> CatalogResult<Organization> {
        Ok(Organization {
            id: self.id,
            name: self.name,
            organization_type: self.organization_type.parse()?,
            status: self.status.parse()?,
            api_key: self.api_key,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct PairRow {
    id: OrganizationPairId,
    kind: String,
    owner_id: OrganizationId,
    owner_name: String,
    owner_type: String,
    counterpart_id: OrganizationId,
    counterpart_name: String,
    counterpart_type: String,
}

impl PairRow {
    pub(super) fn into_pair(self) -> CatalogResult<OrganizationPair> {
        let kind = match self.kind.as_str() {
            "provider_integrator" => PairKind::ProviderIntegrator,
            "integrator_operator" => PairKind::IntegratorOperator,
            other => {
                return Err(AppError::internal(format!("Unknown pair kind: {}", other)).into());
            }
        };
        Ok(OrganizationPair {
            id: self.id,
            kind,
            owner: OrganizationRef {
                id: self.owner_id,
                name: self.owner_name,
                organization_type: self.owner_type.parse()?,
            },
            counterpart: OrganizationRef {
                id: self.counterpart_id,
                name: self.counterpart_name,
                organization_type: self.counterpart_type.parse()?,
            },
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct GameRow {
    id: GameId,
    organization_id: OrganizationId,
    name: String,
    jurisdictions: Vec<String>,
    currencies: Vec<String>,
    languages: Vec<String>,
    user_locales: Vec<String>,
    api_url: String,
    client_url: String,
    wager_set_id: WagerSetId,
    is_public: bool,
    is_statistic_shown: bool,
    is_demo: bool,
    is_freespins: bool,
    online_volatility: bool,
    rtp: Option<i32>,
    volatility: Option<String>,
    available_rtp: Vec<i32>,
    available_volatility: Vec<String>,
    available_wager_sets: Vec<WagerSetId>,
    gamble_double_up: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<GameRow> for Game {
    fn from(row: GameRow) -> Self {
        Game {
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            jurisdictions: row.jurisdictions,
            currencies: row.currencies,
            languages: row.languages,
            user_locales: row.user_locales,
            api_url: row.api_url,
            client_url: row.client_url,
            wager_set_id: row.wager_set_id,
            is_public: row.is_public,
            is_statistic_shown: row.is_statistic_shown,
            is_demo: row.is_demo,
            is_freespins: row.is_freespins,
            online_volatility: row.online_volatility,
            rtp: row.rtp,
            volatility: row.volatility,
            available_rtp: row.available_rtp,
            available_volatility: row.available_volatility,
            available_wager_sets: row.available_wager_sets,
            gamble_double_up: row.gamble_double_up,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct WagerSetRow {
    id: WagerSetId,
    organization_id: OrganizationId,
    name: String,
    wager_levels: Vec<i64>,
    default_wager: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WagerSetRow> for WagerSet {
    fn from(row: WagerSetRow) -> Self {
        WagerSet {
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            wager_levels: row.wager_levels,
            default_wager: row.default_wager,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct CurrencyRow {
    title: String,
    alias: String,
    #[sqlx(rename = "type")]
    currency_type: String,
    base_currency: Option<String>,
    alias_rate: f64,
}

impl CurrencyRow {
    pub(super) fn into_currency(self) -> CatalogResult<Currency> {
        Ok(Currency {
            title: self.title,
            alias: self.alias,
            currency_type: self.currency_type.parse()?,
            base_currency: self.base_currency,
            alias_rate: self.alias_rate,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct MultiplierRow {
    organization_pair_id: OrganizationPairId,
    title: String,
    multiplier: i64,
    synonym: String,
}

impl From<MultiplierRow> for CurrencyMultiplier {
    fn from(row: MultiplierRow) -> Self {
        CurrencyMultiplier {
            organization_pair_id: row.organization_pair_id,
            title: row.title,
            multiplier: row.multiplier,
            synonym: row.synonym,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct PairedMultiplierRow {
    #[sqlx(flatten)]
    pair: PairRow,
    #[sqlx(flatten)]
    multiplier: MultiplierRow,
}

impl PairedMultiplierRow {
    pub(super) fn into_paired(self) -> CatalogResult<PairedMultiplier> {
        Ok(PairedMultiplier {
            pair: self.pair.into_pair()?,
            multiplier: self.multiplier.into(),
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct CurrencySetRow {
    id: CurrencySetId,
    organization_id: OrganizationId,
    name: String,
    currencies: Vec<String>,
}

impl From<CurrencySetRow> for CurrencySet {
    fn from(row: CurrencySetRow) -> Self {
        CurrencySet {
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            currencies: row.currencies,
        }
    }
}
