//! Repository Traits
//!
//! Method names carry the entity so one store can implement every trait
//! without call-site ambiguity.

use kernel::id::{AccountId, CurrencySetId, GameId, OrganizationId, OrganizationPairId, WagerSetId};
use kernel::pagination::{Page, PageRequest};

use crate::domain::entity::{
    Currency, CurrencyMultiplier, CurrencySet, Dictionary, Game, Organization, OrganizationPair,
    PairKind, PairedMultiplier, PublicGame, WagerSet,
};
use crate::error::CatalogResult;

/// Organizations, pair tables and integrator assignments
#[trait_variant::make(OrganizationRepository: Send)]
pub trait LocalOrganizationRepository {
    /// Insert and attach `creator` to the new organization
    async fn insert_organization(
        &self,
        organization: &Organization,
        creator: AccountId,
    ) -> CatalogResult<()>;

    async fn update_organization(&self, organization: &Organization) -> CatalogResult<()>;

    async fn find_organization(&self, id: OrganizationId) -> CatalogResult<Option<Organization>>;

    async fn list_organizations(&self, request: &PageRequest) -> CatalogResult<Page<Organization>>;

    /// Transactional delete
    ///
    /// Refused with `OrganizationInUse` when more than one account is
    /// attached or the only attached account is not `requester`. Otherwise
    /// cascades to the organization's roles, account links and pairs, then
    /// soft-deletes the row.
    async fn delete_organization(&self, id: OrganizationId, requester: AccountId)
    -> CatalogResult<()>;

    async fn list_pairs(
        &self,
        kind: PairKind,
        owner: OrganizationId,
    ) -> CatalogResult<Vec<OrganizationPair>>;

    async fn find_pair(&self, id: OrganizationPairId) -> CatalogResult<Option<OrganizationPair>>;

    async fn find_pair_by_sides(
        &self,
        kind: PairKind,
        owner: OrganizationId,
        counterpart: OrganizationId,
    ) -> CatalogResult<Option<OrganizationPair>>;

    /// `PairExists` on a duplicate
    async fn insert_pair(
        &self,
        kind: PairKind,
        owner: OrganizationId,
        counterpart: OrganizationId,
    ) -> CatalogResult<OrganizationPairId>;

    async fn delete_pair(
        &self,
        kind: PairKind,
        owner: OrganizationId,
        counterpart: OrganizationId,
    ) -> CatalogResult<bool>;

    async fn assigned_games(&self, integrator: OrganizationId) -> CatalogResult<Vec<Game>>;

    async fn assign_game(&self, integrator: OrganizationId, game: GameId) -> CatalogResult<()>;

    /// Also drops the integrator's wager-set assignments for the game
    async fn unassign_game(&self, integrator: OrganizationId, game: GameId) -> CatalogResult<bool>;

    async fn assign_wager_set(
        &self,
        integrator: OrganizationId,
        game: GameId,
        wager_set: WagerSetId,
    ) -> CatalogResult<()>;

    async fn unassign_wager_set(
        &self,
        integrator: OrganizationId,
        game: GameId,
        wager_set: WagerSetId,
    ) -> CatalogResult<bool>;
}

#[trait_variant::make(GameRepository: Send)]
pub trait LocalGameRepository {
    /// `AlreadyExists("Game")` on a duplicate name
    async fn insert_game(&self, game: &Game) -> CatalogResult<()>;

    async fn update_game(&self, game: &Game) -> CatalogResult<()>;

    async fn find_game(&self, id: GameId) -> CatalogResult<Option<Game>>;

    async fn find_game_by_name(&self, name: &str) -> CatalogResult<Option<Game>>;

    async fn list_games(&self, request: &PageRequest) -> CatalogResult<Page<Game>>;

    /// Soft delete
    async fn delete_game(&self, id: GameId) -> CatalogResult<bool>;

    /// Every live public game with its default wager set
    async fn public_games(&self) -> CatalogResult<Vec<PublicGame>>;
}

#[trait_variant::make(WagerSetRepository: Send)]
pub trait LocalWagerSetRepository {
    async fn insert_wager_set(&self, wager_set: &WagerSet) -> CatalogResult<()>;

    async fn update_wager_set(&self, wager_set: &WagerSet) -> CatalogResult<()>;

    async fn find_wager_set(&self, id: WagerSetId) -> CatalogResult<Option<WagerSet>>;

    async fn find_wager_sets(&self, ids: &[WagerSetId]) -> CatalogResult<Vec<WagerSet>>;

    async fn list_wager_sets(&self, request: &PageRequest) -> CatalogResult<Page<WagerSet>>;

    async fn delete_wager_set(&self, id: WagerSetId) -> CatalogResult<bool>;
}

/// Currencies and per-pair multipliers
#[trait_variant::make(CurrencyRepository: Send)]
pub trait LocalCurrencyRepository {
    async fn insert_currency(&self, currency: &Currency) -> CatalogResult<()>;

    async fn update_currency(&self, currency: &Currency) -> CatalogResult<bool>;

    async fn find_currency(&self, title: &str) -> CatalogResult<Option<Currency>>;

    async fn list_currencies(&self, request: &PageRequest) -> CatalogResult<Page<Currency>>;

    async fn delete_currency(&self, title: &str) -> CatalogResult<bool>;

    async fn currency_titles(&self) -> CatalogResult<Vec<String>>;

    async fn count_multipliers(&self, title: &str) -> CatalogResult<i64>;

    /// Currencies whose `base_currency` is `title`
    async fn count_dependents(&self, title: &str) -> CatalogResult<i64>;

    async fn insert_multiplier(&self, multiplier: &CurrencyMultiplier) -> CatalogResult<()>;

    async fn update_multiplier(&self, multiplier: &CurrencyMultiplier) -> CatalogResult<bool>;

    async fn find_multiplier(
        &self,
        pair: OrganizationPairId,
        title: &str,
    ) -> CatalogResult<Option<CurrencyMultiplier>>;

    async fn list_multipliers(
        &self,
        request: &PageRequest,
    ) -> CatalogResult<Page<CurrencyMultiplier>>;

    async fn delete_multiplier(&self, pair: OrganizationPairId, title: &str)
    -> CatalogResult<bool>;

    async fn pair_multipliers(
        &self,
        pair: OrganizationPairId,
    ) -> CatalogResult<Vec<CurrencyMultiplier>>;

    /// Insert or overwrite in one transaction
    async fn upsert_multipliers(&self, multipliers: &[CurrencyMultiplier]) -> CatalogResult<()>;

    /// Every multiplier with its provider/integrator pair
    async fn paired_multipliers(&self) -> CatalogResult<Vec<PairedMultiplier>>;
}

#[trait_variant::make(CurrencySetRepository: Send)]
pub trait LocalCurrencySetRepository {
    async fn insert_currency_set(&self, set: &CurrencySet) -> CatalogResult<()>;

    async fn update_currency_set(&self, set: &CurrencySet) -> CatalogResult<bool>;

    async fn find_currency_set(&self, id: CurrencySetId) -> CatalogResult<Option<CurrencySet>>;

    async fn list_currency_sets(&self, request: &PageRequest) -> CatalogResult<Page<CurrencySet>>;

    async fn delete_currency_set(&self, id: CurrencySetId) -> CatalogResult<bool>;
}

/// `dictionaries(name text primary key, entries text[])`
#[trait_variant::make(DictionaryRepository: Send)]
pub trait LocalDictionaryRepository {
    async fn dictionary_values(&self, dictionary: Dictionary) -> CatalogResult<Vec<String>>;

    /// `array_append` unless already present
    async fn append_dictionary_value(
        &self,
        dictionary: Dictionary,
        value: &str,
    ) -> CatalogResult<Vec<String>>;

    /// `array_remove`; `false` if the value was absent
    async fn remove_dictionary_value(&self, dictionary: Dictionary, value: &str)
    -> CatalogResult<bool>;
}
