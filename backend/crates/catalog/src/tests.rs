#[cfg(test)]
mod support {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;
    use gateway::exchange::ExchangeRate;
    use gateway::history::Listing;
    use gateway::{ExchangeClient, GatewayResult, RecordingOverlord};
    use kernel::id::{
        AccountId, CurrencySetId, GameId, OrganizationId, OrganizationPairId, WagerSetId,
    };
    use kernel::organization::OrganizationType;
    use kernel::pagination::{Page, PageRequest, paginate_slice};

    use crate::application::LobbyConfig;
    use crate::domain::entity::{
        Currency, CurrencyMultiplier, CurrencySet, CurrencyType, Dictionary, Game, Organization,
        OrganizationPair, PairKind, PairedMultiplier, PublicGame, WagerSet,
    };
    use crate::domain::repository::{
        CurrencyRepository, CurrencySetRepository, DictionaryRepository, GameRepository,
        OrganizationRepository, WagerSetRepository,
    };
    use crate::error::{CatalogError, CatalogResult};

    #[derive(Default)]
    struct Tables {
        organizations: BTreeMap<OrganizationId, Organization>,
        account_organizations: Vec<(AccountId, OrganizationId)>,
        pairs: Vec<(OrganizationPairId, PairKind, OrganizationId, OrganizationId)>,
        integrator_games: Vec<(OrganizationId, GameId)>,
        integrator_wager_sets: Vec<(OrganizationId, GameId, WagerSetId)>,
        games: BTreeMap<GameId, Game>,
        wager_sets: BTreeMap<WagerSetId, WagerSet>,
        currencies: BTreeMap<String, Currency>,
        multipliers: BTreeMap<(OrganizationPairId, String), CurrencyMultiplier>,
        currency_sets: BTreeMap<CurrencySetId, CurrencySet>,
        dictionaries: HashMap<&'static str, Vec<String>>,
    }

    impl Tables {
        fn pair(&self, id: OrganizationPairId) -> Option<OrganizationPair> {
            let (_, kind, owner, counterpart) = self.pairs.iter().find(|p| p.0 == id)?;
            Some(OrganizationPair {
                id,
                kind: *kind,
                owner: self.organizations.get(owner)?.to_ref(),
                counterpart: self.organizations.get(counterpart)?.to_ref(),
            })
        }
    }

    /// In-memory catalog store
    #[derive(Clone, Default)]
    pub struct MemoryCatalog {
        tables: Arc<Mutex<Tables>>,
    }

    impl MemoryCatalog {
        pub fn attach(&self, account: AccountId, organization: OrganizationId) {
            self.tables
                .lock()
                .unwrap()
                .account_organizations
                .push((account, organization));
        }
    }

    impl OrganizationRepository for MemoryCatalog {
        async fn insert_organization(
            &self,
            organization: &Organization,
            creator: AccountId,
        ) -> CatalogResult<()> {
            let mut t = self.tables.lock().unwrap();
            let taken = t.organizations.values().any(|o| {
                o.name == organization.name
                    && o.organization_type == organization.organization_type
            });
            if taken {
                return Err(CatalogError::AlreadyExists("Organization"));
            }
            t.organizations.insert(organization.id, organization.clone());
            t.account_organizations.push((creator, organization.id));
            Ok(())
        }

        async fn update_organization(&self, organization: &Organization) -> CatalogResult<()> {
            let mut t = self.tables.lock().unwrap();
            t.organizations.insert(organization.id, organization.clone());
            Ok(())
        }

        async fn find_organization(
            &self,
            id: OrganizationId,
        ) -> CatalogResult<Option<Organization>> {
            Ok(self.tables.lock().unwrap().organizations.get(&id).cloned())
        }

        async fn list_organizations(
            &self,
            request: &PageRequest,
        ) -> CatalogResult<Page<Organization>> {
            let t = self.tables.lock().unwrap();
            let all: Vec<Organization> = t.organizations.values().cloned().collect();
            Ok(paginate_slice(&all, request))
        }

        async fn delete_organization(
            &self,
            id: OrganizationId,
            requester: AccountId,
        ) -> CatalogResult<()> {
            let mut t = self.tables.lock().unwrap();
            let attached: Vec<AccountId> = t
                .account_organizations
                .iter()
                .filter(|(_, org)| *org == id)
                .map(|(account, _)| *account)
                .collect();
            Organization::ensure_deletable(&attached, requester)?;

            t.account_organizations.retain(|(_, org)| *org != id);
            t.pairs.retain(|(_, _, owner, counterpart)| *owner != id && *counterpart != id);
            t.integrator_games.retain(|(integrator, _)| *integrator != id);
            t.integrator_wager_sets.retain(|(integrator, _, _)| *integrator != id);
            t.organizations
                .remove(&id)
                .map(|_| ())
                .ok_or(CatalogError::OrganizationNotFound)
        }

        async fn list_pairs(
            &self,
            kind: PairKind,
            owner: OrganizationId,
        ) -> CatalogResult<Vec<OrganizationPair>> {
            let t = self.tables.lock().unwrap();
            Ok(t.pairs
                .iter()
                .filter(|p| p.1 == kind && p.2 == owner)
                .filter_map(|p| t.pair(p.0))
                .collect())
        }

        async fn find_pair(&self, id: OrganizationPairId) -> CatalogResult<Option<OrganizationPair>> {
            Ok(self.tables.lock().unwrap().pair(id))
        }

        async fn find_pair_by_sides(
            &self,
            kind: PairKind,
            owner: OrganizationId,
            counterpart: OrganizationId,
        ) -> CatalogResult<Option<OrganizationPair>> {
            let t = self.tables.lock().unwrap();
            Ok(t.pairs
                .iter()
                .find(|p| p.1 == kind && p.2 == owner && p.3 == counterpart)
                .and_then(|p| t.pair(p.0)))
        }

        async fn insert_pair(
            &self,
            kind: PairKind,
            owner: OrganizationId,
            counterpart: OrganizationId,
        ) -> CatalogResult<OrganizationPairId> {
            let mut t = self.tables.lock().unwrap();
            if t.pairs
                .iter()
                .any(|p| p.1 == kind && p.2 == owner && p.3 == counterpart)
            {
                return Err(CatalogError::PairExists);
            }
            let id = OrganizationPairId::new();
            t.pairs.push((id, kind, owner, counterpart));
            Ok(id)
        }

        async fn delete_pair(
            &self,
            kind: PairKind,
            owner: OrganizationId,
            counterpart: OrganizationId,
        ) -> CatalogResult<bool> {
            let mut t = self.tables.lock().unwrap();
            let before = t.pairs.len();
            t.pairs
                .retain(|p| !(p.1 == kind && p.2 == owner && p.3 == counterpart));
            Ok(t.pairs.len() != before)
        }

        async fn assigned_games(&self, integrator: OrganizationId) -> CatalogResult<Vec<Game>> {
            let t = self.tables.lock().unwrap();
            Ok(t.integrator_games
                .iter()
                .filter(|(i, _)| *i == integrator)
                .filter_map(|(_, g)| t.games.get(g).cloned())
                .collect())
        }

        async fn assign_game(&self, integrator: OrganizationId, game: GameId) -> CatalogResult<()> {
            let mut t = self.tables.lock().unwrap();
            if !t.integrator_games.contains(&(integrator, game)) {
                t.integrator_games.push((integrator, game));
            }
            Ok(())
        }

        async fn unassign_game(&self, integrator: OrganizationId, game: GameId) -> CatalogResult<bool> {
            let mut t = self.tables.lock().unwrap();
            let before = t.integrator_games.len();
            t.integrator_games.retain(|link| *link != (integrator, game));
            t.integrator_wager_sets
                .retain(|(i, g, _)| !(*i == integrator && *g == game));
            Ok(t.integrator_games.len() != before)
        }

        async fn assign_wager_set(
            &self,
            integrator: OrganizationId,
            game: GameId,
            wager_set: WagerSetId,
        ) -> CatalogResult<()> {
            let mut t = self.tables.lock().unwrap();
            let link = (integrator, game, wager_set);
            if !t.integrator_wager_sets.contains(&link) {
                t.integrator_wager_sets.push(link);
            }
            Ok(())
        }

        async fn unassign_wager_set(
            &self,
            integrator: OrganizationId,
            game: GameId,
            wager_set: WagerSetId,
        ) -> CatalogResult<bool> {
            let mut t = self.tables.lock().unwrap();
            let before = t.integrator_wager_sets.len();
            t.integrator_wager_sets
                .retain(|link| *link != (integrator, game, wager_set));
            Ok(t.integrator_wager_sets.len() != before)
        }
    }

    impl GameRepository for MemoryCatalog {
        async fn insert_game(&self, game: &Game) -> CatalogResult<()> {
            let mut t = self.tables.lock().unwrap();
            if t.games.values().any(|g| g.name == game.name) {
                return Err(CatalogError::AlreadyExists("Game"));
            }
            t.games.insert(game.id, game.clone());
            Ok(())
        }

        async fn update_game(&self, game: &Game) -> CatalogResult<()> {
            self.tables.lock().unwrap().games.insert(game.id, game.clone());
            Ok(())
        }

        async fn find_game(&self, id: GameId) -> CatalogResult<Option<Game>> {
            Ok(self.tables.lock().unwrap().games.get(&id).cloned())
        }

        async fn find_game_by_name(&self, name: &str) -> CatalogResult<Option<Game>> {
            let t = self.tables.lock().unwrap();
            Ok(t.games.values().find(|g| g.name == name).cloned())
        }

        async fn list_games(&self, request: &PageRequest) -> CatalogResult<Page<Game>> {
            let t = self.tables.lock().unwrap();
            let all: Vec<Game> = t.games.values().cloned().collect();
            Ok(paginate_slice(&all, request))
        }

        async fn delete_game(&self, id: GameId) -> CatalogResult<bool> {
            let mut t = self.tables.lock().unwrap();
            t.integrator_games.retain(|(_, g)| *g != id);
            t.integrator_wager_sets.retain(|(_, g, _)| *g != id);
            Ok(t.games.remove(&id).is_some())
        }

        async fn public_games(&self) -> CatalogResult<Vec<PublicGame>> {
            let t = self.tables.lock().unwrap();
            Ok(t.games
                .values()
                .filter(|g| g.is_public)
                .filter_map(|g| {
                    let wager_set = t.wager_sets.get(&g.wager_set_id)?.clone();
                    Some(PublicGame {
                        game: g.clone(),
                        wager_set,
                    })
                })
                .collect())
        }
    }

    impl WagerSetRepository for MemoryCatalog {
        async fn insert_wager_set(&self, wager_set: &WagerSet) -> CatalogResult<()> {
            let mut t = self.tables.lock().unwrap();
            t.wager_sets.insert(wager_set.id, wager_set.clone());
            Ok(())
        }

        async fn update_wager_set(&self, wager_set: &WagerSet) -> CatalogResult<()> {
            self.insert_wager_set(wager_set).await
        }

        async fn find_wager_set(&self, id: WagerSetId) -> CatalogResult<Option<WagerSet>> {
            Ok(self.tables.lock().unwrap().wager_sets.get(&id).cloned())
        }

        async fn find_wager_sets(&self, ids: &[WagerSetId]) -> CatalogResult<Vec<WagerSet>> {
            let t = self.tables.lock().unwrap();
            Ok(ids
                .iter()
                .filter_map(|id| t.wager_sets.get(id).cloned())
                .collect())
        }

        async fn list_wager_sets(&self, request: &PageRequest) -> CatalogResult<Page<WagerSet>> {
            let t = self.tables.lock().unwrap();
            let all: Vec<WagerSet> = t.wager_sets.values().cloned().collect();
            Ok(paginate_slice(&all, request))
        }

        async fn delete_wager_set(&self, id: WagerSetId) -> CatalogResult<bool> {
            Ok(self.tables.lock().unwrap().wager_sets.remove(&id).is_some())
        }
    }

    impl CurrencyRepository for MemoryCatalog {
        async fn insert_currency(&self, currency: &Currency) -> CatalogResult<()> {
            let mut t = self.tables.lock().unwrap();
            if t.currencies.contains_key(&currency.title) {
                return Err(CatalogError::AlreadyExists("Currency"));
            }
            t.currencies.insert(currency.title.clone(), currency.clone());
            Ok(())
        }

        async fn update_currency(&self, currency: &Currency) -> CatalogResult<bool> {
            let mut t = self.tables.lock().unwrap();
            match t.currencies.get_mut(&currency.title) {
                Some(stored) => {
                    *stored = currency.clone();
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn find_currency(&self, title: &str) -> CatalogResult<Option<Currency>> {
            Ok(self.tables.lock().unwrap().currencies.get(title).cloned())
        }

        async fn list_currencies(&self, request: &PageRequest) -> CatalogResult<Page<Currency>> {
            let t = self.tables.lock().unwrap();
            let all: Vec<Currency> = t.currencies.values().cloned().collect();
            Ok(paginate_slice(&all, request))
        }

        async fn delete_currency(&self, title: &str) -> CatalogResult<bool> {
            Ok(self.tables.lock().unwrap().currencies.remove(title).is_some())
        }

        async fn currency_titles(&self) -> CatalogResult<Vec<String>> {
            Ok(self.tables.lock().unwrap().currencies.keys().cloned().collect())
        }

        async fn count_multipliers(&self, title: &str) -> CatalogResult<i64> {
            let t = self.tables.lock().unwrap();
            Ok(t.multipliers.keys().filter(|(_, key)| key == title).count() as i64)
        }

        async fn count_dependents(&self, title: &str) -> CatalogResult<i64> {
            let t = self.tables.lock().unwrap();
            Ok(t.currencies
                .values()
                .filter(|c| c.base_currency.as_deref() == Some(title))
                .count() as i64)
        }

        async fn insert_multiplier(&self, multiplier: &CurrencyMultiplier) -> CatalogResult<()> {
            let mut t = self.tables.lock().unwrap();
            let key = (multiplier.organization_pair_id, multiplier.title.clone());
            if t.multipliers.contains_key(&key) {
                return Err(CatalogError::AlreadyExists("Currency multiplier"));
            }
            t.multipliers.insert(key, multiplier.clone());
            Ok(())
        }

        async fn update_multiplier(&self, multiplier: &CurrencyMultiplier) -> CatalogResult<bool> {
            let mut t = self.tables.lock().unwrap();
            let key = (multiplier.organization_pair_id, multiplier.title.clone());
            match t.multipliers.get_mut(&key) {
                Some(stored) => {
                    *stored = multiplier.clone();
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn find_multiplier(
            &self,
            pair: OrganizationPairId,
            title: &str,
        ) -> CatalogResult<Option<CurrencyMultiplier>> {
            let t = self.tables.lock().unwrap();
            Ok(t.multipliers.get(&(pair, title.to_string())).cloned())
        }

        async fn list_multipliers(
            &self,
            request: &PageRequest,
        ) -> CatalogResult<Page<CurrencyMultiplier>> {
            let t = self.tables.lock().unwrap();
            let all: Vec<CurrencyMultiplier> = t.multipliers.values().cloned().collect();
            Ok(paginate_slice(&all, request))
        }

        async fn delete_multiplier(&self, pair: OrganizationPairId, title: &str) -> CatalogResult<bool> {
            let mut t = self.tables.lock().unwrap();
            Ok(t.multipliers.remove(&(pair, title.to_string())).is_some())
        }

        async fn pair_multipliers(
            &self,
            pair: OrganizationPairId,
        ) -> CatalogResult<Vec<CurrencyMultiplier>> {
            let t = self.tables.lock().unwrap();
            Ok(t.multipliers
                .values()
                .filter(|m| m.organization_pair_id == pair)
                .cloned()
                .collect())
        }

        async fn upsert_multipliers(&self, multipliers: &[CurrencyMultiplier]) -> CatalogResult<()> {
            let mut t = self.tables.lock().unwrap();
            for m in multipliers {
                t.multipliers
                    .insert((m.organization_pair_id, m.title.clone()), m.clone());
            }
            Ok(())
        }

        async fn paired_multipliers(&self) -> CatalogResult<Vec<PairedMultiplier>> {
            let t = self.tables.lock().unwrap();
            Ok(t.multipliers
                .values()
                .filter_map(|m| {
                    let pair = t.pair(m.organization_pair_id)?;
                    (pair.kind == PairKind::ProviderIntegrator).then(|| PairedMultiplier {
                        pair,
                        multiplier: m.clone(),
                    })
                })
                .collect())
        }
    }

    impl CurrencySetRepository for MemoryCatalog {
        async fn insert_currency_set(&self, set: &CurrencySet) -> CatalogResult<()> {
            self.tables.lock().unwrap().currency_sets.insert(set.id, set.clone());
            Ok(())
        }

        async fn update_currency_set(&self, set: &CurrencySet) -> CatalogResult<bool> {
            let mut t = self.tables.lock().unwrap();
            Ok(t.currency_sets.insert(set.id, set.clone()).is_some())
        }

        async fn find_currency_set(&self, id: CurrencySetId) -> CatalogResult<Option<CurrencySet>> {
            Ok(self.tables.lock().unwrap().currency_sets.get(&id).cloned())
        }

        async fn list_currency_sets(&self, request: &PageRequest) -> CatalogResult<Page<CurrencySet>> {
            let t = self.tables.lock().unwrap();
            let all: Vec<CurrencySet> = t.currency_sets.values().cloned().collect();
            Ok(paginate_slice(&all, request))
        }

        async fn delete_currency_set(&self, id: CurrencySetId) -> CatalogResult<bool> {
            Ok(self.tables.lock().unwrap().currency_sets.remove(&id).is_some())
        }
    }

    impl DictionaryRepository for MemoryCatalog {
        async fn dictionary_values(&self, dictionary: Dictionary) -> CatalogResult<Vec<String>> {
            let t = self.tables.lock().unwrap();
            Ok(t.dictionaries
                .get(dictionary.name())
                .cloned()
                .unwrap_or_default())
        }

        async fn append_dictionary_value(
            &self,
            dictionary: Dictionary,
            value: &str,
        ) -> CatalogResult<Vec<String>> {
            let mut t = self.tables.lock().unwrap();
            let entries = t.dictionaries.entry(dictionary.name()).or_default();
            if !entries.iter().any(|v| v == value) {
                entries.push(value.to_string());
            }
            Ok(entries.clone())
        }

        async fn remove_dictionary_value(
            &self,
            dictionary: Dictionary,
            value: &str,
        ) -> CatalogResult<bool> {
            let mut t = self.tables.lock().unwrap();
            let Some(entries) = t.dictionaries.get_mut(dictionary.name()) else {
                return Ok(false);
            };
            let before = entries.len();
            entries.retain(|v| v != value);
            Ok(entries.len() != before)
        }
    }

    /// Fixed rates, updates are echoed back
    pub struct StaticExchange;

    #[async_trait]
    impl ExchangeClient for StaticExchange {
        async fn rate(&self, currency: &str) -> GatewayResult<Option<ExchangeRate>> {
            Ok((currency == "eur").then(|| rate(currency, 1.1)))
        }

        async fn update_rate(&self, currency: &str, value: f64) -> GatewayResult<ExchangeRate> {
            Ok(rate(currency, value))
        }

        async fn history(
            &self,
            currency: &str,
            limit: i64,
            offset: i64,
        ) -> GatewayResult<Listing<ExchangeRate>> {
            let all: Vec<ExchangeRate> = (0..5).map(|i| rate(currency, 1.0 + i as f64)).collect();
            let items = all
                .iter()
                .skip(offset.max(0) as usize)
                .take(limit.max(0) as usize)
                .cloned()
                .collect();
            Ok(Listing { items, total: all.len() as i64 })
        }
    }

    fn rate(currency: &str, value: f64) -> ExchangeRate {
        ExchangeRate {
            currency: currency.to_string(),
            base: "usd".to_string(),
            rate: value,
            updated_at: Utc::now(),
        }
    }

    /// Provider P, integrator I paired, wager set W1 and public game G
    pub struct Fixture {
        pub repo: Arc<MemoryCatalog>,
        pub overlord: Arc<RecordingOverlord>,
        pub lobby: Arc<LobbyConfig>,
        pub admin: AccountId,
        pub provider: Organization,
        pub integrator: Organization,
        pub pair: OrganizationPairId,
        pub wager_set: WagerSet,
        pub game: Game,
    }

    impl Fixture {
        pub async fn new() -> Self {
            let repo = Arc::new(MemoryCatalog::default());
            let admin = AccountId::new();

            let provider = Organization::new("P", OrganizationType::Provider);
            let integrator = Organization::new("I", OrganizationType::Integrator);
            repo.insert_organization(&provider, admin).await.unwrap();
            repo.insert_organization(&integrator, admin).await.unwrap();
            let pair = repo
                .insert_pair(PairKind::ProviderIntegrator, provider.id, integrator.id)
                .await
                .unwrap();

            let wager_set = WagerSet::new(provider.id, "W1", vec![100, 200, 500], 200).unwrap();
            repo.insert_wager_set(&wager_set).await.unwrap();

            let mut game =
                crate::domain::entity::game::fixtures::game(provider.id, wager_set.id, "G");
            game.available_rtp = vec![94, 96];
            game.client_url = "https://games.example.net/launch/index.html".to_string();
            repo.insert_game(&game).await.unwrap();

            repo.insert_currency(&Currency {
                title: "usd".into(),
                alias: "usd".into(),
                currency_type: CurrencyType::Real,
                base_currency: None,
                alias_rate: 1.0,
            })
            .await
            .unwrap();
            repo.insert_multiplier(&CurrencyMultiplier {
                organization_pair_id: pair,
                title: "usd".into(),
                multiplier: 100,
                synonym: "$".into(),
            })
            .await
            .unwrap();

            Self {
                repo,
                overlord: Arc::new(RecordingOverlord::new()),
                lobby: Arc::new(LobbyConfig::default()),
                admin,
                provider,
                integrator,
                pair,
                wager_set,
                game,
            }
        }

        pub fn overlord(&self) -> Arc<dyn gateway::Overlord> {
            self.overlord.clone()
        }

        /// Wait for spawned config publishes to land
        pub async fn sent_after_notify(&self, expected: usize) -> Vec<gateway::overlord::SentMessage> {
            for _ in 0..100 {
                let sent = self.overlord.sent().await;
                if sent.len() >= expected {
                    return sent;
                }
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
            self.overlord.sent().await
        }
    }
}

#[cfg(test)]
mod use_case_tests {
    use std::sync::Arc;

    use gateway::overlord::{MESSAGE_CURRENCY_CONFIG, QUEUE_OVERLORD};
    use kernel::id::{AccountId, WagerSetId};
    use kernel::organization::OrganizationType;
    use kernel::pagination::PageRequest;

    use super::support::{Fixture, StaticExchange};
    use crate::application::{
        CreateOrganizationInput, CurrencySetInput, CurrencySetUseCase, CurrencyUseCase,
        DictionaryUseCase, LobbyUseCase, MultiplierUseCase, OrganizationUseCase, StartGameInput,
        WagerSetInput, WagerSetUseCase,
    };
    use crate::domain::entity::{Currency, CurrencyMultiplier, CurrencyType, Dictionary, PairKind};
    use crate::error::CatalogError;

    fn field_of(err: &CatalogError) -> Option<&str> {
        match err {
            CatalogError::Validation(fields) => fields.first().map(|f| f.field.as_str()),
            _ => None,
        }
    }

    fn currencies(fx: &Fixture) -> CurrencyUseCase<super::support::MemoryCatalog> {
        CurrencyUseCase::new(fx.repo.clone(), fx.overlord(), Arc::new(StaticExchange))
    }

    // ------------------------------------------------------------------
    // Config distribution
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_multiplier_update_publishes_one_snapshot() {
        let fx = Fixture::new().await;
        let multipliers = MultiplierUseCase::new(fx.repo.clone(), fx.overlord());

        multipliers
            .update(CurrencyMultiplier {
                organization_pair_id: fx.pair,
                title: "USD".into(),
                multiplier: 200,
                synonym: "$".into(),
            })
            .await
            .unwrap();

        let sent = fx.sent_after_notify(1).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].queue, QUEUE_OVERLORD);
        assert_eq!(sent[0].message_type, MESSAGE_CURRENCY_CONFIG);

        let entries = sent[0].payload.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry["integrator"], "I");
        assert_eq!(entry["provider"], "P");
        assert_eq!(entry["game"], "G");
        assert_eq!(entry["multipliers"]["usd"], 200);
        assert_eq!(entry["synonyms"]["usd"], "$");
        assert_eq!(entry["default_wager"], 200);
        assert_eq!(entry["wager_levels"], serde_json::json!([100, 200, 500]));
    }

    #[tokio::test]
    async fn test_update_of_missing_multiplier_sends_nothing() {
        let fx = Fixture::new().await;
        let multipliers = MultiplierUseCase::new(fx.repo.clone(), fx.overlord());

        let err = multipliers
            .update(CurrencyMultiplier {
                organization_pair_id: fx.pair,
                title: "eur".into(),
                multiplier: 90,
                synonym: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::MultiplierNotFound));

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(fx.overlord.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_publish_reports_entry_count() {
        let fx = Fixture::new().await;
        let multipliers = MultiplierUseCase::new(fx.repo.clone(), fx.overlord());
        assert_eq!(multipliers.sender().publish().await.unwrap(), 1);
    }

    // ------------------------------------------------------------------
    // Lobby
    // ------------------------------------------------------------------

    fn start(fx: &Fixture) -> StartGameInput {
        StartGameInput {
            short_link: true,
            game: "G".into(),
            user_id: "u-1".into(),
            jurisdiction: "mt".into(),
            currency: "USD".into(),
            user_locale: "en-US".into(),
            wager_set_id: Some(fx.wager_set.id),
            ..StartGameInput::default()
        }
    }

    #[tokio::test]
    async fn test_short_link_rejects_unavailable_wager_set() {
        let fx = Fixture::new().await;
        let lobby = LobbyUseCase::new(fx.repo.clone(), fx.overlord(), fx.lobby.clone());

        let mut input = start(&fx);
        input.wager_set_id = Some(WagerSetId::new());
        let err = lobby.start_game(input).await.unwrap_err();
        assert_eq!(field_of(&err), Some("wager_set_id"));

        let mut input = start(&fx);
        input.wager_set_id = None;
        let err = lobby.start_game(input).await.unwrap_err();
        assert_eq!(field_of(&err), Some("wager_set_id"));
    }

    #[tokio::test]
    async fn test_short_link_rejects_unavailable_rtp() {
        let fx = Fixture::new().await;
        let lobby = LobbyUseCase::new(fx.repo.clone(), fx.overlord(), fx.lobby.clone());

        let mut input = start(&fx);
        input.rtp = Some(95);
        let err = lobby.start_game(input).await.unwrap_err();
        assert_eq!(field_of(&err), Some("rtp"));
        assert!(fx.overlord.saved_params().await.is_empty());
    }

    #[tokio::test]
    async fn test_short_link_saves_params_under_session() {
        let fx = Fixture::new().await;
        let lobby = LobbyUseCase::new(fx.repo.clone(), fx.overlord(), fx.lobby.clone());

        let mut input = start(&fx);
        input.rtp = Some(96);
        let url = lobby.start_game(input).await.unwrap();

        let prefix = "https://games.example.net/G/?integrator=&session_id=";
        assert!(url.starts_with(prefix), "{url}");
        let session: uuid::Uuid = url[prefix.len()..].parse().unwrap();

        let saved = fx.overlord.saved_params().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, session);
        assert_eq!(saved[0].1["currency"], "usd");
        assert_eq!(saved[0].1["rtp"], 96);
    }

    #[tokio::test]
    async fn test_dev_host_falls_back_to_default() {
        let fx = Fixture::new().await;
        let mut game = fx.game.clone();
        game.client_url = "http://localhost:3000/".into();
        game.api_url = String::new();
        crate::domain::repository::GameRepository::update_game(fx.repo.as_ref(), &game)
            .await
            .unwrap();

        let lobby = LobbyUseCase::new(fx.repo.clone(), fx.overlord(), fx.lobby.clone());
        let url = lobby.start_game(start(&fx)).await.unwrap();
        assert!(url.starts_with("https://lobby.example.com/G/?"), "{url}");
    }

    #[tokio::test]
    async fn test_unknown_game_is_not_found() {
        let fx = Fixture::new().await;
        let lobby = LobbyUseCase::new(fx.repo.clone(), fx.overlord(), fx.lobby.clone());
        let mut input = start(&fx);
        input.game = "missing".into();
        assert!(matches!(
            lobby.start_game(input).await,
            Err(CatalogError::GameNotFound)
        ));
    }

    // ------------------------------------------------------------------
    // Organizations and pairs
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_pair_requires_matching_types() {
        let fx = Fixture::new().await;
        let orgs = OrganizationUseCase::new(fx.repo.clone(), fx.overlord());

        let err = orgs
            .pair(PairKind::ProviderIntegrator, fx.integrator.id, fx.provider.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::WrongOrganizationType(OrganizationType::Provider)
        ));

        let err = orgs
            .pair(PairKind::ProviderIntegrator, fx.provider.id, fx.integrator.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::PairExists));
    }

    #[tokio::test]
    async fn test_operator_pairing_and_listing() {
        let fx = Fixture::new().await;
        let orgs = OrganizationUseCase::new(fx.repo.clone(), fx.overlord());

        let operator = orgs
            .create(
                fx.admin,
                CreateOrganizationInput {
                    name: "O".into(),
                    organization_type: OrganizationType::Operator,
                },
            )
            .await
            .unwrap();
        let pair = orgs
            .pair(PairKind::IntegratorOperator, fx.integrator.id, operator.id)
            .await
            .unwrap();
        assert_eq!(pair.owner.id, fx.integrator.id);
        assert_eq!(pair.counterpart.id, operator.id);

        let listed = orgs
            .pairs(PairKind::IntegratorOperator, fx.integrator.id)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);

        orgs.unpair(PairKind::IntegratorOperator, fx.integrator.id, operator.id)
            .await
            .unwrap();
        assert!(matches!(
            orgs.unpair(PairKind::IntegratorOperator, fx.integrator.id, operator.id)
                .await,
            Err(CatalogError::PairNotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_refused_while_other_accounts_attached() {
        let fx = Fixture::new().await;
        let orgs = OrganizationUseCase::new(fx.repo.clone(), fx.overlord());
        let me = AccountId::new();

        let org = orgs
            .create(
                me,
                CreateOrganizationInput {
                    name: "Solo".into(),
                    organization_type: OrganizationType::Operator,
                },
            )
            .await
            .unwrap();
        fx.repo.attach(AccountId::new(), org.id);
        assert!(matches!(
            orgs.delete(me, org.id).await,
            Err(CatalogError::OrganizationInUse(_))
        ));

        let own = orgs
            .create(
                me,
                CreateOrganizationInput {
                    name: "Mine".into(),
                    organization_type: OrganizationType::Operator,
                },
            )
            .await
            .unwrap();
        orgs.delete(me, own.id).await.unwrap();
        assert!(matches!(
            orgs.get(own.id).await,
            Err(CatalogError::OrganizationNotFound)
        ));
    }

    #[tokio::test]
    async fn test_wager_set_needs_assigned_game() {
        let fx = Fixture::new().await;
        let orgs = OrganizationUseCase::new(fx.repo.clone(), fx.overlord());

        let err = orgs
            .assign_wager_set(fx.integrator.id, fx.game.id, fx.wager_set.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::GameNotAssigned));

        orgs.assign_game(fx.integrator.id, fx.game.id).await.unwrap();
        orgs.assign_wager_set(fx.integrator.id, fx.game.id, fx.wager_set.id)
            .await
            .unwrap();
        let games = orgs.games(fx.integrator.id).await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].name, "G");

        orgs.unassign_game(fx.integrator.id, fx.game.id).await.unwrap();
        assert!(matches!(
            orgs.unassign_wager_set(fx.integrator.id, fx.game.id, fx.wager_set.id)
                .await,
            Err(CatalogError::WagerSetNotFound)
        ));
    }

    // ------------------------------------------------------------------
    // Currencies and multipliers
    // ------------------------------------------------------------------

    fn fake(title: &str, base: Option<&str>) -> Currency {
        Currency {
            title: title.into(),
            alias: String::new(),
            currency_type: CurrencyType::Fake,
            base_currency: base.map(str::to_string),
            alias_rate: 1.0,
        }
    }

    #[tokio::test]
    async fn test_fake_currency_requires_existing_base() {
        let fx = Fixture::new().await;
        let use_case = currencies(&fx);

        let err = use_case.create(fake("fun", Some("gbp"))).await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidBaseCurrency));

        let created = use_case.create(fake("FUN", Some("USD"))).await.unwrap();
        assert_eq!(created.title, "fun");
        assert_eq!(created.base_currency.as_deref(), Some("usd"));
    }

    #[tokio::test]
    async fn test_currency_in_use_cannot_be_deleted() {
        let fx = Fixture::new().await;
        let use_case = currencies(&fx);
        assert!(matches!(
            use_case.delete("usd").await,
            Err(CatalogError::CurrencyInUse)
        ));
    }

    fn real(title: &str) -> Currency {
        Currency {
            currency_type: CurrencyType::Real,
            ..fake(title, None)
        }
    }

    #[tokio::test]
    async fn test_base_currency_cannot_turn_fake() {
        let fx = Fixture::new().await;
        let use_case = currencies(&fx);
        use_case.create(real("eur")).await.unwrap();
        use_case.create(fake("fun", Some("eur"))).await.unwrap();

        assert!(matches!(
            use_case.update(fake("eur", Some("usd"))).await,
            Err(CatalogError::CurrencyIsBase)
        ));
        assert_eq!(
            use_case.get("eur").await.unwrap().currency_type,
            CurrencyType::Real
        );

        // without dependents the switch goes through
        use_case.create(real("gbp")).await.unwrap();
        let switched = use_case.update(fake("gbp", Some("usd"))).await.unwrap();
        assert_eq!(switched.currency_type, CurrencyType::Fake);
    }

    #[tokio::test]
    async fn test_base_currency_cannot_be_deleted() {
        let fx = Fixture::new().await;
        let use_case = currencies(&fx);
        use_case.create(real("gbp")).await.unwrap();
        use_case.create(fake("toy", Some("gbp"))).await.unwrap();

        assert!(matches!(
            use_case.delete("gbp").await,
            Err(CatalogError::CurrencyIsBase)
        ));
        assert!(use_case.get("gbp").await.is_ok());

        use_case.delete("toy").await.unwrap();
        use_case.delete("gbp").await.unwrap();
        assert!(matches!(
            use_case.get("gbp").await,
            Err(CatalogError::CurrencyNotFound)
        ));
    }

    #[tokio::test]
    async fn test_rate_rejects_non_positive_values() {
        let fx = Fixture::new().await;
        let use_case = currencies(&fx);
        assert!(use_case.update_rate("eur", 0.0).await.is_err());
        assert!(use_case.update_rate("eur", f64::NAN).await.is_err());
        assert_eq!(use_case.update_rate("eur", 1.2).await.unwrap().rate, 1.2);
        assert!(matches!(
            use_case.rate("gbp").await,
            Err(CatalogError::RateNotFound)
        ));

        let page = use_case
            .rate_history("eur", &PageRequest::new(2, 1))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 5);
    }

    #[tokio::test]
    async fn test_upload_rejects_unknown_currency() {
        let fx = Fixture::new().await;
        let multipliers = MultiplierUseCase::new(fx.repo.clone(), fx.overlord());

        let err = multipliers
            .upload(fx.pair, "title,multiplier,synonym\nusd,300,$\nxyz,10,\n")
            .await
            .unwrap_err();
        assert_eq!(field_of(&err), Some("title"));
        assert_eq!(multipliers.group(fx.pair).await.unwrap().multipliers["usd"], 100);

        let err = multipliers
            .upload(fx.pair, "title,multiplier,synonym\n")
            .await
            .unwrap_err();
        assert_eq!(field_of(&err), Some("file"));
    }

    #[tokio::test]
    async fn test_upload_overwrites_and_download_lists_rows() {
        let fx = Fixture::new().await;
        let multipliers = MultiplierUseCase::new(fx.repo.clone(), fx.overlord());

        let rows = multipliers
            .upload(fx.pair, "title,multiplier,synonym\n USD , 300 , $\n")
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let group = multipliers
            .search(fx.provider.id, fx.integrator.id)
            .await
            .unwrap();
        assert_eq!(group.multipliers["usd"], 300);

        let csv = multipliers.download(fx.pair).await.unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("title,multiplier,synonym"));
        assert_eq!(lines.next(), Some("usd,300,$"));
    }

    #[tokio::test]
    async fn test_multiplier_needs_known_currency() {
        let fx = Fixture::new().await;
        let multipliers = MultiplierUseCase::new(fx.repo.clone(), fx.overlord());
        let err = multipliers
            .create(CurrencyMultiplier {
                organization_pair_id: fx.pair,
                title: "xyz".into(),
                multiplier: 10,
                synonym: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::CurrencyNotFound));
    }

    // ------------------------------------------------------------------
    // Wager sets, currency sets, dictionaries
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_wager_set_rules_enforced_on_create() {
        let fx = Fixture::new().await;
        let wager_sets = WagerSetUseCase::new(fx.repo.clone(), fx.overlord());

        let err = wager_sets
            .create(WagerSetInput {
                organization_id: fx.provider.id,
                name: "W2".into(),
                wager_levels: vec![100, 200],
                default_wager: 300,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::DefaultWagerOutOfList));

        let created = wager_sets
            .create(WagerSetInput {
                organization_id: fx.provider.id,
                name: "W2".into(),
                wager_levels: vec![300, 100, 300],
                default_wager: 300,
            })
            .await
            .unwrap();
        assert_eq!(created.wager_levels, vec![100, 300]);
    }

    #[tokio::test]
    async fn test_currency_set_reports_unknown_currencies() {
        let fx = Fixture::new().await;
        let sets = CurrencySetUseCase::new(fx.repo.clone());
        let err = sets
            .create(CurrencySetInput {
                organization_id: fx.integrator.id,
                name: "main".into(),
                currencies: vec!["usd".into(), "eur".into()],
            })
            .await
            .unwrap_err();
        assert_eq!(field_of(&err), Some("currencies"));

        let set = sets
            .create(CurrencySetInput {
                organization_id: fx.integrator.id,
                name: "main".into(),
                currencies: vec!["USD".into(), "usd".into()],
            })
            .await
            .unwrap();
        assert_eq!(set.currencies, vec!["usd".to_string()]);
    }

    #[tokio::test]
    async fn test_dictionaries() {
        let fx = Fixture::new().await;
        let dictionaries = DictionaryUseCase::new(fx.repo.clone());

        assert_eq!(
            dictionaries.values(Dictionary::Currencies).await.unwrap(),
            vec!["usd".to_string()]
        );
        assert_eq!(
            dictionaries
                .values(Dictionary::OrganizationTypes)
                .await
                .unwrap()
                .len(),
            3
        );
        assert!(matches!(
            dictionaries.add(Dictionary::Currencies, "eur").await,
            Err(CatalogError::DictionaryReadOnly(_))
        ));

        let values = dictionaries.add(Dictionary::Languages, "de").await.unwrap();
        assert_eq!(values, vec!["de".to_string()]);
        dictionaries.remove(Dictionary::Languages, "de").await.unwrap();
        assert!(matches!(
            dictionaries.remove(Dictionary::Languages, "de").await,
            Err(CatalogError::DictionaryNotFound(_))
        ));
    }
}
