//! Currencies, multipliers and exchange rates

use std::collections::BTreeSet;
use std::sync::Arc;

use gateway::{ExchangeClient, ExchangeRate, Overlord};
use kernel::error::app_error::AppError;
use kernel::id::{OrganizationId, OrganizationPairId};
use kernel::pagination::{Page, PageRequest};
use serde::Deserialize;

use crate::application::CatalogRepository;
use crate::application::config_sender::ConfigSender;
use crate::domain::entity::{
    Currency, CurrencyMultiplier, CurrencyType, MultiplierGroup, OrganizationPair, PairKind,
};
use crate::error::{CatalogError, CatalogResult};

// ============================================================================
// Currencies
// ============================================================================

pub struct CurrencyUseCase<R: CatalogRepository> {
    repo: Arc<R>,
    sender: ConfigSender<R>,
    exchange: Arc<dyn ExchangeClient>,
}

impl<R: CatalogRepository> CurrencyUseCase<R> {
    pub fn new(repo: Arc<R>, overlord: Arc<dyn Overlord>, exchange: Arc<dyn ExchangeClient>) -> Self {
        Self {
            sender: ConfigSender::new(Arc::clone(&repo), overlord),
            repo,
            exchange,
        }
    }

    pub async fn list(&self, request: &PageRequest) -> CatalogResult<Page<Currency>> {
        self.repo.list_currencies(request).await
    }

    pub async fn get(&self, title: &str) -> CatalogResult<Currency> {
        self.repo
            .find_currency(&title.trim().to_lowercase())
            .await?
            .ok_or(CatalogError::CurrencyNotFound)
    }

    pub async fn create(&self, mut currency: Currency) -> CatalogResult<Currency> {
        currency.normalize()?;
        self.check_base(&currency).await?;
        self.repo.insert_currency(&currency).await?;

        tracing::info!(title = %currency.title, currency_type = %currency.currency_type, "Currency created");
        self.sender.notify("currency created");
        Ok(currency)
    }

    /// A currency other currencies are pegged to stays real
    pub async fn update(&self, mut currency: Currency) -> CatalogResult<Currency> {
        currency.normalize()?;
        self.check_base(&currency).await?;
        if currency.currency_type == CurrencyType::Fake
            && self.repo.count_dependents(&currency.title).await? > 0
        {
            return Err(CatalogError::CurrencyIsBase);
        }
        if !self.repo.update_currency(&currency).await? {
            return Err(CatalogError::CurrencyNotFound);
        }

        tracing::info!(title = %currency.title, "Currency updated");
        self.sender.notify("currency updated");
        Ok(currency)
    }

    /// Refused while any pair still has a multiplier for the currency or a
    /// fake currency is pegged to it
    pub async fn delete(&self, title: &str) -> CatalogResult<()> {
        let title = title.trim().to_lowercase();
        if self.repo.count_multipliers(&title).await? > 0 {
            return Err(CatalogError::CurrencyInUse);
        }
        if self.repo.count_dependents(&title).await? > 0 {
            return Err(CatalogError::CurrencyIsBase);
        }
        if !self.repo.delete_currency(&title).await? {
            return Err(CatalogError::CurrencyNotFound);
        }

        tracing::info!(title = %title, "Currency deleted");
        self.sender.notify("currency deleted");
        Ok(())
    }

    async fn check_base(&self, currency: &Currency) -> CatalogResult<()> {
        let base = match currency.base_currency.as_deref() {
            Some(title) => self.repo.find_currency(title).await?,
            None => None,
        };
        currency.check_base(base.as_ref())
    }

    // ------------------------------------------------------------------------
    // Exchange
    // ------------------------------------------------------------------------

    pub async fn rate(&self, alias: &str) -> CatalogResult<ExchangeRate> {
        self.exchange
            .rate(&alias.to_lowercase())
            .await?
            .ok_or(CatalogError::RateNotFound)
    }

    pub async fn update_rate(&self, alias: &str, rate: f64) -> CatalogResult<ExchangeRate> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(CatalogError::validation("rate", "must be positive"));
        }
        let updated = self.exchange.update_rate(&alias.to_lowercase(), rate).await?;

        tracing::info!(currency = %updated.currency, rate = updated.rate, "Exchange rate updated");
        Ok(updated)
    }

    pub async fn rate_history(
        &self,
        alias: &str,
        request: &PageRequest,
    ) -> CatalogResult<Page<ExchangeRate>> {
        let listing = self
            .exchange
            .history(&alias.to_lowercase(), request.limit, request.offset)
            .await?;
        Ok(Page::new(listing.items, listing.total, request))
    }
}

// ============================================================================
// Multipliers
// ============================================================================

/// One line of the multiplier CSV
#[derive(Debug, Clone, Deserialize)]
struct MultiplierRow {
    title: String,
    multiplier: i64,
    #[serde(default)]
    synonym: String,
}

pub struct MultiplierUseCase<R: CatalogRepository> {
    repo: Arc<R>,
    sender: ConfigSender<R>,
}

impl<R: CatalogRepository> MultiplierUseCase<R> {
    pub fn new(repo: Arc<R>, overlord: Arc<dyn Overlord>) -> Self {
        Self {
            sender: ConfigSender::new(Arc::clone(&repo), overlord),
            repo,
        }
    }

    /// The sender behind this use case, for callers that await the publish
    pub fn sender(&self) -> &ConfigSender<R> {
        &self.sender
    }

    pub async fn list(&self, request: &PageRequest) -> CatalogResult<Page<CurrencyMultiplier>> {
        self.repo.list_multipliers(request).await
    }

    pub async fn create(&self, mut multiplier: CurrencyMultiplier) -> CatalogResult<CurrencyMultiplier> {
        multiplier.normalize()?;
        self.pair(multiplier.organization_pair_id).await?;
        self.repo
            .find_currency(&multiplier.title)
            .await?
            .ok_or(CatalogError::CurrencyNotFound)?;
        self.repo.insert_multiplier(&multiplier).await?;

        tracing::info!(pair_id = %multiplier.organization_pair_id, title = %multiplier.title, "Multiplier created");
        self.sender.notify("multiplier created");
        Ok(multiplier)
    }

    pub async fn update(&self, mut multiplier: CurrencyMultiplier) -> CatalogResult<CurrencyMultiplier> {
        multiplier.normalize()?;
        if !self.repo.update_multiplier(&multiplier).await? {
            return Err(CatalogError::MultiplierNotFound);
        }

        tracing::info!(
            pair_id = %multiplier.organization_pair_id,
            title = %multiplier.title,
            multiplier = multiplier.multiplier,
            "Multiplier updated"
        );
        self.sender.notify("multiplier updated");
        Ok(multiplier)
    }

    pub async fn delete(&self, pair: OrganizationPairId, title: &str) -> CatalogResult<()> {
        let title = title.trim().to_lowercase();
        if !self.repo.delete_multiplier(pair, &title).await? {
            return Err(CatalogError::MultiplierNotFound);
        }

        tracing::info!(pair_id = %pair, title = %title, "Multiplier deleted");
        self.sender.notify("multiplier deleted");
        Ok(())
    }

    pub async fn group(&self, pair: OrganizationPairId) -> CatalogResult<MultiplierGroup> {
        self.pair(pair).await?;
        let rows = self.repo.pair_multipliers(pair).await?;
        Ok(rows.iter().collect())
    }

    /// Group of the pair between `provider` and `integrator`
    pub async fn search(
        &self,
        provider: OrganizationId,
        integrator: OrganizationId,
    ) -> CatalogResult<MultiplierGroup> {
        let pair = self
            .repo
            .find_pair_by_sides(PairKind::ProviderIntegrator, provider, integrator)
            .await?
            .ok_or(CatalogError::PairNotFound)?;
        let rows = self.repo.pair_multipliers(pair.id).await?;
        Ok(rows.iter().collect())
    }

    /// `title,multiplier,synonym` with a header row
    pub async fn download(&self, pair: OrganizationPairId) -> CatalogResult<String> {
        self.pair(pair).await?;
        let rows = self.repo.pair_multipliers(pair).await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["title", "multiplier", "synonym"])?;
        for row in &rows {
            let multiplier = row.multiplier.to_string();
            writer.write_record([row.title.as_str(), multiplier.as_str(), row.synonym.as_str()])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| AppError::internal(e.to_string()).into())
    }

    /// Insert or overwrite every row of the CSV for one pair
    ///
    /// Rows naming an unknown currency fail the whole upload.
    pub async fn upload(&self, pair: OrganizationPairId, body: &str) -> CatalogResult<usize> {
        self.pair(pair).await?;
        let known: BTreeSet<String> = self.repo.currency_titles().await?.into_iter().collect();

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());
        let mut multipliers = Vec::new();
        for row in reader.deserialize::<MultiplierRow>() {
            let row = row?;
            let mut multiplier = CurrencyMultiplier {
                organization_pair_id: pair,
                title: row.title,
                multiplier: row.multiplier,
                synonym: row.synonym,
            };
            multiplier.normalize()?;
            if !known.contains(&multiplier.title) {
                return Err(CatalogError::validation(
                    "title",
                    format!("unknown currency {}", multiplier.title),
                ));
            }
            multipliers.push(multiplier);
        }
        if multipliers.is_empty() {
            return Err(CatalogError::validation("file", "no multiplier rows"));
        }
        self.repo.upsert_multipliers(&multipliers).await?;

        tracing::info!(pair_id = %pair, rows = multipliers.len(), "Multipliers uploaded");
        self.sender.notify("multipliers uploaded");
        Ok(multipliers.len())
    }

    /// Multipliers only hang off provider/integrator pairs
    async fn pair(&self, id: OrganizationPairId) -> CatalogResult<OrganizationPair> {
        let pair = self
            .repo
            .find_pair(id)
            .await?
            .ok_or(CatalogError::PairNotFound)?;
        if pair.kind != PairKind::ProviderIntegrator {
            return Err(CatalogError::PairNotFound);
        }
        Ok(pair)
    }
}
