//! Report Query Facade
//!
//! Every report is fetched from the history service in the requested
//! currency and returned in display units.

use std::sync::Arc;

use gateway::{HistoryClient, HistoryFilter};
use kernel::pagination::{Page, PageRequest};

use crate::domain::report::{
    AggregatedReport, FinancialReport, GamingSessionReport, Grouping, Prettify, SpinReport,
    merge_pfr,
};
use crate::error::{ReportError, ReportResult};

#[derive(Clone)]
pub struct ReportService {
    history: Arc<dyn HistoryClient>,
}

fn page_of(filter: &HistoryFilter) -> PageRequest {
    PageRequest::new(filter.limit, filter.offset)
}

impl ReportService {
    pub fn new(history: Arc<dyn HistoryClient>) -> Self {
        Self { history }
    }

    pub async fn financial(&self, filter: &HistoryFilter) -> ReportResult<FinancialReport> {
        let record = self.history.financial(filter).await?;
        Ok(FinancialReport::from(record).prettify())
    }

    pub async fn spins(&self, filter: &HistoryFilter) -> ReportResult<Page<SpinReport>> {
        let listing = self.history.spins(filter).await?;
        let items = listing
            .items
            .into_iter()
            .map(|s| SpinReport::from(s).prettify())
            .collect();
        Ok(Page::new(items, listing.total, &page_of(filter)))
    }

    pub async fn sessions(&self, filter: &HistoryFilter) -> ReportResult<Page<GamingSessionReport>> {
        let listing = self.history.gaming_sessions(filter).await?;
        let items = listing
            .items
            .into_iter()
            .map(|s| GamingSessionReport::from(s).prettify())
            .collect();
        Ok(Page::new(items, listing.total, &page_of(filter)))
    }

    /// Unfiltered and play-for-real buckets, fetched together and merged
    pub async fn aggregated(
        &self,
        grouping: Grouping,
        filter: &HistoryFilter,
    ) -> ReportResult<Vec<AggregatedReport>> {
        let pfr_filter = filter.pfr();
        let (all, pfr) = match grouping {
            Grouping::Game => tokio::try_join!(
                self.history.aggregated_by_game(filter),
                self.history.aggregated_by_game(&pfr_filter),
            )?,
            Grouping::Country => tokio::try_join!(
                self.history.aggregated_by_country(filter),
                self.history.aggregated_by_country(&pfr_filter),
            )?,
        };
        tracing::debug!(
            grouping = ?grouping,
            buckets = all.len(),
            pfr_buckets = pfr.len(),
            "Merging aggregated report"
        );
        Ok(merge_pfr(all, pfr, grouping).prettify())
    }

    /// Unauthenticated spin lookup
    pub async fn public_spin(
        &self,
        round_id: &str,
        game: Option<&str>,
        currency: Option<&str>,
    ) -> ReportResult<SpinReport> {
        let (game, currency) = public_keys(game, currency)?;
        self.history
            .spin(round_id, &game, &currency)
            .await?
            .map(|s| SpinReport::from(s).prettify())
            .ok_or(ReportError::NotFound("Spin"))
    }

    /// Unauthenticated gaming-session lookup
    pub async fn public_session(
        &self,
        session_token: &str,
        game: Option<&str>,
        currency: Option<&str>,
    ) -> ReportResult<GamingSessionReport> {
        let (game, currency) = public_keys(game, currency)?;
        self.history
            .gaming_session(session_token, &game, &currency)
            .await?
            .map(|s| GamingSessionReport::from(s).prettify())
            .ok_or(ReportError::NotFound("Gaming session"))
    }
}

/// Public lookups need both `game` and `currency`
fn public_keys(game: Option<&str>, currency: Option<&str>) -> ReportResult<(String, String)> {
    let game = game.map(str::trim).filter(|g| !g.is_empty());
    let currency = currency.map(str::trim).filter(|c| !c.is_empty());
    match (game, currency) {
        (Some(game), Some(currency)) => Ok((game.to_string(), currency.to_lowercase())),
        (None, _) => Err(ReportError::validation("game", "required")),
        (_, None) => Err(ReportError::validation("currency", "required")),
    }
}
