//! Currency set administration

use std::collections::BTreeSet;
use std::sync::Arc;

use kernel::error::app_error::FieldError;
use kernel::id::{CurrencySetId, OrganizationId};
use kernel::pagination::{Page, PageRequest};
use serde::Deserialize;

use crate::application::CatalogRepository;
use crate::domain::entity::CurrencySet;
use crate::error::{CatalogError, CatalogResult};

#[derive(Debug, Clone, Deserialize)]
pub struct CurrencySetInput {
    pub organization_id: OrganizationId,
    pub name: String,
    pub currencies: Vec<String>,
}

pub struct CurrencySetUseCase<R: CatalogRepository> {
    repo: Arc<R>,
}

impl<R: CatalogRepository> CurrencySetUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, request: &PageRequest) -> CatalogResult<Page<CurrencySet>> {
        self.repo.list_currency_sets(request).await
    }

    pub async fn get(&self, id: CurrencySetId) -> CatalogResult<CurrencySet> {
        self.repo
            .find_currency_set(id)
            .await?
            .ok_or(CatalogError::CurrencySetNotFound)
    }

    pub async fn create(&self, input: CurrencySetInput) -> CatalogResult<CurrencySet> {
        let set = self.build(CurrencySetId::new(), input).await?;
        self.repo.insert_currency_set(&set).await?;

        tracing::info!(currency_set_id = %set.id, currencies = set.currencies.len(), "Currency set created");
        Ok(set)
    }

    pub async fn update(&self, id: CurrencySetId, input: CurrencySetInput) -> CatalogResult<CurrencySet> {
        let set = self.build(id, input).await?;
        if !self.repo.update_currency_set(&set).await? {
            return Err(CatalogError::CurrencySetNotFound);
        }

        tracing::info!(currency_set_id = %id, "Currency set updated");
        Ok(set)
    }

    pub async fn delete(&self, id: CurrencySetId) -> CatalogResult<()> {
        if !self.repo.delete_currency_set(id).await? {
            return Err(CatalogError::CurrencySetNotFound);
        }
        tracing::info!(currency_set_id = %id, "Currency set deleted");
        Ok(())
    }

    async fn build(&self, id: CurrencySetId, input: CurrencySetInput) -> CatalogResult<CurrencySet> {
        let mut set = CurrencySet {
            id,
            organization_id: input.organization_id,
            name: input.name.trim().to_string(),
            currencies: input.currencies,
        };
        set.normalize()?;

        self.repo
            .find_organization(set.organization_id)
            .await?
            .ok_or(CatalogError::OrganizationNotFound)?;

        let known: BTreeSet<String> = self.repo.currency_titles().await?.into_iter().collect();
        let unknown: Vec<FieldError> = set
            .currencies
            .iter()
            .filter(|c| !known.contains(*c))
            .map(|c| FieldError::new("currencies", format!("unknown currency {}", c)))
            .collect();
        CatalogError::check(unknown)?;
        Ok(set)
    }
}
