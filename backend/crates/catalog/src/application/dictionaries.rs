//! Pick-list dictionaries

use std::sync::Arc;

use kernel::organization::OrganizationType;

use crate::application::CatalogRepository;
use crate::domain::entity::Dictionary;
use crate::error::{CatalogError, CatalogResult};

pub struct DictionaryUseCase<R: CatalogRepository> {
    repo: Arc<R>,
}

impl<R: CatalogRepository> DictionaryUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn values(&self, dictionary: Dictionary) -> CatalogResult<Vec<String>> {
        match dictionary {
            Dictionary::Currencies => self.repo.currency_titles().await,
            Dictionary::OrganizationTypes => Ok(OrganizationType::ALL
                .iter()
                .map(|t| t.as_str().to_string())
                .collect()),
            stored => self.repo.dictionary_values(stored).await,
        }
    }

    pub async fn add(&self, dictionary: Dictionary, value: &str) -> CatalogResult<Vec<String>> {
        let value = editable_value(dictionary, value)?;
        let values = self.repo.append_dictionary_value(dictionary, value).await?;

        tracing::info!(dictionary = %dictionary, value, "Dictionary value added");
        Ok(values)
    }

    pub async fn remove(&self, dictionary: Dictionary, value: &str) -> CatalogResult<()> {
        let value = editable_value(dictionary, value)?;
        if !self.repo.remove_dictionary_value(dictionary, value).await? {
            return Err(CatalogError::DictionaryNotFound(format!("{}/{}", dictionary, value)));
        }

        tracing::info!(dictionary = %dictionary, value, "Dictionary value removed");
        Ok(())
    }
}

fn editable_value(dictionary: Dictionary, value: &str) -> CatalogResult<&str> {
    if !dictionary.is_editable() {
        return Err(CatalogError::DictionaryReadOnly(dictionary.to_string()));
    }
    let value = value.trim();
    if value.is_empty() {
        return Err(CatalogError::validation("value", "must not be empty"));
    }
    Ok(value)
}
