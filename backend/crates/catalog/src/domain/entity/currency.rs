//! Currency, Multiplier Entities

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use kernel::error::app_error::AppError;
use kernel::id::OrganizationPairId;
use serde::{Deserialize, Serialize};

use crate::domain::entity::organization::OrganizationPair;
use crate::error::{CatalogError, CatalogResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyType {
    #[default]
    Real,
    /// Play money pegged to a real base currency
    Fake,
}

impl CurrencyType {
    pub const fn code(&self) -> &'static str {
        match self {
            CurrencyType::Real => "real",
            CurrencyType::Fake => "fake",
        }
    }
}

impl fmt::Display for CurrencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "real" => Ok(CurrencyType::Real),
            "fake" => Ok(CurrencyType::Fake),
            other => Err(AppError::bad_request(format!("Unknown currency type: {}", other))),
        }
    }
}

/// Keyed by `title`, stored lowercase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub title: String,
    #[serde(default)]
    pub alias: String,
    #[serde(rename = "type", default)]
    pub currency_type: CurrencyType,
    #[serde(default)]
    pub base_currency: Option<String>,
    #[serde(default = "unit_rate")]
    pub alias_rate: f64,
}

fn unit_rate() -> f64 {
    1.0
}

impl Currency {
    pub fn normalize(&mut self) -> CatalogResult<()> {
        self.title = self.title.trim().to_lowercase();
        self.alias = self.alias.trim().to_lowercase();
        self.base_currency = self
            .base_currency
            .take()
            .map(|b| b.trim().to_lowercase())
            .filter(|b| !b.is_empty());
        if self.title.is_empty() {
            return Err(CatalogError::validation("title", "must not be empty"));
        }
        if self.alias.is_empty() {
            self.alias = self.title.clone();
        }
        if self.alias_rate <= 0.0 {
            return Err(CatalogError::validation("alias_rate", "must be positive"));
        }
        if self.currency_type == CurrencyType::Real {
            self.base_currency = None;
        }
        Ok(())
    }

    /// A fake currency needs an existing, non-fake base
    ///
    /// `base` is the stored currency named by `base_currency`, if any.
    pub fn check_base(&self, base: Option<&Currency>) -> CatalogResult<()> {
        if self.currency_type == CurrencyType::Real {
            return Ok(());
        }
        match (self.base_currency.as_deref(), base) {
            (Some(name), Some(base))
                if base.title == name
                    && base.currency_type == CurrencyType::Real
                    && base.title != self.title =>
            {
                Ok(())
            }
            _ => Err(CatalogError::InvalidBaseCurrency),
        }
    }
}

/// Per-pair multiplier of a currency; key is (pair, title)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyMultiplier {
    pub organization_pair_id: OrganizationPairId,
    pub title: String,
    pub multiplier: i64,
    #[serde(default)]
    pub synonym: String,
}

impl CurrencyMultiplier {
    pub fn normalize(&mut self) -> CatalogResult<()> {
        self.title = self.title.trim().to_lowercase();
        if self.title.is_empty() {
            return Err(CatalogError::validation("title", "must not be empty"));
        }
        if self.multiplier <= 0 {
            return Err(CatalogError::validation("multiplier", "must be positive"));
        }
        Ok(())
    }
}

/// Multiplier joined with its provider/integrator pair
#[derive(Debug, Clone, PartialEq)]
pub struct PairedMultiplier {
    pub pair: OrganizationPair,
    pub multiplier: CurrencyMultiplier,
}

/// Multipliers of one pair, keyed by currency title
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplierGroup {
    pub multipliers: BTreeMap<String, i64>,
    pub synonyms: BTreeMap<String, String>,
}

impl MultiplierGroup {
    pub fn push(&mut self, multiplier: &CurrencyMultiplier) {
        self.multipliers
            .insert(multiplier.title.clone(), multiplier.multiplier);
        self.synonyms
            .insert(multiplier.title.clone(), multiplier.synonym.clone());
    }
}

impl<'a> FromIterator<&'a CurrencyMultiplier> for MultiplierGroup {
    fn from_iter<I: IntoIterator<Item = &'a CurrencyMultiplier>>(iter: I) -> Self {
        let mut group = MultiplierGroup::default();
        for multiplier in iter {
            group.push(multiplier);
        }
        group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn currency(title: &str, currency_type: CurrencyType, base: Option<&str>) -> Currency {
        Currency {
            title: title.into(),
            alias: String::new(),
            currency_type,
            base_currency: base.map(str::to_string),
            alias_rate: 1.0,
        }
    }

    #[test]
    fn test_fake_currency_needs_real_base() {
        let usd = currency("usd", CurrencyType::Real, None);
        let fun = currency("fun", CurrencyType::Fake, Some("usd"));
        assert!(fun.check_base(Some(&usd)).is_ok());
        assert!(matches!(fun.check_base(None), Err(CatalogError::InvalidBaseCurrency)));

        let other_fake = currency("usd", CurrencyType::Fake, Some("eur"));
        assert!(matches!(
            fun.check_base(Some(&other_fake)),
            Err(CatalogError::InvalidBaseCurrency)
        ));

        let no_base = currency("fun", CurrencyType::Fake, None);
        assert!(no_base.check_base(Some(&usd)).is_err());
    }

    #[test]
    fn test_normalize_lowercases_and_defaults_alias() {
        let mut c = currency(" USD ", CurrencyType::Real, Some("eur"));
        c.normalize().unwrap();
        assert_eq!(c.title, "usd");
        assert_eq!(c.alias, "usd");
        assert_eq!(c.base_currency, None);
    }

    #[test]
    fn test_group_by_title() {
        let pair = OrganizationPairId::new();
        let rows = [
            CurrencyMultiplier {
                organization_pair_id: pair,
                title: "usd".into(),
                multiplier: 100,
                synonym: "$".into(),
            },
            CurrencyMultiplier {
                organization_pair_id: pair,
                title: "eur".into(),
                multiplier: 90,
                synonym: String::new(),
            },
        ];
        let group: MultiplierGroup = rows.iter().collect();
        assert_eq!(group.multipliers["usd"], 100);
        assert_eq!(group.synonyms["usd"], "$");
        assert_eq!(group.multipliers.len(), 2);
    }
}
