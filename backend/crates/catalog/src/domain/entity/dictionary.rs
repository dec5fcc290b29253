//! Pick-list Dictionaries

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dictionary {
    Jurisdictions,
    Languages,
    UserLocales,
    Volatilities,
    /// Titles of the `currencies` table
    Currencies,
    /// Fixed set of organization types
    OrganizationTypes,
}

impl Dictionary {
    pub const fn name(&self) -> &'static str {
        match self {
            Dictionary::Jurisdictions => "jurisdictions",
            Dictionary::Languages => "languages",
            Dictionary::UserLocales => "user_locales",
            Dictionary::Volatilities => "volatilities",
            Dictionary::Currencies => "currencies",
            Dictionary::OrganizationTypes => "organization_types",
        }
    }

    /// Stored in the `dictionaries` table and editable through the API
    pub const fn is_editable(&self) -> bool {
        !matches!(self, Dictionary::Currencies | Dictionary::OrganizationTypes)
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dictionary {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jurisdictions" => Ok(Dictionary::Jurisdictions),
            "languages" => Ok(Dictionary::Languages),
            "user_locales" => Ok(Dictionary::UserLocales),
            "volatilities" => Ok(Dictionary::Volatilities),
            "currencies" => Ok(Dictionary::Currencies),
            "organization_types" => Ok(Dictionary::OrganizationTypes),
            other => Err(CatalogError::DictionaryNotFound(other.to_string())),
        }
    }
}
