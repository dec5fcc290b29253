//! Application Layer
//!
//! Use cases over the catalog repositories plus the configuration
//! publisher and lobby link builder.

pub mod config;
pub mod config_sender;
pub mod currencies;
pub mod currency_sets;
pub mod dictionaries;
pub mod games;
pub mod lobby;
pub mod organizations;
pub mod wager_sets;

use crate::domain::repository::{
    CurrencyRepository, CurrencySetRepository, DictionaryRepository, GameRepository,
    OrganizationRepository, WagerSetRepository,
};

// Re-exports
pub use config::LobbyConfig;
pub use config_sender::{ConfigSender, assemble};
pub use currencies::{CurrencyUseCase, MultiplierUseCase};
pub use currency_sets::{CurrencySetInput, CurrencySetUseCase};
pub use dictionaries::DictionaryUseCase;
pub use games::{GameInput, GameUseCase};
pub use lobby::{LobbyUseCase, StartGameInput};
pub use organizations::{CreateOrganizationInput, OrganizationUseCase, UpdateOrganizationInput};
pub use wager_sets::{WagerSetInput, WagerSetUseCase};

/// Everything the catalog stores, behind one handle
pub trait CatalogRepository:
    OrganizationRepository
    + GameRepository
    + WagerSetRepository
    + CurrencyRepository
    + CurrencySetRepository
    + DictionaryRepository
    + Send
    + Sync
    + 'static
{
}

impl<T> CatalogRepository for T where
    T: OrganizationRepository
        + GameRepository
        + WagerSetRepository
        + CurrencyRepository
        + CurrencySetRepository
        + DictionaryRepository
        + Send
        + Sync
        + 'static
{
}
