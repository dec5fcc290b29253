pub mod config;
pub mod currency;
pub mod currency_set;
pub mod dictionary;
pub mod game;
pub mod organization;
pub mod wager_set;

pub use config::CurrencyGameConfig;
pub use currency::{Currency, CurrencyMultiplier, CurrencyType, MultiplierGroup, PairedMultiplier};
pub use currency_set::CurrencySet;
pub use dictionary::Dictionary;
pub use game::{Game, PublicGame};
pub use organization::{Organization, OrganizationPair, OrganizationStatus, PairKind};
pub use wager_set::WagerSet;
