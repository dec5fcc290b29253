//! Domain Layer
//!
//! Entities, invariants and repository traits.

pub mod entity;
pub mod repository;

pub use entity::*;
pub use repository::{
    CurrencyRepository, CurrencySetRepository, DictionaryRepository, GameRepository,
    OrganizationRepository, WagerSetRepository,
};
