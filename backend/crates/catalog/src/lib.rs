//! Catalog Backend Module
//!
//! Everything the platform sells and how it is wired together:
//! organizations and their pairings, games, wager sets, currencies,
//! multipliers, currency sets and pick-list dictionaries. Changes are
//! pushed downstream as a full configuration snapshot by
//! [`application::config_sender::ConfigSender`]. Lobby launch URLs are
//! composed in [`application::lobby`].
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, invariants, repository traits
//! - `application/` - Use cases, config distribution, lobby
//! - `infra/` - PostgreSQL implementation
//! - `presentation/` - HTTP handlers, DTOs, router

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

mod tests;

pub use application::config::LobbyConfig;
pub use application::config_sender::ConfigSender;
pub use error::{CatalogError, CatalogResult};
pub use infra::postgres::PgCatalogRepository;
pub use presentation::handlers::CatalogAppState;
pub use presentation::router::catalog_router;
