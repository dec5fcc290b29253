//! Infrastructure Layer
//!
//! PostgreSQL implementation of every catalog repository.

pub mod postgres;

pub use postgres::PgCatalogRepository;
