//! Infrastructure Layer
//!
//! Export records in the key/value store, provider games in PostgreSQL.

pub mod kv;
pub mod postgres;

pub use kv::KvFileStore;
pub use postgres::PgGameDirectory;
