//! Infrastructure Layer
//!
//! PostgreSQL repositories and the key/value session store.

pub mod kv;
pub mod postgres;

pub use kv::KvSessionStore;
pub use postgres::PgAuthRepository;
