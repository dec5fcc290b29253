//! Platform - infrastructure building blocks shared by the domain crates
//!
//! - `crypto`: random tokens and hashing
//! - `password`: bcrypt credential hashing with policy checks
//! - `kv`: TTL key/value store (Redis or a bounded in-memory LRU)

pub mod crypto;
pub mod kv;
pub mod password;
