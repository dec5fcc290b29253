//! Key/Value Store with TTL
//!
//! Process-external store for sessions, tokens and export jobs.
//! `Redis` is the production backend; `Memory` has the same semantics for
//! tests and single-node development.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Key {0} holds a value of the wrong type")]
    WrongType(String),
}

pub type KvResult<T> = Result<T, KvError>;

/// Store handle, cheap to clone
#[derive(Clone)]
pub enum KvStore {
    Redis(RedisStore),
    Memory(MemoryStore),
}

impl KvStore {
    /// Connect to Redis
    pub async fn redis(url: &str) -> KvResult<Self> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        tracing::info!("Connected to Redis");
        Ok(KvStore::Redis(RedisStore { manager }))
    }

    pub fn memory() -> Self {
        Self::memory_with(MemoryConfig::default())
    }

    pub fn memory_with(config: MemoryConfig) -> Self {
        KvStore::Memory(MemoryStore::new(config))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            KvStore::Redis(_) => "redis",
            KvStore::Memory(_) => "memory",
        }
    }

    pub async fn ping(&self) -> KvResult<()> {
        match self {
            KvStore::Redis(s) => {
                let mut conn = s.manager.clone();
                let _: String = redis::cmd("PING").query_async(&mut conn).await?;
                Ok(())
            }
            KvStore::Memory(_) => Ok(()),
        }
    }

    /// SET key value EX ttl
    pub async fn set_ex(&self, key: &str, value: Vec<u8>, ttl: Duration) -> KvResult<()> {
        match self {
            KvStore::Redis(s) => {
                let mut conn = s.manager.clone();
                conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
                    .await?;
                Ok(())
            }
            KvStore::Memory(s) => {
                s.put(key, Value::Bytes(value), Some(ttl)).await;
                Ok(())
            }
        }
    }

    /// Overwrite an existing key keeping its TTL; `false` if the key is gone
    pub async fn replace(&self, key: &str, value: Vec<u8>) -> KvResult<bool> {
        match self {
            KvStore::Redis(s) => {
                let mut conn = s.manager.clone();
                let reply: Option<String> = redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .arg("XX")
                    .arg("KEEPTTL")
                    .query_async(&mut conn)
                    .await?;
                Ok(reply.is_some())
            }
            KvStore::Memory(s) => Ok(s.replace(key, value).await),
        }
    }

    pub async fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        match self {
            KvStore::Redis(s) => {
                let mut conn = s.manager.clone();
                Ok(conn.get(key).await?)
            }
            KvStore::Memory(s) => match s.read(key).await {
                Some(Value::Bytes(b)) => Ok(Some(b)),
                Some(Value::Set(_)) => Err(KvError::WrongType(key.to_string())),
                None => Ok(None),
            },
        }
    }

    /// DEL key; `true` if something was removed
    pub async fn del(&self, key: &str) -> KvResult<bool> {
        match self {
            KvStore::Redis(s) => {
                let mut conn = s.manager.clone();
                let removed: u64 = conn.del(key).await?;
                Ok(removed > 0)
            }
            KvStore::Memory(s) => Ok(s.remove(key).await),
        }
    }

    /// SADD + EXPIRE
    pub async fn sadd(&self, key: &str, member: &str, ttl: Duration) -> KvResult<()> {
        match self {
            KvStore::Redis(s) => {
                let mut conn = s.manager.clone();
                redis::pipe()
                    .atomic()
                    .sadd(key, member)
                    .ignore()
                    .expire(key, ttl.as_secs().max(1) as i64)
                    .ignore()
                    .query_async::<()>(&mut conn)
                    .await?;
                Ok(())
            }
            KvStore::Memory(s) => s.set_add(key, member, ttl).await,
        }
    }

    pub async fn srem(&self, key: &str, member: &str) -> KvResult<()> {
        match self {
            KvStore::Redis(s) => {
                let mut conn = s.manager.clone();
                conn.srem::<_, _, ()>(key, member).await?;
                Ok(())
            }
            KvStore::Memory(s) => s.set_remove(key, member).await,
        }
    }

    pub async fn smembers(&self, key: &str) -> KvResult<Vec<String>> {
        match self {
            KvStore::Redis(s) => {
                let mut conn = s.manager.clone();
                Ok(conn.smembers(key).await?)
            }
            KvStore::Memory(s) => match s.read(key).await {
                Some(Value::Set(members)) => Ok(members.into_iter().collect()),
                Some(Value::Bytes(_)) => Err(KvError::WrongType(key.to_string())),
                None => Ok(Vec::new()),
            },
        }
    }

    /// All live keys starting with `prefix`
    pub async fn keys_with_prefix(&self, prefix: &str) -> KvResult<Vec<String>> {
        match self {
            KvStore::Redis(s) => {
                let mut conn = s.manager.clone();
                let pattern = format!("{}*", prefix);
                let mut cursor = 0u64;
                let mut found = Vec::new();
                loop {
                    let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(100)
                        .query_async(&mut conn)
                        .await?;
                    found.extend(keys);
                    cursor = next;
                    if cursor == 0 {
                        break;
                    }
                }
                Ok(found)
            }
            KvStore::Memory(s) => Ok(s.keys_with_prefix(prefix).await),
        }
    }

    // ------------------------------------------------------------------------
    // JSON helpers
    // ------------------------------------------------------------------------

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> KvResult<()> {
        self.set_ex(key, serde_json::to_vec(value)?, ttl).await
    }

    pub async fn replace_json<T: Serialize>(&self, key: &str, value: &T) -> KvResult<bool> {
        self.replace(key, serde_json::to_vec(value)?).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> KvResult<Option<T>> {
        match self.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

// ============================================================================
// Redis backend
// ============================================================================

#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

// ============================================================================
// In-memory backend
// ============================================================================

#[derive(Debug, Clone)]
enum Value {
    Bytes(Vec<u8>),
    Set(BTreeSet<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Limits of the in-memory backend
#[derive(Debug, Clone, Copy)]
pub struct MemoryConfig {
    /// Least recently used keys are evicted past this many entries
    pub max_entries: usize,
    /// Period of the background sweep of expired keys
    pub cleanup_interval: Duration,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

/// Bounded LRU map with TTLs
///
/// Expired entries are dropped on access and by a periodic sweep. The sweep
/// task holds a weak handle and ends once every clone of the store is gone.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<LruCache<String, Entry>>>,
}

impl MemoryStore {
    pub fn new(config: MemoryConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        let store = Self {
            entries: Arc::new(RwLock::new(LruCache::new(capacity))),
        };

        // Without a runtime (plain unit tests) only lazy expiry applies
        if tokio::runtime::Handle::try_current().is_ok() {
            store.spawn_cleanup(config.cleanup_interval);
        }
        store
    }

    fn spawn_cleanup(&self, every: Duration) {
        let entries = Arc::downgrade(&self.entries);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // First tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(entries) = entries.upgrade() else {
                    tracing::debug!("Memory store dropped, cleanup task exiting");
                    break;
                };
                let removed = Self { entries }.cleanup_expired().await;
                if removed > 0 {
                    tracing::debug!(removed, "Expired keys removed from memory store");
                }
            }
        });
    }

    /// Drop every expired entry, returning how many went
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, e)| e.is_expired())
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }

    /// Number of entries held, expired ones included until swept
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn insert(entries: &mut LruCache<String, Entry>, key: &str, entry: Entry) {
        if entries.len() == entries.cap().get() && !entries.contains(key) {
            // Make room from expired keys before evicting a live one
            let expired: Vec<String> = entries
                .iter()
                .filter(|(_, e)| e.is_expired())
                .map(|(k, _)| k.clone())
                .collect();
            for k in &expired {
                entries.pop(k);
            }
        }
        if let Some((evicted, _)) = entries.push(key.to_string(), entry) {
            if evicted != key {
                tracing::warn!(key = %evicted, "Memory store full, evicted least recently used key");
            }
        }
    }

    async fn put(&self, key: &str, value: Value, ttl: Option<Duration>) {
        let entry = Entry {
            value,
            expires_at: ttl.map(|t| Instant::now() + t),
        };
        let mut entries = self.entries.write().await;
        Self::insert(&mut entries, key, entry);
    }

    async fn read(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(e) if e.is_expired() => {
                entries.pop(key);
                None
            }
            Some(e) => Some(e.value.clone()),
            None => None,
        }
    }

    async fn replace(&self, key: &str, value: Vec<u8>) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(e) if !e.is_expired() => {
                e.value = Value::Bytes(value);
                true
            }
            Some(_) => {
                entries.pop(key);
                false
            }
            None => false,
        }
    }

    async fn remove(&self, key: &str) -> bool {
        self.entries
            .write()
            .await
            .pop(key)
            .is_some_and(|e| !e.is_expired())
    }

    async fn set_add(&self, key: &str, member: &str, ttl: Duration) -> KvResult<()> {
        let mut entries = self.entries.write().await;
        let expires_at = Some(Instant::now() + ttl);
        match entries.get_mut(key) {
            Some(e) if !e.is_expired() => match &mut e.value {
                Value::Set(members) => {
                    members.insert(member.to_string());
                    e.expires_at = expires_at;
                }
                Value::Bytes(_) => return Err(KvError::WrongType(key.to_string())),
            },
            _ => {
                let entry = Entry {
                    value: Value::Set(BTreeSet::from([member.to_string()])),
                    expires_at,
                };
                Self::insert(&mut entries, key, entry);
            }
        }
        Ok(())
    }

    async fn set_remove(&self, key: &str, member: &str) -> KvResult<()> {
        let mut entries = self.entries.write().await;
        let now_empty = match entries.get_mut(key) {
            Some(Entry {
                value: Value::Set(members),
                ..
            }) => {
                members.remove(member);
                members.is_empty()
            }
            Some(_) => return Err(KvError::WrongType(key.to_string())),
            None => false,
        };
        if now_empty {
            entries.pop(key);
        }
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(k, e)| k.starts_with(prefix) && !e.is_expired())
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}
