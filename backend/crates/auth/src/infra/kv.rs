//! Key/Value Session & Token Store
//!
//! Layout:
//! - `session:{jti}` → Session JSON, reverse index `account_sessions:{account}`
//! - `token:{jti}` → Token JSON, reverse index `account_tokens:{account}`
//! - `token_refresh:{sha256}` / `token_access:{sha256}` → jti
//!
//! Bearer strings are only ever used as keys in hashed form.

use std::time::Duration;

use kernel::id::{AccountId, SessionId};
use platform::crypto::sha256_hex;
use platform::kv::KvStore;

use crate::domain::entity::{session::Session, token::Token};
use crate::domain::repository::{SessionRepository, TokenRepository};
use crate::error::AuthResult;

#[derive(Clone)]
pub struct KvSessionStore {
    kv: KvStore,
}

impl KvSessionStore {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    fn session_key(id: SessionId) -> String {
        format!("session:{}", id)
    }

    fn account_sessions_key(id: AccountId) -> String {
        format!("account_sessions:{}", id)
    }

    fn token_key(id: SessionId) -> String {
        format!("token:{}", id)
    }

    fn account_tokens_key(id: AccountId) -> String {
        format!("account_tokens:{}", id)
    }

    fn refresh_key(refresh_token: &str) -> String {
        format!("token_refresh:{}", sha256_hex(refresh_token.as_bytes()))
    }

    fn access_key(access_token: &str) -> String {
        format!("token_access:{}", sha256_hex(access_token.as_bytes()))
    }

    async fn token_by_pointer(&self, pointer: &str) -> AuthResult<Option<Token>> {
        let Some(jti) = self.kv.get(pointer).await? else {
            return Ok(None);
        };
        let jti = String::from_utf8_lossy(&jti).to_string();
        Ok(self.kv.get_json(&format!("token:{}", jti)).await?)
    }
}

impl SessionRepository for KvSessionStore {
    async fn create_session(&self, session: &Session, ttl: Duration) -> AuthResult<()> {
        self.kv
            .set_json(&Self::session_key(session.id), session, ttl)
            .await?;
        self.kv
            .sadd(
                &Self::account_sessions_key(session.account.id),
                &session.id.to_string(),
                ttl,
            )
            .await?;
        Ok(())
    }

    async fn find_session(&self, id: SessionId) -> AuthResult<Option<Session>> {
        Ok(self.kv.get_json(&Self::session_key(id)).await?)
    }

    async fn update_session(&self, session: &Session) -> AuthResult<bool> {
        Ok(self
            .kv
            .replace_json(&Self::session_key(session.id), session)
            .await?)
    }

    async fn delete_session(&self, id: SessionId, account_id: AccountId) -> AuthResult<bool> {
        let removed = self.kv.del(&Self::session_key(id)).await?;
        self.kv
            .srem(&Self::account_sessions_key(account_id), &id.to_string())
            .await?;
        Ok(removed)
    }

    async fn sessions_for_account(&self, account_id: AccountId) -> AuthResult<Vec<Session>> {
        let index = Self::account_sessions_key(account_id);
        let mut sessions = Vec::new();
        for member in self.kv.smembers(&index).await? {
            match self.kv.get_json::<Session>(&format!("session:{}", member)).await? {
                Some(session) => sessions.push(session),
                // Expired behind the index
                None => self.kv.srem(&index, &member).await?,
            }
        }
        Ok(sessions)
    }
}

impl TokenRepository for KvSessionStore {
    async fn create_token(&self, token: &Token, ttl: Duration) -> AuthResult<()> {
        let jti = token.id.to_string();
        self.kv.set_json(&Self::token_key(token.id), token, ttl).await?;
        self.kv
            .set_ex(&Self::refresh_key(&token.refresh_token), jti.clone().into_bytes(), ttl)
            .await?;
        self.kv
            .set_ex(&Self::access_key(&token.access_token), jti.clone().into_bytes(), ttl)
            .await?;
        self.kv
            .sadd(&Self::account_tokens_key(token.account_id), &jti, ttl)
            .await?;
        Ok(())
    }

    async fn find_by_refresh(&self, refresh_token: &str) -> AuthResult<Option<Token>> {
        self.token_by_pointer(&Self::refresh_key(refresh_token)).await
    }

    async fn find_by_access(&self, access_token: &str) -> AuthResult<Option<Token>> {
        self.token_by_pointer(&Self::access_key(access_token)).await
    }

    /// The refresh pointer is removed first; its DEL result decides which
    /// of two concurrent refreshes wins.
    async fn delete_token(&self, token: &Token) -> AuthResult<bool> {
        let consumed = self.kv.del(&Self::refresh_key(&token.refresh_token)).await?;
        self.kv.del(&Self::access_key(&token.access_token)).await?;
        self.kv.del(&Self::token_key(token.id)).await?;
        self.kv
            .srem(&Self::account_tokens_key(token.account_id), &token.id.to_string())
            .await?;
        Ok(consumed)
    }

    async fn tokens_for_account(&self, account_id: AccountId) -> AuthResult<Vec<Token>> {
        let index = Self::account_tokens_key(account_id);
        let mut tokens = Vec::new();
        for member in self.kv.smembers(&index).await? {
            match self.kv.get_json::<Token>(&format!("token:{}", member)).await? {
                Some(token) => tokens.push(token),
                None => self.kv.srem(&index, &member).await?,
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn token(account_id: AccountId) -> Token {
        Token {
            id: SessionId::new(),
            account_id,
            access_token: "access.jwt".into(),
            refresh_token: "refresh.jwt".into(),
            expires_at: Utc::now(),
            refresh_expires_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_token_lookup_and_single_consumption() {
        let store = KvSessionStore::new(KvStore::memory());
        let account = AccountId::new();
        let t = token(account);
        store.create_token(&t, Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.find_by_refresh("refresh.jwt").await.unwrap(), Some(t.clone()));
        assert_eq!(store.find_by_access("access.jwt").await.unwrap(), Some(t.clone()));
        assert_eq!(store.tokens_for_account(account).await.unwrap().len(), 1);

        assert!(store.delete_token(&t).await.unwrap());
        assert!(!store.delete_token(&t).await.unwrap());
        assert_eq!(store.find_by_refresh("refresh.jwt").await.unwrap(), None);
        assert!(store.tokens_for_account(account).await.unwrap().is_empty());
    }
}
