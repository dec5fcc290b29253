//! JWT issuance and validation
//!
//! Access and refresh tokens of one login share the same `jti`, which is
//! also the Session id.

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use kernel::id::{AccountId, SessionId};
use serde::{Deserialize, Serialize};

use crate::application::config::AuthConfig;
use crate::error::{AuthError, AuthResult};

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub jti: SessionId,
    pub sub: AccountId,
    pub iat: i64,
    pub exp: i64,
    pub token_type: String,
}

/// Freshly signed pair
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub jti: SessionId,
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl JwtManager {
    pub fn new(secret: &[u8], access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            config.access_ttl_secs(),
            config.refresh_ttl_secs(),
        )
    }

    /// Mint a new jti and sign both tokens for it
    pub fn issue(&self, account_id: AccountId) -> AuthResult<IssuedTokens> {
        let jti = SessionId::new();
        let now = Utc::now();
        let iat = now.timestamp();

        let access_exp = iat + self.access_ttl_secs;
        let refresh_exp = iat + self.refresh_ttl_secs;

        let access_token = self.sign(jti, account_id, iat, access_exp, ACCESS)?;
        let refresh_token = self.sign(jti, account_id, iat, refresh_exp, REFRESH)?;

        Ok(IssuedTokens {
            jti,
            access_token,
            refresh_token,
            access_expires_at: DateTime::from_timestamp(access_exp, 0).unwrap_or(now),
            refresh_expires_at: DateTime::from_timestamp(refresh_exp, 0).unwrap_or(now),
        })
    }

    fn sign(
        &self,
        jti: SessionId,
        sub: AccountId,
        iat: i64,
        exp: i64,
        token_type: &str,
    ) -> AuthResult<String> {
        let claims = Claims {
            jti,
            sub,
            iat,
            exp,
            token_type: token_type.to_string(),
        };
        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Signature, expiry and token type; every failure is `Unauthenticated`
    pub fn validate_access(&self, token: &str) -> AuthResult<Claims> {
        self.validate(token, ACCESS)
    }

    pub fn validate_refresh(&self, token: &str) -> AuthResult<Claims> {
        self.validate(token, REFRESH)
    }

    fn validate(&self, token: &str, token_type: &str) -> AuthResult<Claims> {
        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected token");
                AuthError::Unauthenticated
            })?
            .claims;
        if claims.token_type != token_type {
            return Err(AuthError::Unauthenticated);
        }
        Ok(claims)
    }
}
