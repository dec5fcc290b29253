//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use crate::domain::value_object::totp_secret::TotpSettings;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for access/refresh JWTs
    pub jwt_secret: Vec<u8>,
    /// Access token lifetime; sessions expire with it
    pub access_ttl: Duration,
    /// Refresh token lifetime; also the store TTL of tokens and sessions
    pub refresh_ttl: Duration,
    /// Lifetime of a mailed password-reset link
    pub reset_token_ttl: Duration,
    /// Base URL of the back-office UI, used in reset links
    pub frontend_url: String,
    /// `From:` of outbound mail
    pub mail_sender: String,
    pub totp: TotpSettings,
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Vec::new(),
            access_ttl: Duration::from_secs(60 * 60),               // 1 hour
            refresh_ttl: Duration::from_secs(7 * 24 * 3600),        // 1 week
            reset_token_ttl: Duration::from_secs(24 * 3600),        // 1 day
            frontend_url: "http://localhost:3000".to_string(),
            mail_sender: "Backoffice <noreply@localhost>".to_string(),
            totp: TotpSettings::default(),
            bcrypt_cost: platform::password::DEFAULT_COST,
        }
    }
}

impl AuthConfig {
    /// Config with a random JWT secret
    pub fn with_random_secret() -> Self {
        Self {
            jwt_secret: platform::crypto::random_bytes(32),
            ..Default::default()
        }
    }

    /// Create config for development (random secret, cheap hashing)
    pub fn development() -> Self {
        Self {
            bcrypt_cost: 4,
            ..Self::with_random_secret()
        }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.as_secs() as i64
    }

    pub fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_ttl.as_secs() as i64
    }
}
