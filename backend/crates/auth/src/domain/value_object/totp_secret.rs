//! TOTP Secret Value Object
//!
//! Base32 secret plus the generator parameters it is checked against.
//! Parameters come from `AuthConfig`, nothing here is process-global.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use totp_rs::{Algorithm, Secret, TOTP};

/// Generator parameters (Google Authenticator compatible by default)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotpSettings {
    pub issuer: String,
    pub digits: usize,
    pub step: u64,
    /// Accepted steps before/after the current one
    pub skew: u8,
}

impl Default for TotpSettings {
    fn default() -> Self {
        Self {
            issuer: "Backoffice".to_string(),
            digits: 6,
            step: 30,
            skew: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TotpSecret(String);

impl TotpSecret {
    pub fn generate() -> Self {
        Self(Secret::generate_secret().to_encoded().to_string())
    }

    /// Restore a stored secret, rejecting anything that is not base32
    pub fn from_base32(secret: impl Into<String>) -> AppResult<Self> {
        let secret = secret.into();
        Secret::Encoded(secret.clone())
            .to_bytes()
            .map_err(|e| AppError::internal(format!("Invalid TOTP secret: {:?}", e)))?;
        Ok(Self(secret))
    }

    pub fn as_base32(&self) -> &str {
        &self.0
    }

    fn totp(&self, account_name: &str, settings: &TotpSettings) -> AppResult<TOTP> {
        let bytes = Secret::Encoded(self.0.clone())
            .to_bytes()
            .map_err(|e| AppError::internal(format!("Invalid TOTP secret: {:?}", e)))?;

        TOTP::new(
            Algorithm::SHA1,
            settings.digits,
            settings.skew,
            settings.step,
            bytes,
            Some(settings.issuer.clone()),
            account_name.to_string(),
        )
        .map_err(|e| AppError::internal(format!("Failed to create TOTP: {}", e)))
    }

    /// `false` for malformed codes as well as wrong ones
    pub fn verify(&self, code: &str, account_name: &str, settings: &TotpSettings) -> AppResult<bool> {
        let code = code.trim();
        if code.len() != settings.digits || !code.chars().all(|c| c.is_ascii_digit()) {
            return Ok(false);
        }
        let totp = self.totp(account_name, settings)?;
        Ok(totp.check_current(code).unwrap_or(false))
    }

    pub fn current_code(&self, account_name: &str, settings: &TotpSettings) -> AppResult<String> {
        self.totp(account_name, settings)?
            .generate_current()
            .map_err(|e| AppError::internal(format!("Failed to generate TOTP: {}", e)))
    }

    /// `otpauth://totp/...` for authenticator apps
    pub fn otpauth_url(&self, account_name: &str, settings: &TotpSettings) -> AppResult<String> {
        Ok(self.totp(account_name, settings)?.get_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_code_verifies() {
        let settings = TotpSettings::default();
        let secret = TotpSecret::generate();
        let code = secret.current_code("ops@casino.example", &settings).unwrap();

        assert!(secret.verify(&code, "ops@casino.example", &settings).unwrap());
        assert!(!secret.verify("12345", "ops@casino.example", &settings).unwrap());
        assert!(!secret.verify("abcdef", "ops@casino.example", &settings).unwrap());
    }

    #[test]
    fn test_otpauth_url_carries_issuer() {
        let settings = TotpSettings {
            issuer: "Casino".into(),
            ..TotpSettings::default()
        };
        let url = TotpSecret::generate()
            .otpauth_url("ops@casino.example", &settings)
            .unwrap();
        assert!(url.starts_with("otpauth://totp/"));
        assert!(url.contains("issuer=Casino"));
    }

    #[test]
    fn test_from_base32_rejects_garbage() {
        assert!(TotpSecret::from_base32("not base32 !!").is_err());
        let secret = TotpSecret::generate();
        assert_eq!(
            TotpSecret::from_base32(secret.as_base32()).unwrap(),
            secret
        );
    }
}
