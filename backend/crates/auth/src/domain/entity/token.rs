//! Token Entity

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, SessionId};
use serde::{Deserialize, Serialize};

/// Issued access/refresh pair; `id` is the jti shared with the Session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: SessionId,
    pub account_id: AccountId,
    pub access_token: String,
    pub refresh_token: String,
    /// Access-token expiry
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}
