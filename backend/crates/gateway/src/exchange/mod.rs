//! Exchange service client
//!
//! Reads and updates the rate of a currency against the platform base
//! currency, and pages through the rate history.

mod client;
mod proto;

pub use client::GrpcExchangeClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GatewayResult;
use crate::history::Listing;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub currency: String,
    pub base: String,
    pub rate: f64,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait ExchangeClient: Send + Sync {
    async fn rate(&self, currency: &str) -> GatewayResult<Option<ExchangeRate>>;

    async fn update_rate(&self, currency: &str, rate: f64) -> GatewayResult<ExchangeRate>;

    async fn history(
        &self,
        currency: &str,
        limit: i64,
        offset: i64,
    ) -> GatewayResult<Listing<ExchangeRate>>;
}
