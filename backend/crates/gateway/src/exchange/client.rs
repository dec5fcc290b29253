//! gRPC implementation of [`ExchangeClient`]

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;

use super::proto;
use super::{ExchangeClient, ExchangeRate};
use crate::error::{GatewayError, GatewayResult};
use crate::grpc::GrpcConnection;
use crate::history::Listing;

const SERVICE: &str = "exchange";

#[derive(Clone)]
pub struct GrpcExchangeClient {
    conn: GrpcConnection,
}

impl GrpcExchangeClient {
    pub fn connect_lazy(url: &str, timeout: Duration) -> GatewayResult<Self> {
        Ok(Self {
            conn: GrpcConnection::lazy(SERVICE, url, timeout)?,
        })
    }
}

impl TryFrom<proto::Rate> for ExchangeRate {
    type Error = GatewayError;

    fn try_from(r: proto::Rate) -> GatewayResult<Self> {
        let updated_at = DateTime::from_timestamp_millis(r.updated_at).ok_or_else(|| {
            GatewayError::malformed(SERVICE, format!("timestamp out of range: {}", r.updated_at))
        })?;
        Ok(ExchangeRate {
            currency: r.currency,
            base: r.base,
            rate: r.rate,
            updated_at,
        })
    }
}

#[async_trait]
impl ExchangeClient for GrpcExchangeClient {
    async fn rate(&self, currency: &str) -> GatewayResult<Option<ExchangeRate>> {
        let req = proto::GetRateRequest {
            currency: currency.to_string(),
        };
        match self
            .conn
            .unary::<_, proto::RateResponse>("/exchange.v1.ExchangeService/GetRate", req)
            .await
        {
            Ok(resp) => resp.rate.map(ExchangeRate::try_from).transpose(),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update_rate(&self, currency: &str, rate: f64) -> GatewayResult<ExchangeRate> {
        let req = proto::UpdateRateRequest {
            currency: currency.to_string(),
            rate,
        };
        let resp: proto::RateResponse = self
            .conn
            .unary("/exchange.v1.ExchangeService/UpdateRate", req)
            .await?;
        resp.rate
            .ok_or_else(|| GatewayError::malformed(SERVICE, "UpdateRate returned no rate"))?
            .try_into()
    }

    async fn history(
        &self,
        currency: &str,
        limit: i64,
        offset: i64,
    ) -> GatewayResult<Listing<ExchangeRate>> {
        let req = proto::HistoryRequest {
            currency: currency.to_string(),
            limit,
            offset,
        };
        let resp: proto::HistoryResponse = self
            .conn
            .unary("/exchange.v1.ExchangeService/History", req)
            .await?;
        Ok(Listing {
            items: resp
                .items
                .into_iter()
                .map(ExchangeRate::try_from)
                .collect::<GatewayResult<_>>()?,
            total: resp.total,
        })
    }
}
