//! gRPC implementation of [`HistoryClient`]

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::proto;
use super::{
    AggregatedRecord, FinancialRecord, GamingSessionRecord, HistoryClient, HistoryFilter, Listing,
    SpinRecord,
};
use crate::error::{GatewayError, GatewayResult};
use crate::grpc::GrpcConnection;

const SERVICE: &str = "history";

#[derive(Clone)]
pub struct GrpcHistoryClient {
    conn: GrpcConnection,
}

impl GrpcHistoryClient {
    pub fn connect_lazy(url: &str, timeout: Duration) -> GatewayResult<Self> {
        Ok(Self {
            conn: GrpcConnection::lazy(SERVICE, url, timeout)?,
        })
    }

    fn request(filter: &HistoryFilter) -> proto::FilterRequest {
        proto::FilterRequest {
            filter: Some(to_proto_filter(filter)),
        }
    }
}

fn to_proto_filter(f: &HistoryFilter) -> proto::Filter {
    proto::Filter {
        integrator: f.integrator.clone().unwrap_or_default(),
        operator: f.operator.clone().unwrap_or_default(),
        game: f.game.clone().unwrap_or_default(),
        starting_from: f.starting_from.map(|t| t.timestamp_millis()),
        ending_at: f.ending_at.map(|t| t.timestamp_millis()),
        session_token: f.session_token.clone().unwrap_or_default(),
        round_id: f.round_id.clone().unwrap_or_default(),
        host: f.host.clone().unwrap_or_default(),
        external_user_id: f.external_user_id.clone().unwrap_or_default(),
        is_demo: f.is_demo,
        rtp_from: f.rtp_from,
        convert_currency: f.convert_currency.clone(),
        games_whitelist: f.games_whitelist.clone(),
        is_pfr: f.is_pfr,
        group_by: f.group_by.clone(),
        segment: f.segment.clone().unwrap_or_default(),
        limit: f.limit,
        offset: f.offset,
    }
}

fn timestamp(ms: i64) -> GatewayResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| GatewayError::malformed(SERVICE, format!("timestamp out of range: {}", ms)))
}

impl TryFrom<proto::Spin> for SpinRecord {
    type Error = GatewayError;

    fn try_from(s: proto::Spin) -> GatewayResult<Self> {
        Ok(SpinRecord {
            created_at: timestamp(s.created_at)?,
            round_id: s.round_id,
            session_token: s.session_token,
            game_id: s.game_id,
            game: s.game,
            integrator: s.integrator,
            operator: s.operator,
            external_user_id: s.external_user_id,
            host: s.host,
            currency: s.currency,
            wager: s.wager,
            award: s.award,
            is_demo: s.is_demo,
            is_pfr: s.is_pfr,
        })
    }
}

impl TryFrom<proto::GamingSession> for GamingSessionRecord {
    type Error = GatewayError;

    fn try_from(s: proto::GamingSession) -> GatewayResult<Self> {
        Ok(GamingSessionRecord {
            started_at: timestamp(s.started_at)?,
            finished_at: s.finished_at.map(timestamp).transpose()?,
            session_token: s.session_token,
            game_id: s.game_id,
            game: s.game,
            integrator: s.integrator,
            operator: s.operator,
            external_user_id: s.external_user_id,
            currency: s.currency,
            round_count: s.round_count,
            wager: s.wager,
            award: s.award,
        })
    }
}

impl From<proto::Aggregated> for AggregatedRecord {
    fn from(a: proto::Aggregated) -> Self {
        AggregatedRecord {
            game_id: a.game_id,
            game: a.game,
            country: a.country,
            currency: a.currency,
            segment: a.segment,
            user_count: a.user_count,
            round_count: a.round_count,
            wager: a.wager,
            award: a.award,
        }
    }
}

#[async_trait]
impl HistoryClient for GrpcHistoryClient {
    async fn spins(&self, filter: &HistoryFilter) -> GatewayResult<Listing<SpinRecord>> {
        let resp: proto::SpinsResponse = self
            .conn
            .unary("/history.v1.HistoryService/Spins", Self::request(filter))
            .await?;
        Ok(Listing {
            items: resp
                .items
                .into_iter()
                .map(SpinRecord::try_from)
                .collect::<GatewayResult<_>>()?,
            total: resp.total,
        })
    }

    async fn spin(
        &self,
        round_id: &str,
        game: &str,
        currency: &str,
    ) -> GatewayResult<Option<SpinRecord>> {
        let req = proto::LookupRequest {
            id: round_id.to_string(),
            game: game.to_string(),
            currency: currency.to_string(),
        };
        match self
            .conn
            .unary::<_, proto::SpinResponse>("/history.v1.HistoryService/Spin", req)
            .await
        {
            Ok(resp) => resp.spin.map(SpinRecord::try_from).transpose(),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn gaming_sessions(
        &self,
        filter: &HistoryFilter,
    ) -> GatewayResult<Listing<GamingSessionRecord>> {
        let resp: proto::GamingSessionsResponse = self
            .conn
            .unary(
                "/history.v1.HistoryService/GamingSessions",
                Self::request(filter),
            )
            .await?;
        Ok(Listing {
            items: resp
                .items
                .into_iter()
                .map(GamingSessionRecord::try_from)
                .collect::<GatewayResult<_>>()?,
            total: resp.total,
        })
    }

    async fn gaming_session(
        &self,
        session_token: &str,
        game: &str,
        currency: &str,
    ) -> GatewayResult<Option<GamingSessionRecord>> {
        let req = proto::LookupRequest {
            id: session_token.to_string(),
            game: game.to_string(),
            currency: currency.to_string(),
        };
        match self
            .conn
            .unary::<_, proto::GamingSessionResponse>(
                "/history.v1.HistoryService/GamingSession",
                req,
            )
            .await
        {
            Ok(resp) => resp.session.map(GamingSessionRecord::try_from).transpose(),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn aggregated_by_game(
        &self,
        filter: &HistoryFilter,
    ) -> GatewayResult<Vec<AggregatedRecord>> {
        let resp: proto::AggregatedResponse = self
            .conn
            .unary(
                "/history.v1.HistoryService/AggregatedByGame",
                Self::request(filter),
            )
            .await?;
        Ok(resp.items.into_iter().map(Into::into).collect())
    }

    async fn aggregated_by_country(
        &self,
        filter: &HistoryFilter,
    ) -> GatewayResult<Vec<AggregatedRecord>> {
        let resp: proto::AggregatedResponse = self
            .conn
            .unary(
                "/history.v1.HistoryService/AggregatedByCountry",
                Self::request(filter),
            )
            .await?;
        Ok(resp.items.into_iter().map(Into::into).collect())
    }

    async fn financial(&self, filter: &HistoryFilter) -> GatewayResult<FinancialRecord> {
        let resp: proto::FinancialResponse = self
            .conn
            .unary("/history.v1.HistoryService/Financial", Self::request(filter))
            .await?;
        Ok(FinancialRecord {
            currency: resp.currency,
            user_count: resp.user_count,
            round_count: resp.round_count,
            wager: resp.wager,
            award: resp.award,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_mapping() {
        let filter = HistoryFilter {
            integrator: Some("acme".into()),
            convert_currency: "usd".into(),
            games_whitelist: vec!["g1".into()],
            is_demo: Some(false),
            ..Default::default()
        };
        let p = to_proto_filter(&filter.pfr());
        assert_eq!(p.integrator, "acme");
        assert_eq!(p.operator, "");
        assert!(p.is_pfr);
        assert_eq!(p.is_demo, Some(false));
        assert_eq!(p.games_whitelist, vec!["g1".to_string()]);
    }

    #[test]
    fn test_spin_conversion_rejects_bad_timestamp() {
        let spin = proto::Spin {
            created_at: i64::MAX,
            ..Default::default()
        };
        assert!(SpinRecord::try_from(spin).is_err());
    }

    #[test]
    fn test_session_conversion() {
        let session = proto::GamingSession {
            session_token: "tok".into(),
            started_at: 1_700_000_000_000,
            finished_at: None,
            round_count: 3,
            ..Default::default()
        };
        let record = GamingSessionRecord::try_from(session).unwrap();
        assert_eq!(record.round_count, 3);
        assert!(record.finished_at.is_none());
    }
}
