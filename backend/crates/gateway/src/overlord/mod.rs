//! Overlord message bus
//!
//! Receives the materialised game/currency configuration and stores
//! short-link lobby parameters.

mod proto;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{GatewayError, GatewayResult};
use crate::grpc::GrpcConnection;

pub const QUEUE_OVERLORD: &str = "overlord";
pub const MESSAGE_CURRENCY_CONFIG: &str = "currency-config";

const SERVICE: &str = "overlord";

#[async_trait]
pub trait Overlord: Send + Sync {
    /// Enqueue `payload` on `queue` tagged with `message_type`
    async fn send(
        &self,
        queue: &str,
        message_type: &str,
        payload: &serde_json::Value,
    ) -> GatewayResult<()>;

    /// Persist lobby launch parameters under a short-link session id
    async fn save_params(&self, session_id: Uuid, params: &serde_json::Value)
    -> GatewayResult<()>;
}

// ============================================================================
// gRPC
// ============================================================================

#[derive(Clone)]
pub struct GrpcOverlord {
    conn: GrpcConnection,
}

impl GrpcOverlord {
    pub fn connect_lazy(url: &str, timeout: Duration) -> GatewayResult<Self> {
        Ok(Self {
            conn: GrpcConnection::lazy(SERVICE, url, timeout)?,
        })
    }
}

fn check_ack(ack: proto::Ack) -> GatewayResult<()> {
    if ack.ok {
        Ok(())
    } else {
        Err(GatewayError::malformed(SERVICE, ack.error))
    }
}

#[async_trait]
impl Overlord for GrpcOverlord {
    async fn send(
        &self,
        queue: &str,
        message_type: &str,
        payload: &serde_json::Value,
    ) -> GatewayResult<()> {
        let req = proto::SendRequest {
            queue: queue.to_string(),
            message_type: message_type.to_string(),
            payload: serde_json::to_vec(payload)?,
        };
        let ack: proto::Ack = self.conn.unary("/overlord.v1.Overlord/Send", req).await?;
        check_ack(ack)?;
        tracing::debug!(queue, message_type, "Message sent to overlord");
        Ok(())
    }

    async fn save_params(
        &self,
        session_id: Uuid,
        params: &serde_json::Value,
    ) -> GatewayResult<()> {
        let req = proto::SaveParamsRequest {
            session_id: session_id.to_string(),
            params: serde_json::to_vec(params)?,
        };
        let ack: proto::Ack = self
            .conn
            .unary("/overlord.v1.Overlord/SaveParams", req)
            .await?;
        check_ack(ack)
    }
}

// ============================================================================
// In-process
// ============================================================================

/// A message captured by [`RecordingOverlord`]
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub queue: String,
    pub message_type: String,
    pub payload: serde_json::Value,
}

/// Keeps everything in memory; used when no bus is configured
#[derive(Clone, Default)]
pub struct RecordingOverlord {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    params: Arc<Mutex<Vec<(Uuid, serde_json::Value)>>>,
}

impl RecordingOverlord {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn saved_params(&self) -> Vec<(Uuid, serde_json::Value)> {
        self.params.lock().await.clone()
    }
}

#[async_trait]
impl Overlord for RecordingOverlord {
    async fn send(
        &self,
        queue: &str,
        message_type: &str,
        payload: &serde_json::Value,
    ) -> GatewayResult<()> {
        tracing::info!(queue, message_type, "Recorded overlord message");
        self.sent.lock().await.push(SentMessage {
            queue: queue.to_string(),
            message_type: message_type.to_string(),
            payload: payload.clone(),
        });
        Ok(())
    }

    async fn save_params(
        &self,
        session_id: Uuid,
        params: &serde_json::Value,
    ) -> GatewayResult<()> {
        self.params.lock().await.push((session_id, params.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_overlord_keeps_order() {
        let bus = RecordingOverlord::new();
        bus.send(QUEUE_OVERLORD, MESSAGE_CURRENCY_CONFIG, &serde_json::json!([1]))
            .await
            .unwrap();
        bus.send(QUEUE_OVERLORD, MESSAGE_CURRENCY_CONFIG, &serde_json::json!([2]))
            .await
            .unwrap();
        let sent = bus.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].payload, serde_json::json!([2]));
        assert_eq!(sent[0].queue, "overlord");
    }

    #[test]
    fn test_negative_ack_is_error() {
        let ack = proto::Ack {
            ok: false,
            error: "queue full".into(),
        };
        assert!(check_ack(ack).is_err());
    }
}
