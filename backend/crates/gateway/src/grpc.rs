//! gRPC plumbing shared by the downstream clients
//!
//! Message types are declared by hand with `prost` derives, so calls go
//! through a generic unary helper instead of generated client stubs.

use std::time::Duration;

use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};

use crate::error::{GatewayError, GatewayResult};

/// Lazily connected channel to one downstream service
#[derive(Clone)]
pub struct GrpcConnection {
    service: &'static str,
    channel: Channel,
}

impl GrpcConnection {
    /// Build a channel that connects on first use
    pub fn lazy(service: &'static str, url: &str, timeout: Duration) -> GatewayResult<Self> {
        let endpoint = Endpoint::from_shared(url.to_string())
            .map_err(|_| GatewayError::InvalidEndpoint(url.to_string()))?
            .connect_timeout(timeout)
            .timeout(timeout);

        tracing::info!(service, url, "Configured gRPC endpoint");

        Ok(Self {
            service,
            channel: endpoint.connect_lazy(),
        })
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Perform a unary call on `path` (`/package.Service/Method`)
    pub async fn unary<Req, Resp>(&self, path: &'static str, request: Req) -> GatewayResult<Resp>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready().await.map_err(|e| {
            GatewayError::status(
                self.service,
                tonic::Status::unavailable(format!("service was not ready: {}", e)),
            )
        })?;

        let codec = tonic_prost::ProstCodec::<Req, Resp>::default();
        let response = grpc
            .unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(path),
                codec,
            )
            .await
            .map_err(|status| {
                tracing::debug!(service = self.service, path, %status, "gRPC call failed");
                GatewayError::status(self.service, status)
            })?;

        Ok(response.into_inner())
    }
}
