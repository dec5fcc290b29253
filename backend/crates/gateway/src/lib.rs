//! Gateway - clients for the services the back-office depends on
//!
//! - `history`: spin/session/aggregated play data (gRPC)
//! - `exchange`: currency rates (gRPC)
//! - `overlord`: configuration bus and lobby parameters (gRPC)
//! - `mailer`: outbound mail (Mailgun HTTP API)
//!
//! Every client sits behind an `async_trait` so the domain crates can be
//! tested with in-process fakes.

pub mod error;
pub mod exchange;
pub mod grpc;
pub mod history;
pub mod mailer;
pub mod overlord;

pub use error::{GatewayError, GatewayResult};
pub use exchange::{ExchangeClient, ExchangeRate, GrpcExchangeClient};
pub use history::{GrpcHistoryClient, HistoryClient, HistoryFilter};
pub use mailer::{LogMailer, Mail, Mailer, MailgunConfig, MailgunMailer};
pub use overlord::{GrpcOverlord, Overlord, RecordingOverlord};
