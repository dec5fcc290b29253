//! Wire messages of `exchange.v1.ExchangeService`

#[derive(Clone, PartialEq, prost::Message)]
pub struct Rate {
    #[prost(string, tag = "1")]
    pub currency: String,
    #[prost(string, tag = "2")]
    pub base: String,
    #[prost(double, tag = "3")]
    pub rate: f64,
    #[prost(int64, tag = "4")]
    pub updated_at: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetRateRequest {
    #[prost(string, tag = "1")]
    pub currency: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RateResponse {
    #[prost(message, optional, tag = "1")]
    pub rate: Option<Rate>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UpdateRateRequest {
    #[prost(string, tag = "1")]
    pub currency: String,
    #[prost(double, tag = "2")]
    pub rate: f64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct HistoryRequest {
    #[prost(string, tag = "1")]
    pub currency: String,
    #[prost(int64, tag = "2")]
    pub limit: i64,
    #[prost(int64, tag = "3")]
    pub offset: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct HistoryResponse {
    #[prost(message, repeated, tag = "1")]
    pub items: Vec<Rate>,
    #[prost(int64, tag = "2")]
    pub total: i64,
}
