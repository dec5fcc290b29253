//! Wire messages of `history.v1.HistoryService`

#[derive(Clone, PartialEq, prost::Message)]
pub struct Filter {
    #[prost(string, tag = "1")]
    pub integrator: String,
    #[prost(string, tag = "2")]
    pub operator: String,
    #[prost(string, tag = "3")]
    pub game: String,
    #[prost(int64, optional, tag = "4")]
    pub starting_from: Option<i64>,
    #[prost(int64, optional, tag = "5")]
    pub ending_at: Option<i64>,
    #[prost(string, tag = "6")]
    pub session_token: String,
    #[prost(string, tag = "7")]
    pub round_id: String,
    #[prost(string, tag = "8")]
    pub host: String,
    #[prost(string, tag = "9")]
    pub external_user_id: String,
    #[prost(bool, optional, tag = "10")]
    pub is_demo: Option<bool>,
    #[prost(double, optional, tag = "11")]
    pub rtp_from: Option<f64>,
    #[prost(string, tag = "12")]
    pub convert_currency: String,
    #[prost(string, repeated, tag = "13")]
    pub games_whitelist: Vec<String>,
    #[prost(bool, tag = "14")]
    pub is_pfr: bool,
    #[prost(string, repeated, tag = "15")]
    pub group_by: Vec<String>,
    #[prost(string, tag = "16")]
    pub segment: String,
    #[prost(int64, tag = "17")]
    pub limit: i64,
    #[prost(int64, tag = "18")]
    pub offset: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FilterRequest {
    #[prost(message, optional, tag = "1")]
    pub filter: Option<Filter>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct LookupRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub game: String,
    #[prost(string, tag = "3")]
    pub currency: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Spin {
    #[prost(string, tag = "1")]
    pub round_id: String,
    #[prost(string, tag = "2")]
    pub session_token: String,
    #[prost(string, tag = "3")]
    pub game_id: String,
    #[prost(string, tag = "4")]
    pub game: String,
    #[prost(string, tag = "5")]
    pub integrator: String,
    #[prost(string, tag = "6")]
    pub operator: String,
    #[prost(string, tag = "7")]
    pub external_user_id: String,
    #[prost(string, tag = "8")]
    pub host: String,
    #[prost(string, tag = "9")]
    pub currency: String,
    #[prost(int64, tag = "10")]
    pub wager: i64,
    #[prost(int64, tag = "11")]
    pub award: i64,
    #[prost(bool, tag = "12")]
    pub is_demo: bool,
    #[prost(bool, tag = "13")]
    pub is_pfr: bool,
    #[prost(int64, tag = "14")]
    pub created_at: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SpinsResponse {
    #[prost(message, repeated, tag = "1")]
    pub items: Vec<Spin>,
    #[prost(int64, tag = "2")]
    pub total: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SpinResponse {
    #[prost(message, optional, tag = "1")]
    pub spin: Option<Spin>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GamingSession {
    #[prost(string, tag = "1")]
    pub session_token: String,
    #[prost(string, tag = "2")]
    pub game_id: String,
    #[prost(string, tag = "3")]
    pub game: String,
    #[prost(string, tag = "4")]
    pub integrator: String,
    #[prost(string, tag = "5")]
    pub operator: String,
    #[prost(string, tag = "6")]
    pub external_user_id: String,
    #[prost(string, tag = "7")]
    pub currency: String,
    #[prost(int64, tag = "8")]
    pub round_count: i64,
    #[prost(int64, tag = "9")]
    pub wager: i64,
    #[prost(int64, tag = "10")]
    pub award: i64,
    #[prost(int64, tag = "11")]
    pub started_at: i64,
    #[prost(int64, optional, tag = "12")]
    pub finished_at: Option<i64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GamingSessionsResponse {
    #[prost(message, repeated, tag = "1")]
    pub items: Vec<GamingSession>,
    #[prost(int64, tag = "2")]
    pub total: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GamingSessionResponse {
    #[prost(message, optional, tag = "1")]
    pub session: Option<GamingSession>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Aggregated {
    #[prost(string, tag = "1")]
    pub game_id: String,
    #[prost(string, tag = "2")]
    pub game: String,
    #[prost(string, tag = "3")]
    pub country: String,
    #[prost(string, tag = "4")]
    pub currency: String,
    #[prost(string, tag = "5")]
    pub segment: String,
    #[prost(int64, tag = "6")]
    pub user_count: i64,
    #[prost(int64, tag = "7")]
    pub round_count: i64,
    #[prost(int64, tag = "8")]
    pub wager: i64,
    #[prost(int64, tag = "9")]
    pub award: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AggregatedResponse {
    #[prost(message, repeated, tag = "1")]
    pub items: Vec<Aggregated>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FinancialResponse {
    #[prost(string, tag = "1")]
    pub currency: String,
    #[prost(int64, tag = "2")]
    pub user_count: i64,
    #[prost(int64, tag = "3")]
    pub round_count: i64,
    #[prost(int64, tag = "4")]
    pub wager: i64,
    #[prost(int64, tag = "5")]
    pub award: i64,
}
