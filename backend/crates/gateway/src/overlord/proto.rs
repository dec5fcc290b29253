//! Wire messages of `overlord.v1.Overlord`

#[derive(Clone, PartialEq, prost::Message)]
pub struct SendRequest {
    #[prost(string, tag = "1")]
    pub queue: String,
    #[prost(string, tag = "2")]
    pub message_type: String,
    /// JSON document
    #[prost(bytes = "vec", tag = "3")]
    pub payload: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SaveParamsRequest {
    #[prost(string, tag = "1")]
    pub session_id: String,
    /// JSON document
    #[prost(bytes = "vec", tag = "2")]
    pub params: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Ack {
    #[prost(bool, tag = "1")]
    pub ok: bool,
    #[prost(string, tag = "2")]
    pub error: String,
}
