//! Response Envelope
//!
//! Every JSON response is wrapped as `{status, success, meta, data}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::pagination::Page;

/// Wire shape shared by success and error responses
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub status: u16,
    pub success: bool,
    pub meta: Option<serde_json::Value>,
    pub data: T,
}

/// Successful handler result
///
/// ```rust
/// use kernel::response::ApiResponse;
/// let resp = ApiResponse::ok(vec!["usd", "eur"]);
/// ```
pub enum ApiResponse<T> {
    Ok {
        data: T,
        meta: Option<serde_json::Value>,
    },
    /// 204 for delete endpoints
    NoContent,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse::Ok { data, meta: None }
    }

    pub fn with_meta(data: T, meta: serde_json::Value) -> Self {
        ApiResponse::Ok {
            data,
            meta: Some(meta),
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// Page items as `data`, counters as `meta`
    pub fn paged(page: Page<T>) -> Self {
        let meta = serde_json::json!({
            "total": page.total,
            "limit": page.limit,
            "offset": page.offset,
        });
        ApiResponse::Ok {
            data: page.items,
            meta: Some(meta),
        }
    }
}

impl ApiResponse<()> {
    pub fn no_content() -> Self {
        ApiResponse::NoContent
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Ok { data, meta } => Json(Envelope {
                status: StatusCode::OK.as_u16(),
                success: true,
                meta,
                data,
            })
            .into_response(),
            ApiResponse::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}
