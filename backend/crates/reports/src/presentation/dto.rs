//! Request and response bodies

use kernel::id::FileId;
use serde::{Deserialize, Serialize};

/// Returned by every export submission
#[derive(Debug, Serialize)]
pub struct FileIdResponse {
    pub id: FileId,
}

/// Both keys are required; missing ones are reported as validation errors
#[derive(Debug, Default, Deserialize)]
pub struct PublicReportQuery {
    pub game: Option<String>,
    pub currency: Option<String>,
}
