//! Request and response bodies
//!
//! Entities serialize as-is; only shapes that differ get a type here.

use kernel::id::{GameId, OrganizationId, OrganizationPairId, WagerSetId};
use kernel::organization::OrganizationType;
use serde::{Deserialize, Serialize};

use crate::domain::entity::OrganizationStatus;

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub organization_type: OrganizationType,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrganizationRequest {
    pub name: Option<String>,
    pub status: Option<OrganizationStatus>,
}

/// Counterpart of a pair route
#[derive(Debug, Deserialize)]
pub struct OrganizationLinkRequest {
    pub id: OrganizationId,
}

#[derive(Debug, Deserialize)]
pub struct GameLinkRequest {
    pub game_id: GameId,
}

#[derive(Debug, Deserialize)]
pub struct WagerSetLinkRequest {
    pub game_id: GameId,
    pub wager_set_id: WagerSetId,
}

#[derive(Debug, Deserialize)]
pub struct PairQuery {
    pub organization_pair_id: OrganizationPairId,
}

#[derive(Debug, Deserialize)]
pub struct MultiplierKeyQuery {
    pub organization_pair_id: OrganizationPairId,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct MultiplierSearchQuery {
    pub provider_id: OrganizationId,
    pub integrator_id: OrganizationId,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rate: f64,
}

#[derive(Debug, Deserialize)]
pub struct DictionaryValueRequest {
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: String,
}

impl DeletedResponse {
    pub fn new(id: impl ToString) -> Self {
        Self { id: id.to_string() }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub rows: usize,
}

#[derive(Debug, Serialize)]
pub struct StartGameResponse {
    pub url: String,
}
