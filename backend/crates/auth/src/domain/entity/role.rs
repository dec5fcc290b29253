//! Role Entity

use kernel::id::{OrganizationId, RoleId};
use serde::{Deserialize, Serialize};

use crate::domain::entity::permission::Permission;
use crate::domain::value_object::role_type::RoleType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    /// `None` makes the role visible to every organization
    pub organization_id: Option<OrganizationId>,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub role_type: RoleType,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn new(
        organization_id: Option<OrganizationId>,
        name: impl Into<String>,
        description: impl Into<String>,
        role_type: RoleType,
    ) -> Self {
        Self {
            id: RoleId::new(),
            organization_id,
            name: name.into(),
            description: description.into(),
            role_type,
            permissions: Vec::new(),
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.role_type == RoleType::Root
    }

    /// Global roles are visible everywhere, scoped ones only to their owner
    pub fn visible_to(&self, organization_id: Option<OrganizationId>) -> bool {
        match (self.organization_id, organization_id) {
            (None, _) => true,
            (Some(owner), Some(org)) => owner == org,
            (Some(_), None) => false,
        }
    }
}
