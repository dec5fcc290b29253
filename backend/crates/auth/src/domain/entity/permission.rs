//! Permission Entity

use kernel::id::PermissionId;
use serde::{Deserialize, Serialize};

use crate::domain::value_object::action::Action;

/// Grants one action on one matched route pattern (e.g. `/api/game/:id`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
    pub description: String,
    pub subject: String,
    pub endpoint: String,
    pub action: Action,
}

impl Permission {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        subject: impl Into<String>,
        endpoint: impl Into<String>,
        action: Action,
    ) -> Self {
        Self {
            id: PermissionId::new(),
            name: name.into(),
            description: description.into(),
            subject: subject.into(),
            endpoint: endpoint.into(),
            action,
        }
    }

    #[inline]
    pub fn matches(&self, endpoint: &str, action: Action) -> bool {
        self.action == action && self.endpoint == endpoint
    }
}
