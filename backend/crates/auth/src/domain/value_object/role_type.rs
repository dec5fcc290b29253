//! Role Type

use kernel::error::app_error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `root` bypasses every permission check and can never be assigned
/// through the API. `admin` roles can only be edited by root holders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    Root,
    Admin,
    #[default]
    Default,
}

impl RoleType {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Admin => "admin",
            Self::Default => "default",
        }
    }

    /// Editing this role's permissions needs a root caller
    #[inline]
    pub const fn is_protected(&self) -> bool {
        matches!(self, Self::Root | Self::Admin)
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for RoleType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "root" => Ok(Self::Root),
            "admin" => Ok(Self::Admin),
            "default" => Ok(Self::Default),
            other => Err(AppError::bad_request(format!("Unknown role type: {}", other))),
        }
    }
}
