//! Permission Action
//!
//! Canonical mapping of HTTP methods onto permission actions.

use kernel::error::app_error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

impl Action {
    /// GET→view, POST→create, PUT→edit, DELETE→delete
    pub fn from_method(method: &http::Method) -> Option<Self> {
        match *method {
            http::Method::GET => Some(Self::View),
            http::Method::POST => Some(Self::Create),
            http::Method::PUT => Some(Self::Edit),
            http::Method::DELETE => Some(Self::Delete),
            _ => None,
        }
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Self::View),
            "create" => Ok(Self::Create),
            "edit" => Ok(Self::Edit),
            "delete" => Ok(Self::Delete),
            other => Err(AppError::bad_request(format!("Unknown action: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_mapping() {
        assert_eq!(Action::from_method(&http::Method::GET), Some(Action::View));
        assert_eq!(Action::from_method(&http::Method::POST), Some(Action::Create));
        assert_eq!(Action::from_method(&http::Method::PUT), Some(Action::Edit));
        assert_eq!(Action::from_method(&http::Method::DELETE), Some(Action::Delete));
        assert_eq!(Action::from_method(&http::Method::PATCH), None);
    }
}
