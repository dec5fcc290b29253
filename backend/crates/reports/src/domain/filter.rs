//! Report Filters
//!
//! User-facing query parameters, narrowed to what the caller's organization
//! may see, then translated into the history service filter.

use chrono::{DateTime, Utc};
use gateway::HistoryFilter;
use kernel::error::app_error::FieldError;
use serde::Deserialize;

use crate::domain::report::{Columns, SpinReport};
use crate::error::{ReportError, ReportResult};

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 1000;

pub const SEGMENTS: [&str; 3] = ["day", "week", "month"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    pub currency: Option<String>,
    pub integrator: Option<String>,
    pub operator: Option<String>,
    pub game: Option<String>,
    pub starting_from: Option<DateTime<Utc>>,
    pub ending_at: Option<DateTime<Utc>>,
    pub session_token: Option<String>,
    pub round_id: Option<String>,
    pub host: Option<String>,
    pub external_user_id: Option<String>,
    pub is_demo: Option<bool>,
    pub rtp_from: Option<f64>,
    /// Comma-separated spin columns
    pub group_by: Option<String>,
    /// Comma-separated game names
    pub games: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// What the caller's organization restricts reports to
#[derive(Debug, Clone, PartialEq)]
pub enum ReportScope {
    Unrestricted,
    Integrator(String),
    Operator(String),
    /// Names of the games the provider owns
    Provider(Vec<String>),
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ReportQuery {
    /// Validated history filter for `scope`
    ///
    /// `currency` is required; every numeric column comes back converted
    /// into it.
    pub fn to_history_filter(&self, scope: &ReportScope) -> ReportResult<HistoryFilter> {
        let mut fields = Vec::new();

        let currency = non_empty(&self.currency).map(|c| c.to_lowercase());
        if currency.is_none() {
            fields.push(FieldError::new("currency", "required"));
        }

        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if !(0..=MAX_LIMIT).contains(&limit) {
            fields.push(FieldError::new(
                "limit",
                format!("must be between 0 and {}", MAX_LIMIT),
            ));
        }
        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            fields.push(FieldError::new("offset", "must not be negative"));
        }

        if let (Some(from), Some(to)) = (self.starting_from, self.ending_at) {
            if from > to {
                fields.push(FieldError::new("ending_at", "must not precede starting_from"));
            }
        }

        let group_by = split_list(self.group_by.as_deref());
        for column in &group_by {
            if !SpinReport::COLUMNS.contains(&column.as_str()) {
                fields.push(FieldError::new("group_by", format!("unknown column {}", column)));
            }
        }

        if !fields.is_empty() {
            return Err(ReportError::Validation(fields));
        }

        let mut filter = HistoryFilter {
            integrator: non_empty(&self.integrator),
            operator: non_empty(&self.operator),
            game: non_empty(&self.game),
            starting_from: self.starting_from,
            ending_at: self.ending_at,
            session_token: non_empty(&self.session_token),
            round_id: non_empty(&self.round_id),
            host: non_empty(&self.host),
            external_user_id: non_empty(&self.external_user_id),
            is_demo: self.is_demo,
            rtp_from: self.rtp_from,
            convert_currency: currency.unwrap_or_default(),
            games_whitelist: split_list(self.games.as_deref()),
            is_pfr: false,
            group_by,
            segment: None,
            limit,
            offset,
        };
        scope.apply(&mut filter)?;
        Ok(filter)
    }
}

impl ReportScope {
    /// Force the organization's own slice onto `filter`
    pub fn apply(&self, filter: &mut HistoryFilter) -> ReportResult<()> {
        match self {
            ReportScope::Unrestricted => {}
            ReportScope::Integrator(name) => filter.integrator = Some(name.clone()),
            ReportScope::Operator(name) => filter.operator = Some(name.clone()),
            ReportScope::Provider(games) => {
                if games.is_empty() {
                    return Err(ReportError::validation("games", "organization owns no games"));
                }
                filter.games_whitelist = if filter.games_whitelist.is_empty() {
                    games.clone()
                } else {
                    filter
                        .games_whitelist
                        .iter()
                        .filter(|g| games.contains(g))
                        .cloned()
                        .collect()
                };
                if filter.games_whitelist.is_empty() {
                    return Err(ReportError::validation("games", "not owned by the organization"));
                }
                if let Some(game) = &filter.game {
                    if !games.contains(game) {
                        return Err(ReportError::validation("game", "not owned by the organization"));
                    }
                }
            }
        }
        Ok(())
    }
}

/// `day`, `week` or `month`
pub fn validate_segment(segment: &str) -> ReportResult<String> {
    let segment = segment.trim().to_lowercase();
    if SEGMENTS.contains(&segment.as_str()) {
        Ok(segment)
    } else {
        Err(ReportError::validation(
            "segment",
            format!("must be one of {}", SEGMENTS.join(", ")),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(currency: &str) -> ReportQuery {
        ReportQuery {
            currency: Some(currency.into()),
            ..ReportQuery::default()
        }
    }

    #[test]
    fn test_currency_is_required() {
        let err = ReportQuery::default()
            .to_history_filter(&ReportScope::Unrestricted)
            .unwrap_err();
        match err {
            ReportError::Validation(fields) => assert_eq!(fields[0].field, "currency"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_integrator_scope_overrides_query() {
        let mut q = query("EUR");
        q.integrator = Some("someone-else".into());
        let filter = q
            .to_history_filter(&ReportScope::Integrator("acme".into()))
            .unwrap();
        assert_eq!(filter.integrator.as_deref(), Some("acme"));
        assert_eq!(filter.convert_currency, "eur");
        assert_eq!(filter.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_provider_scope_intersects_whitelist() {
        let scope = ReportScope::Provider(vec!["book".into(), "fruit".into()]);
        let mut q = query("usd");
        q.games = Some("book, dice".into());
        let filter = q.to_history_filter(&scope).unwrap();
        assert_eq!(filter.games_whitelist, vec!["book".to_string()]);

        q.games = Some("dice".into());
        assert!(q.to_history_filter(&scope).is_err());
        assert!(query("usd").to_history_filter(&ReportScope::Provider(vec![])).is_err());
    }

    #[test]
    fn test_group_by_columns_checked() {
        let mut q = query("usd");
        q.group_by = Some("game, currency".into());
        let filter = q.to_history_filter(&ReportScope::Unrestricted).unwrap();
        assert_eq!(filter.group_by, vec!["game".to_string(), "currency".to_string()]);

        q.group_by = Some("colour".into());
        assert!(q.to_history_filter(&ReportScope::Unrestricted).is_err());
    }

    #[test]
    fn test_segment_values() {
        assert_eq!(validate_segment("Week").unwrap(), "week");
        assert!(validate_segment("year").is_err());
    }
}
