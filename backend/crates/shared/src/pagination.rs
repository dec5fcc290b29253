//! Pagination
//!
//! Shared list-endpoint vocabulary: `limit`, `offset` (or `page`), `order`
//! and arbitrary `filters[k]` query parameters.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::app_error::{AppError, AppResult};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 1000;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Parsed pagination request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
    pub order: Option<String>,
    pub filters: BTreeMap<String, String>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            order: None,
            filters: BTreeMap::new(),
        }
    }
}

impl PageRequest {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit,
            offset,
            ..Default::default()
        }
    }

    /// Build from raw query parameters
    ///
    /// `page` is 1-based and only consulted when `offset` is absent.
    pub fn from_query(query: &HashMap<String, String>) -> AppResult<Self> {
        let limit = match query.get("limit") {
            Some(v) => parse_non_negative("limit", v)?,
            None => DEFAULT_LIMIT,
        };
        if limit == 0 || limit > MAX_LIMIT {
            return Err(AppError::bad_request(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }

        let offset = match (query.get("offset"), query.get("page")) {
            (Some(v), _) => parse_non_negative("offset", v)?,
            (None, Some(p)) => {
                let page = parse_non_negative("page", p)?.max(1);
                (page - 1)
                    .checked_mul(limit)
                    .ok_or_else(|| AppError::bad_request("page is out of range"))?
            }
            (None, None) => 0,
        };

        let filters = query
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix("filters[")
                    .and_then(|rest| rest.strip_suffix(']'))
                    .map(|name| (name.to_string(), v.clone()))
            })
            .collect();

        Ok(Self {
            limit,
            offset,
            order: query.get("order").filter(|o| !o.trim().is_empty()).cloned(),
            filters,
        })
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    /// Filters restricted to a whitelist; unknown keys are rejected
    pub fn checked_filters(&self, allowed: &[&str]) -> AppResult<Vec<(&str, &str)>> {
        self.filters
            .iter()
            .map(|(k, v)| {
                if allowed.contains(&k.as_str()) {
                    Ok((k.as_str(), v.as_str()))
                } else {
                    Err(AppError::bad_request(format!("Unknown filter: {}", k)))
                }
            })
            .collect()
    }

    /// Resolve `order` against a whitelist of columns
    ///
    /// Accepts `column`, `column asc|desc` or `-column`.
    pub fn order_by<'a>(
        &self,
        allowed: &[&'a str],
        default: (&'a str, Direction),
    ) -> AppResult<(&'a str, Direction)> {
        let Some(raw) = self.order.as_deref() else {
            return Ok(default);
        };
        let raw = raw.trim();
        let (column, direction) = if let Some(col) = raw.strip_prefix('-') {
            (col, Direction::Desc)
        } else {
            match raw.split_once(char::is_whitespace) {
                Some((col, dir)) => match dir.trim().to_ascii_lowercase().as_str() {
                    "asc" => (col, Direction::Asc),
                    "desc" => (col, Direction::Desc),
                    _ => return Err(AppError::bad_request(format!("Invalid order: {}", raw))),
                },
                None => (raw, Direction::Asc),
            }
        };
        allowed
            .iter()
            .find(|a| **a == column)
            .map(|a| (*a, direction))
            .ok_or_else(|| AppError::bad_request(format!("Invalid order column: {}", column)))
    }

    /// `ORDER BY` body with the row key appended so equal sort values page stably
    ///
    /// `key` is the table's unique key, e.g. `id` or `organization_pair_id, title`.
    pub fn order_clause(
        &self,
        allowed: &[&str],
        default: (&str, Direction),
        key: &str,
    ) -> AppResult<String> {
        let (column, direction) = self.order_by(allowed, default)?;
        if column == key {
            return Ok(format!("{} {}", column, direction.as_sql()));
        }
        let key = key
            .split(',')
            .map(|k| format!("{} ASC", k.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("{} {}, {}", column, direction.as_sql(), key))
    }
}

fn parse_non_negative(name: &str, value: &str) -> AppResult<i64> {
    value
        .parse::<i64>()
        .ok()
        .filter(|v| *v >= 0)
        .ok_or_else(|| AppError::bad_request(format!("{} must be a non-negative integer", name)))
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: &PageRequest) -> Self {
        Self {
            items,
            total,
            limit: request.limit,
            offset: request.offset,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// Paginate an already-ordered in-memory list
pub fn paginate_slice<T: Clone>(all: &[T], request: &PageRequest) -> Page<T> {
    let start = (request.offset.max(0) as usize).min(all.len());
    let end = start.saturating_add(request.limit.max(0) as usize).min(all.len());
    Page::new(all[start..end].to_vec(), all.len() as i64, request)
}

#[cfg(feature = "sqlx")]
mod sql {
    use super::{Direction, PageRequest};
    use crate::error::app_error::AppResult;
    use sqlx::{Postgres, QueryBuilder};

    impl PageRequest {
        /// Append `AND col::text = $n` for each whitelisted filter
        ///
        /// The builder must already contain a `WHERE` clause.
        pub fn push_filters(
            &self,
            qb: &mut QueryBuilder<'_, Postgres>,
            allowed: &[&str],
        ) -> AppResult<()> {
            for (column, value) in self.checked_filters(allowed)? {
                qb.push(" AND ")
                    .push(column)
                    .push("::text = ")
                    .push_bind(value.to_string());
            }
            Ok(())
        }

        /// Append `ORDER BY ... LIMIT ... OFFSET ...`, tie-broken on `key`
        pub fn push_page(
            &self,
            qb: &mut QueryBuilder<'_, Postgres>,
            allowed_order: &[&str],
            default: (&str, Direction),
            key: &str,
        ) -> AppResult<()> {
            let order = self.order_clause(allowed_order, default, key)?;
            qb.push(" ORDER BY ")
                .push(order)
                .push(" LIMIT ")
                .push_bind(self.limit)
                .push(" OFFSET ")
                .push_bind(self.offset);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let req = PageRequest::from_query(&HashMap::new()).unwrap();
        assert_eq!(req.limit, DEFAULT_LIMIT);
        assert_eq!(req.offset, 0);
        assert!(req.filters.is_empty());
    }

    #[test]
    fn test_page_translates_to_offset() {
        let req = PageRequest::from_query(&query(&[("limit", "10"), ("page", "3")])).unwrap();
        assert_eq!(req.offset, 20);

        let req =
            PageRequest::from_query(&query(&[("limit", "10"), ("page", "3"), ("offset", "5")]))
                .unwrap();
        assert_eq!(req.offset, 5);
    }

    #[test]
    fn test_huge_page_is_rejected() {
        let max = i64::MAX.to_string();
        let err = PageRequest::from_query(&query(&[("limit", "1000"), ("page", max.as_str())]))
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        let req = PageRequest::from_query(&query(&[("limit", "1"), ("page", max.as_str())])).unwrap();
        assert_eq!(req.offset, i64::MAX - 1);
    }

    #[test]
    fn test_invalid_limit() {
        assert!(PageRequest::from_query(&query(&[("limit", "0")])).is_err());
        assert!(PageRequest::from_query(&query(&[("limit", "-1")])).is_err());
        assert!(PageRequest::from_query(&query(&[("limit", "5000")])).is_err());
    }

    #[test]
    fn test_filters_extracted_and_checked() {
        let req = PageRequest::from_query(&query(&[
            ("filters[name]", "acme"),
            ("filters[type]", "provider"),
        ]))
        .unwrap();
        assert_eq!(req.filter("name"), Some("acme"));
        assert!(req.checked_filters(&["name", "type"]).is_ok());
        assert!(req.checked_filters(&["name"]).is_err());
    }

    #[test]
    fn test_order_by() {
        let allowed = ["name", "created_at"];
        let default = ("created_at", Direction::Desc);

        let req = PageRequest::default();
        assert_eq!(req.order_by(&allowed, default).unwrap(), default);

        let req = PageRequest {
            order: Some("name desc".into()),
            ..Default::default()
        };
        assert_eq!(req.order_by(&allowed, default).unwrap(), ("name", Direction::Desc));

        let req = PageRequest {
            order: Some("-name".into()),
            ..Default::default()
        };
        assert_eq!(req.order_by(&allowed, default).unwrap(), ("name", Direction::Desc));

        let req = PageRequest {
            order: Some("password; drop table".into()),
            ..Default::default()
        };
        assert!(req.order_by(&allowed, default).is_err());
    }

    #[test]
    fn test_order_clause_appends_row_key() {
        let allowed = ["name", "created_at"];
        let default = ("name", Direction::Asc);

        let req = PageRequest::default();
        assert_eq!(req.order_clause(&allowed, default, "id").unwrap(), "name ASC, id ASC");

        let req = PageRequest {
            order: Some("-created_at".into()),
            ..Default::default()
        };
        assert_eq!(
            req.order_clause(&allowed, default, "organization_pair_id, title")
                .unwrap(),
            "created_at DESC, organization_pair_id ASC, title ASC"
        );

        // Already unique, nothing to add
        let req = PageRequest {
            order: Some("title desc".into()),
            ..Default::default()
        };
        assert_eq!(
            req.order_clause(&["title", "alias"], ("title", Direction::Asc), "title")
                .unwrap(),
            "title DESC"
        );
    }

    #[test]
    fn test_consecutive_pages_cover_everything() {
        let all: Vec<i32> = (0..47).collect();
        let limit = 10;
        let mut collected = Vec::new();
        let mut offset = 0;
        loop {
            let page = paginate_slice(&all, &PageRequest::new(limit, offset));
            assert_eq!(page.total, 47);
            if page.items.is_empty() {
                break;
            }
            collected.extend(page.items);
            offset += limit;
        }
        assert_eq!(collected, all);
    }

    #[test]
    fn test_offset_past_end_is_empty() {
        let all = vec![1, 2, 3];
        let page = paginate_slice(&all, &PageRequest::new(10, 100));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
    }
}
