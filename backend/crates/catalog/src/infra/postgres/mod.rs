//! PostgreSQL Repository Implementations
//!
//! One repository type implements every catalog trait; the trait impls are
//! split by area.

mod currencies;
mod dictionaries;
mod games;
mod organizations;
mod rows;

use kernel::pagination::PageRequest;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::entity::PairKind;
use crate::error::CatalogResult;

#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// `SELECT COUNT(*)` with the same whitelisted filters as the page query
async fn count_with_filters(
    pool: &PgPool,
    base: &str,
    request: &PageRequest,
    allowed: &[&str],
) -> CatalogResult<i64> {
    let mut qb = QueryBuilder::<Postgres>::new(base);
    request.push_filters(&mut qb, allowed)?;
    Ok(qb.build_query_scalar::<i64>().fetch_one(pool).await?)
}

/// Link table of a pair kind with its (owner, counterpart) columns
const fn pair_table(kind: PairKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        PairKind::ProviderIntegrator => ("integrator_providers", "provider_id", "integrator_id"),
        PairKind::IntegratorOperator => ("operator_integrators", "integrator_id", "operator_id"),
    }
}

/// Pair rows of one kind joined with both live organizations
fn pair_select(kind: PairKind) -> String {
    let (table, owner, counterpart) = pair_table(kind);
    let kind_code = match kind {
        PairKind::ProviderIntegrator => "provider_integrator",
        PairKind::IntegratorOperator => "integrator_operator",
    };
    format!(
        "SELECT p.id, '{kind_code}' AS kind, \
                o.id AS owner_id, o.name AS owner_name, o.type AS owner_type, \
                c.id AS counterpart_id, c.name AS counterpart_name, c.type AS counterpart_type \
         FROM {table} p \
         JOIN organizations o ON o.id = p.{owner} AND o.deleted_at IS NULL \
         JOIN organizations c ON c.id = p.{counterpart} AND c.deleted_at IS NULL"
    )
}
