use kernel::id::{CurrencySetId, OrganizationPairId};
use kernel::pagination::{Direction, Page, PageRequest};
use sqlx::{Postgres, QueryBuilder};

use super::rows::{
    CURRENCY_COLUMNS, CURRENCY_SET_COLUMNS, CurrencyRow, CurrencySetRow, MULTIPLIER_COLUMNS,
    MultiplierRow, PairedMultiplierRow,
};
use super::{PgCatalogRepository, count_with_filters, pair_select};
use crate::domain::entity::{
    Currency, CurrencyMultiplier, CurrencySet, PairKind, PairedMultiplier,
};
use crate::domain::repository::{CurrencyRepository, CurrencySetRepository};
use crate::error::{CatalogResult, unique_violation};

const CURRENCY_FILTERS: &[&str] = &["title", "alias", "type", "base_currency"];
const CURRENCY_ORDER: &[&str] = &["title", "alias", "type"];

const MULTIPLIER_FILTERS: &[&str] = &["organization_pair_id", "title", "synonym"];
const MULTIPLIER_ORDER: &[&str] = &["title", "multiplier", "organization_pair_id"];

const CURRENCY_SET_FILTERS: &[&str] = &["organization_id", "name"];
const CURRENCY_SET_ORDER: &[&str] = &["name"];

// ============================================================================
// Currency Repository Implementation
// ============================================================================

impl CurrencyRepository for PgCatalogRepository {
    async fn insert_currency(&self, currency: &Currency) -> CatalogResult<()> {
        sqlx::query(
            "INSERT INTO currencies (title, alias, type, base_currency, alias_rate) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&currency.title)
        .bind(&currency.alias)
        .bind(currency.currency_type.code())
        .bind(&currency.base_currency)
        .bind(currency.alias_rate)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "Currency"))?;
        Ok(())
    }

    async fn update_currency(&self, currency: &Currency) -> CatalogResult<bool> {
        let affected = sqlx::query(
            "UPDATE currencies SET alias = $2, type = $3, base_currency = $4, alias_rate = $5 \
             WHERE title = $1",
        )
        .bind(&currency.title)
        .bind(&currency.alias)
        .bind(currency.currency_type.code())
        .bind(&currency.base_currency)
        .bind(currency.alias_rate)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }

    async fn find_currency(&self, title: &str) -> CatalogResult<Option<Currency>> {
        let row = sqlx::query_as::<_, CurrencyRow>(&format!(
            "SELECT {} FROM currencies WHERE title = $1",
            CURRENCY_COLUMNS
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;
        row.map(CurrencyRow::into_currency).transpose()
    }

    async fn list_currencies(&self, request: &PageRequest) -> CatalogResult<Page<Currency>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(CURRENCY_COLUMNS).push(" FROM currencies WHERE TRUE");
        request.push_filters(&mut qb, CURRENCY_FILTERS)?;
        request.push_page(&mut qb, CURRENCY_ORDER, ("title", Direction::Asc), "title")?;

        let currencies = qb
            .build_query_as::<CurrencyRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(CurrencyRow::into_currency)
            .collect::<CatalogResult<Vec<_>>>()?;
        let total = count_with_filters(
            &self.pool,
            "SELECT COUNT(*) FROM currencies WHERE TRUE",
            request,
            CURRENCY_FILTERS,
        )
        .await?;

        Ok(Page::new(currencies, total, request))
    }

    async fn delete_currency(&self, title: &str) -> CatalogResult<bool> {
        let affected = sqlx::query("DELETE FROM currencies WHERE title = $1")
            .bind(title)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn currency_titles(&self) -> CatalogResult<Vec<String>> {
        Ok(
            sqlx::query_scalar::<_, String>("SELECT title FROM currencies ORDER BY title")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn count_multipliers(&self, title: &str) -> CatalogResult<i64> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM currency_multipliers WHERE title = $1")
                .bind(title)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn count_dependents(&self, title: &str) -> CatalogResult<i64> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM currencies WHERE base_currency = $1")
                .bind(title)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn insert_multiplier(&self, multiplier: &CurrencyMultiplier) -> CatalogResult<()> {
        sqlx::query(
            "INSERT INTO currency_multipliers (organization_pair_id, title, multiplier, synonym) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(multiplier.organization_pair_id)
        .bind(&multiplier.title)
        .bind(multiplier.multiplier)
        .bind(&multiplier.synonym)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "Currency multiplier"))?;
        Ok(())
    }

    async fn update_multiplier(&self, multiplier: &CurrencyMultiplier) -> CatalogResult<bool> {
        let affected = sqlx::query(
            "UPDATE currency_multipliers SET multiplier = $3, synonym = $4 \
             WHERE organization_pair_id = $1 AND title = $2",
        )
        .bind(multiplier.organization_pair_id)
        .bind(&multiplier.title)
        .bind(multiplier.multiplier)
        .bind(&multiplier.synonym)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }

    async fn find_multiplier(
        &self,
        pair: OrganizationPairId,
        title: &str,
    ) -> CatalogResult<Option<CurrencyMultiplier>> {
        let row = sqlx::query_as::<_, MultiplierRow>(&format!(
            "SELECT {} FROM currency_multipliers WHERE organization_pair_id = $1 AND title = $2",
            MULTIPLIER_COLUMNS
        ))
        .bind(pair)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(CurrencyMultiplier::from))
    }

    async fn list_multipliers(
        &self,
        request: &PageRequest,
    ) -> CatalogResult<Page<CurrencyMultiplier>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(MULTIPLIER_COLUMNS)
            .push(" FROM currency_multipliers WHERE TRUE");
        request.push_filters(&mut qb, MULTIPLIER_FILTERS)?;
        request.push_page(
            &mut qb,
            MULTIPLIER_ORDER,
            ("title", Direction::Asc),
            "organization_pair_id, title",
        )?;

        let rows = qb
            .build_query_as::<MultiplierRow>()
            .fetch_all(&self.pool)
            .await?;
        let total = count_with_filters(
            &self.pool,
            "SELECT COUNT(*) FROM currency_multipliers WHERE TRUE",
            request,
            MULTIPLIER_FILTERS,
        )
        .await?;

        Ok(Page::new(
            rows.into_iter().map(CurrencyMultiplier::from).collect(),
            total,
            request,
        ))
    }

    async fn delete_multiplier(&self, pair: OrganizationPairId, title: &str) -> CatalogResult<bool> {
        let affected = sqlx::query(
            "DELETE FROM currency_multipliers WHERE organization_pair_id = $1 AND title = $2",
        )
        .bind(pair)
        .bind(title)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }

    async fn pair_multipliers(
        &self,
        pair: OrganizationPairId,
    ) -> CatalogResult<Vec<CurrencyMultiplier>> {
        let rows = sqlx::query_as::<_, MultiplierRow>(&format!(
            "SELECT {} FROM currency_multipliers WHERE organization_pair_id = $1 ORDER BY title",
            MULTIPLIER_COLUMNS
        ))
        .bind(pair)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CurrencyMultiplier::from).collect())
    }

    async fn upsert_multipliers(&self, multipliers: &[CurrencyMultiplier]) -> CatalogResult<()> {
        let mut tx = self.pool.begin().await?;
        for multiplier in multipliers {
            sqlx::query(
                r#"
                INSERT INTO currency_multipliers (organization_pair_id, title, multiplier, synonym)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (organization_pair_id, title)
                DO UPDATE SET multiplier = EXCLUDED.multiplier, synonym = EXCLUDED.synonym
                "#,
            )
            .bind(multiplier.organization_pair_id)
            .bind(&multiplier.title)
            .bind(multiplier.multiplier)
            .bind(&multiplier.synonym)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn paired_multipliers(&self) -> CatalogResult<Vec<PairedMultiplier>> {
        let sql = format!(
            "SELECT pair.*, m.organization_pair_id, m.title, m.multiplier, m.synonym \
             FROM ({}) pair \
             JOIN currency_multipliers m ON m.organization_pair_id = pair.id \
             ORDER BY pair.id, m.title",
            pair_select(PairKind::ProviderIntegrator)
        );
        sqlx::query_as::<_, PairedMultiplierRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(PairedMultiplierRow::into_paired)
            .collect()
    }
}

// ============================================================================
// Currency Set Repository Implementation
// ============================================================================

impl CurrencySetRepository for PgCatalogRepository {
    async fn insert_currency_set(&self, set: &CurrencySet) -> CatalogResult<()> {
        sqlx::query(
            "INSERT INTO currency_sets (id, organization_id, name, currencies) VALUES ($1, $2, $3, $4)",
        )
        .bind(set.id)
        .bind(set.organization_id)
        .bind(&set.name)
        .bind(&set.currencies)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "Currency set"))?;
        Ok(())
    }

    async fn update_currency_set(&self, set: &CurrencySet) -> CatalogResult<bool> {
        let affected = sqlx::query(
            "UPDATE currency_sets SET organization_id = $2, name = $3, currencies = $4 WHERE id = $1",
        )
        .bind(set.id)
        .bind(set.organization_id)
        .bind(&set.name)
        .bind(&set.currencies)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "Currency set"))?
        .rows_affected();
        Ok(affected > 0)
    }

    async fn find_currency_set(&self, id: CurrencySetId) -> CatalogResult<Option<CurrencySet>> {
        let row = sqlx::query_as::<_, CurrencySetRow>(&format!(
            "SELECT {} FROM currency_sets WHERE id = $1",
            CURRENCY_SET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(CurrencySet::from))
    }

    async fn list_currency_sets(&self, request: &PageRequest) -> CatalogResult<Page<CurrencySet>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(CURRENCY_SET_COLUMNS)
            .push(" FROM currency_sets WHERE TRUE");
        request.push_filters(&mut qb, CURRENCY_SET_FILTERS)?;
        request.push_page(&mut qb, CURRENCY_SET_ORDER, ("name", Direction::Asc), "id")?;

        let rows = qb
            .build_query_as::<CurrencySetRow>()
            .fetch_all(&self.pool)
            .await?;
        let total = count_with_filters(
            &self.pool,
            "SELECT COUNT(*) FROM currency_sets WHERE TRUE",
            request,
            CURRENCY_SET_FILTERS,
        )
        .await?;

        Ok(Page::new(
            rows.into_iter().map(CurrencySet::from).collect(),
            total,
            request,
        ))
    }

    async fn delete_currency_set(&self, id: CurrencySetId) -> CatalogResult<bool> {
        let affected = sqlx::query("DELETE FROM currency_sets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}
