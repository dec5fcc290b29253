use kernel::id::{AccountId, GameId, OrganizationId, OrganizationPairId, WagerSetId};
use kernel::pagination::{Direction, Page, PageRequest};
use sqlx::{Postgres, QueryBuilder};

use super::rows::{GAME_COLUMNS, GameRow, ORGANIZATION_COLUMNS, OrganizationRow, PairRow};
use super::{PgCatalogRepository, count_with_filters, pair_select, pair_table};
use crate::domain::entity::{Game, Organization, OrganizationPair, PairKind};
use crate::domain::repository::OrganizationRepository;
use crate::error::{CatalogError, CatalogResult, unique_violation};

const ORGANIZATION_FILTERS: &[&str] = &["name", "type", "status"];
const ORGANIZATION_ORDER: &[&str] = &["name", "type", "status", "created_at"];

impl OrganizationRepository for PgCatalogRepository {
    async fn insert_organization(
        &self,
        organization: &Organization,
        creator: AccountId,
    ) -> CatalogResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, type, status, api_key, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(organization.id)
        .bind(&organization.name)
        .bind(organization.organization_type.as_str())
        .bind(organization.status.code())
        .bind(&organization.api_key)
        .bind(organization.created_at)
        .bind(organization.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, "Organization"))?;

        sqlx::query(
            "INSERT INTO account_organizations (account_id, organization_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(creator)
        .bind(organization.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_organization(&self, organization: &Organization) -> CatalogResult<()> {
        sqlx::query(
            r#"
            UPDATE organizations SET name = $2, status = $3, updated_at = $4
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(organization.id)
        .bind(&organization.name)
        .bind(organization.status.code())
        .bind(organization.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "Organization"))?;
        Ok(())
    }

    async fn find_organization(&self, id: OrganizationId) -> CatalogResult<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            "SELECT {} FROM organizations WHERE id = $1 AND deleted_at IS NULL",
            ORGANIZATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(OrganizationRow::into_organization).transpose()
    }

    async fn list_organizations(&self, request: &PageRequest) -> CatalogResult<Page<Organization>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(ORGANIZATION_COLUMNS)
            .push(" FROM organizations WHERE deleted_at IS NULL");
        request.push_filters(&mut qb, ORGANIZATION_FILTERS)?;
        request.push_page(&mut qb, ORGANIZATION_ORDER, ("name", Direction::Asc), "id")?;

        let organizations = qb
            .build_query_as::<OrganizationRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(OrganizationRow::into_organization)
            .collect::<CatalogResult<Vec<_>>>()?;

        let total = count_with_filters(
            &self.pool,
            "SELECT COUNT(*) FROM organizations WHERE deleted_at IS NULL",
            request,
            ORGANIZATION_FILTERS,
        )
        .await?;

        Ok(Page::new(organizations, total, request))
    }

    async fn delete_organization(
        &self,
        id: OrganizationId,
        requester: AccountId,
    ) -> CatalogResult<()> {
        let mut tx = self.pool.begin().await?;

        let attached: Vec<AccountId> = sqlx::query_scalar(
            "SELECT account_id FROM account_organizations WHERE organization_id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        Organization::ensure_deletable(&attached, requester)?;

        for statement in [
            "DELETE FROM account_roles WHERE role_id IN (SELECT id FROM roles WHERE organization_id = $1)",
            "DELETE FROM role_permissions WHERE role_id IN (SELECT id FROM roles WHERE organization_id = $1)",
            "DELETE FROM roles WHERE organization_id = $1",
            "DELETE FROM account_organizations WHERE organization_id = $1",
            "DELETE FROM account_operators WHERE operator_id = $1",
            "DELETE FROM integrator_game_wager_sets WHERE integrator_id = $1",
            "DELETE FROM integrator_games WHERE integrator_id = $1",
            "DELETE FROM integrator_providers WHERE provider_id = $1 OR integrator_id = $1",
            "DELETE FROM operator_integrators WHERE integrator_id = $1 OR operator_id = $1",
        ] {
            sqlx::query(statement).bind(id).execute(&mut *tx).await?;
        }

        let affected = sqlx::query(
            "UPDATE organizations SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if affected == 0 {
            return Err(CatalogError::OrganizationNotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_pairs(
        &self,
        kind: PairKind,
        owner: OrganizationId,
    ) -> CatalogResult<Vec<OrganizationPair>> {
        let (_, owner_column, _) = pair_table(kind);
        let sql = format!(
            "{} WHERE p.{} = $1 ORDER BY c.name",
            pair_select(kind),
            owner_column
        );
        sqlx::query_as::<_, PairRow>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(PairRow::into_pair)
            .collect()
    }

    async fn find_pair(&self, id: OrganizationPairId) -> CatalogResult<Option<OrganizationPair>> {
        let sql = format!(
            "{} WHERE p.id = $1 UNION ALL {} WHERE p.id = $1",
            pair_select(PairKind::ProviderIntegrator),
            pair_select(PairKind::IntegratorOperator)
        );
        let row = sqlx::query_as::<_, PairRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(PairRow::into_pair).transpose()
    }

    async fn find_pair_by_sides(
        &self,
        kind: PairKind,
        owner: OrganizationId,
        counterpart: OrganizationId,
    ) -> CatalogResult<Option<OrganizationPair>> {
        let (_, owner_column, counterpart_column) = pair_table(kind);
        let sql = format!(
            "{} WHERE p.{} = $1 AND p.{} = $2",
            pair_select(kind),
            owner_column,
            counterpart_column
        );
        let row = sqlx::query_as::<_, PairRow>(&sql)
            .bind(owner)
            .bind(counterpart)
            .fetch_optional(&self.pool)
            .await?;
        row.map(PairRow::into_pair).transpose()
    }

    async fn insert_pair(
        &self,
        kind: PairKind,
        owner: OrganizationId,
        counterpart: OrganizationId,
    ) -> CatalogResult<OrganizationPairId> {
        let (table, owner_column, counterpart_column) = pair_table(kind);
        let id = OrganizationPairId::new();
        let sql = format!(
            "INSERT INTO {} (id, {}, {}) VALUES ($1, $2, $3)",
            table, owner_column, counterpart_column
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(owner)
            .bind(counterpart)
            .execute(&self.pool)
            .await
            .map_err(|e| match unique_violation(e, "Pair") {
                CatalogError::AlreadyExists(_) => CatalogError::PairExists,
                other => other,
            })?;
        Ok(id)
    }

    async fn delete_pair(
        &self,
        kind: PairKind,
        owner: OrganizationId,
        counterpart: OrganizationId,
    ) -> CatalogResult<bool> {
        let (table, owner_column, counterpart_column) = pair_table(kind);
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1 AND {} = $2",
            table, owner_column, counterpart_column
        );
        let affected = sqlx::query(&sql)
            .bind(owner)
            .bind(counterpart)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn assigned_games(&self, integrator: OrganizationId) -> CatalogResult<Vec<Game>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(GAME_COLUMNS)
            .push(
                " FROM games WHERE deleted_at IS NULL \
                 AND id IN (SELECT game_id FROM integrator_games WHERE integrator_id = ",
            )
            .push_bind(integrator)
            .push(") ORDER BY name");
        let rows = qb.build_query_as::<GameRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Game::from).collect())
    }

    async fn assign_game(&self, integrator: OrganizationId, game: GameId) -> CatalogResult<()> {
        sqlx::query(
            "INSERT INTO integrator_games (integrator_id, game_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(integrator)
        .bind(game)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn unassign_game(&self, integrator: OrganizationId, game: GameId) -> CatalogResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "DELETE FROM integrator_game_wager_sets WHERE integrator_id = $1 AND game_id = $2",
        )
        .bind(integrator)
        .bind(game)
        .execute(&mut *tx)
        .await?;
        let affected = sqlx::query(
            "DELETE FROM integrator_games WHERE integrator_id = $1 AND game_id = $2",
        )
        .bind(integrator)
        .bind(game)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        tx.commit().await?;
        Ok(affected > 0)
    }

    async fn assign_wager_set(
        &self,
        integrator: OrganizationId,
        game: GameId,
        wager_set: WagerSetId,
    ) -> CatalogResult<()> {
        sqlx::query(
            r#"
            INSERT INTO integrator_game_wager_sets (integrator_id, game_id, wager_set_id)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(integrator)
        .bind(game)
        .bind(wager_set)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn unassign_wager_set(
        &self,
        integrator: OrganizationId,
        game: GameId,
        wager_set: WagerSetId,
    ) -> CatalogResult<bool> {
        let affected = sqlx::query(
            r#"
            DELETE FROM integrator_game_wager_sets
            WHERE integrator_id = $1 AND game_id = $2 AND wager_set_id = $3
            "#,
        )
        .bind(integrator)
        .bind(game)
        .bind(wager_set)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }
}
