use std::collections::HashMap;

use kernel::id::{GameId, WagerSetId};
use kernel::pagination::{Direction, Page, PageRequest};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::rows::{GAME_COLUMNS, GameRow, WAGER_SET_COLUMNS, WagerSetRow};
use super::{PgCatalogRepository, count_with_filters};
use crate::domain::entity::{Game, PublicGame, WagerSet};
use crate::domain::repository::{GameRepository, WagerSetRepository};
use crate::error::{CatalogResult, unique_violation};

const GAME_FILTERS: &[&str] = &["organization_id", "name", "is_public", "is_demo", "wager_set_id"];
const GAME_ORDER: &[&str] = &["name", "created_at", "updated_at"];

const WAGER_SET_FILTERS: &[&str] = &["organization_id", "name", "default_wager"];
const WAGER_SET_ORDER: &[&str] = &["name", "default_wager", "created_at"];

impl PgCatalogRepository {
    async fn fetch_game(&self, column: &str, value: String) -> CatalogResult<Option<Game>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(GAME_COLUMNS)
            .push(" FROM games WHERE deleted_at IS NULL AND ")
            .push(column)
            .push("::text = ")
            .push_bind(value);
        let row = qb
            .build_query_as::<GameRow>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Game::from))
    }
}

// ============================================================================
// Game Repository Implementation
// ============================================================================

impl GameRepository for PgCatalogRepository {
    async fn insert_game(&self, game: &Game) -> CatalogResult<()> {
        sqlx::query(
            r#"
            INSERT INTO games (
                id, organization_id, name, jurisdictions, currencies, languages, user_locales,
                api_url, client_url, wager_set_id, is_public, is_statistic_shown, is_demo,
                is_freespins, online_volatility, rtp, volatility, available_rtp,
                available_volatility, available_wager_sets, gamble_double_up, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
                $19, $20, $21, $22, $23
            )
            "#,
        )
        .bind(game.id)
        .bind(game.organization_id)
        .bind(&game.name)
        .bind(&game.jurisdictions)
        .bind(&game.currencies)
        .bind(&game.languages)
        .bind(&game.user_locales)
        .bind(&game.api_url)
        .bind(&game.client_url)
        .bind(game.wager_set_id)
        .bind(game.is_public)
        .bind(game.is_statistic_shown)
        .bind(game.is_demo)
        .bind(game.is_freespins)
        .bind(game.online_volatility)
        .bind(game.rtp)
        .bind(&game.volatility)
        .bind(&game.available_rtp)
        .bind(&game.available_volatility)
        .bind(&game.available_wager_sets)
        .bind(game.gamble_double_up)
        .bind(game.created_at)
        .bind(game.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "Game"))?;
        Ok(())
    }

    async fn update_game(&self, game: &Game) -> CatalogResult<()> {
        sqlx::query(
            r#"
            UPDATE games SET
                organization_id = $2,
                name = $3,
                jurisdictions = $4,
                currencies = $5,
                languages = $6,
                user_locales = $7,
                api_url = $8,
                client_url = $9,
                wager_set_id = $10,
                is_public = $11,
                is_statistic_shown = $12,
                is_demo = $13,
                is_freespins = $14,
                online_volatility = $15,
                rtp = $16,
                volatility = $17,
                available_rtp = $18,
                available_volatility = $19,
                available_wager_sets = $20,
                gamble_double_up = $21,
                updated_at = $22
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(game.id)
        .bind(game.organization_id)
        .bind(&game.name)
        .bind(&game.jurisdictions)
        .bind(&game.currencies)
        .bind(&game.languages)
        .bind(&game.user_locales)
        .bind(&game.api_url)
        .bind(&game.client_url)
        .bind(game.wager_set_id)
        .bind(game.is_public)
        .bind(game.is_statistic_shown)
        .bind(game.is_demo)
        .bind(game.is_freespins)
        .bind(game.online_volatility)
        .bind(game.rtp)
        .bind(&game.volatility)
        .bind(&game.available_rtp)
        .bind(&game.available_volatility)
        .bind(&game.available_wager_sets)
        .bind(game.gamble_double_up)
        .bind(game.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "Game"))?;
        Ok(())
    }

    async fn find_game(&self, id: GameId) -> CatalogResult<Option<Game>> {
        self.fetch_game("id", id.to_string()).await
    }

    async fn find_game_by_name(&self, name: &str) -> CatalogResult<Option<Game>> {
        self.fetch_game("name", name.to_string()).await
    }

    async fn list_games(&self, request: &PageRequest) -> CatalogResult<Page<Game>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(GAME_COLUMNS).push(" FROM games WHERE deleted_at IS NULL");
        request.push_filters(&mut qb, GAME_FILTERS)?;
        request.push_page(&mut qb, GAME_ORDER, ("name", Direction::Asc), "id")?;

        let rows = qb.build_query_as::<GameRow>().fetch_all(&self.pool).await?;
        let total = count_with_filters(
            &self.pool,
            "SELECT COUNT(*) FROM games WHERE deleted_at IS NULL",
            request,
            GAME_FILTERS,
        )
        .await?;

        Ok(Page::new(
            rows.into_iter().map(Game::from).collect(),
            total,
            request,
        ))
    }

    async fn delete_game(&self, id: GameId) -> CatalogResult<bool> {
        let mut tx = self.pool.begin().await?;
        let affected =
            sqlx::query("UPDATE games SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        sqlx::query("DELETE FROM integrator_game_wager_sets WHERE game_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM integrator_games WHERE game_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(affected > 0)
    }

    async fn public_games(&self) -> CatalogResult<Vec<PublicGame>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(GAME_COLUMNS)
            .push(" FROM games WHERE deleted_at IS NULL AND is_public ORDER BY name");
        let games: Vec<Game> = qb
            .build_query_as::<GameRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Game::from)
            .collect();

        let mut ids: Vec<WagerSetId> = games.iter().map(|g| g.wager_set_id).collect();
        ids.sort();
        ids.dedup();
        let wager_sets: HashMap<WagerSetId, WagerSet> = self
            .find_wager_sets(&ids)
            .await?
            .into_iter()
            .map(|w| (w.id, w))
            .collect();

        Ok(games
            .into_iter()
            .filter_map(|game| {
                let wager_set = wager_sets.get(&game.wager_set_id)?.clone();
                Some(PublicGame { game, wager_set })
            })
            .collect())
    }
}

// ============================================================================
// Wager Set Repository Implementation
// ============================================================================

impl WagerSetRepository for PgCatalogRepository {
    async fn insert_wager_set(&self, wager_set: &WagerSet) -> CatalogResult<()> {
        sqlx::query(
            r#"
            INSERT INTO wager_sets (id, organization_id, name, wager_levels, default_wager, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(wager_set.id)
        .bind(wager_set.organization_id)
        .bind(&wager_set.name)
        .bind(&wager_set.wager_levels)
        .bind(wager_set.default_wager)
        .bind(wager_set.created_at)
        .bind(wager_set.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "Wager set"))?;
        Ok(())
    }

    async fn update_wager_set(&self, wager_set: &WagerSet) -> CatalogResult<()> {
        sqlx::query(
            r#"
            UPDATE wager_sets SET
                organization_id = $2, name = $3, wager_levels = $4, default_wager = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(wager_set.id)
        .bind(wager_set.organization_id)
        .bind(&wager_set.name)
        .bind(&wager_set.wager_levels)
        .bind(wager_set.default_wager)
        .bind(wager_set.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "Wager set"))?;
        Ok(())
    }

    async fn find_wager_set(&self, id: WagerSetId) -> CatalogResult<Option<WagerSet>> {
        let row = sqlx::query_as::<_, WagerSetRow>(&format!(
            "SELECT {} FROM wager_sets WHERE id = $1",
            WAGER_SET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(WagerSet::from))
    }

    async fn find_wager_sets(&self, ids: &[WagerSetId]) -> CatalogResult<Vec<WagerSet>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_uuid()).collect();
        let rows = sqlx::query_as::<_, WagerSetRow>(&format!(
            "SELECT {} FROM wager_sets WHERE id = ANY($1) ORDER BY name",
            WAGER_SET_COLUMNS
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(WagerSet::from).collect())
    }

    async fn list_wager_sets(&self, request: &PageRequest) -> CatalogResult<Page<WagerSet>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(WAGER_SET_COLUMNS).push(" FROM wager_sets WHERE TRUE");
        request.push_filters(&mut qb, WAGER_SET_FILTERS)?;
        request.push_page(&mut qb, WAGER_SET_ORDER, ("name", Direction::Asc), "id")?;

        let rows = qb
            .build_query_as::<WagerSetRow>()
            .fetch_all(&self.pool)
            .await?;
        let total = count_with_filters(
            &self.pool,
            "SELECT COUNT(*) FROM wager_sets WHERE TRUE",
            request,
            WAGER_SET_FILTERS,
        )
        .await?;

        Ok(Page::new(
            rows.into_iter().map(WagerSet::from).collect(),
            total,
            request,
        ))
    }

    async fn delete_wager_set(&self, id: WagerSetId) -> CatalogResult<bool> {
        let affected = sqlx::query("DELETE FROM wager_sets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}
