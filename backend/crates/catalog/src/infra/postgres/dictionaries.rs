use super::PgCatalogRepository;
use crate::domain::entity::Dictionary;
use crate::domain::repository::DictionaryRepository;
use crate::error::CatalogResult;

impl DictionaryRepository for PgCatalogRepository {
    async fn dictionary_values(&self, dictionary: Dictionary) -> CatalogResult<Vec<String>> {
        let entries: Option<Vec<String>> =
            sqlx::query_scalar("SELECT entries FROM dictionaries WHERE name = $1")
                .bind(dictionary.name())
                .fetch_optional(&self.pool)
                .await?;
        Ok(entries.unwrap_or_default())
    }

    async fn append_dictionary_value(
        &self,
        dictionary: Dictionary,
        value: &str,
    ) -> CatalogResult<Vec<String>> {
        let entries: Vec<String> = sqlx::query_scalar(
            r#"
            INSERT INTO dictionaries (name, entries) VALUES ($1, ARRAY[$2::text])
            ON CONFLICT (name) DO UPDATE SET entries = CASE
                WHEN $2::text = ANY(dictionaries.entries) THEN dictionaries.entries
                ELSE array_append(dictionaries.entries, $2::text)
            END
            RETURNING entries
            "#,
        )
        .bind(dictionary.name())
        .bind(value)
        .fetch_one(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn remove_dictionary_value(
        &self,
        dictionary: Dictionary,
        value: &str,
    ) -> CatalogResult<bool> {
        let affected = sqlx::query(
            r#"
            UPDATE dictionaries SET entries = array_remove(entries, $2::text)
            WHERE name = $1 AND $2::text = ANY(entries)
            "#,
        )
        .bind(dictionary.name())
        .bind(value)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }
}
