use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::AppResult,
    use_cases::api_key::{ApiKey, ApiKeyRepo, NewApiKey},
};

const COLUMNS: &str = r#"id, name, value, usage, "limit", user_id, created_at"#;
const COLUMNS_NO_LIMIT: &str =
    r#"id, name, value, usage, NULL::int8 AS "limit", user_id, created_at"#;

impl PostgresPersistence {
    /// Whether the deployed schema carries the optional "limit" column.
    /// Negotiated once against information_schema instead of sniffing
    /// error text after a failed query; the answer is cached for the
    /// lifetime of the process.
    async fn has_limit_column(&self) -> AppResult<bool> {
        let present = self
            .limit_column
            .get_or_try_init(|| async {
                let row: Option<(i64,)> = sqlx::query_as(
                    r#"SELECT 1::int8 FROM information_schema.columns
                       WHERE table_name = 'api_keys' AND column_name = 'limit'"#,
                )
                .fetch_optional(&self.pool)
                .await?;
                Ok::<bool, sqlx::Error>(row.is_some())
            })
            .await?;
        Ok(*present)
    }

    async fn columns(&self) -> AppResult<&'static str> {
        Ok(if self.has_limit_column().await? {
            COLUMNS
        } else {
            COLUMNS_NO_LIMIT
        })
    }
}

#[async_trait]
impl ApiKeyRepo for PostgresPersistence {
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<ApiKey>> {
        let cols = self.columns().await?;
        let recs = sqlx::query_as::<_, ApiKey>(&format!(
            "SELECT {cols} FROM api_keys WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(recs)
    }

    async fn insert(&self, new: &NewApiKey) -> AppResult<ApiKey> {
        let id = Uuid::new_v4();
        let rec = if self.has_limit_column().await? {
            sqlx::query_as::<_, ApiKey>(&format!(
                r#"INSERT INTO api_keys (id, name, value, usage, "limit", user_id)
                   VALUES ($1, $2, $3, 0, $4, $5)
                   RETURNING {COLUMNS}"#
            ))
            .bind(id)
            .bind(&new.name)
            .bind(&new.value)
            .bind(new.limit)
            .bind(new.user_id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, ApiKey>(&format!(
                r#"INSERT INTO api_keys (id, name, value, usage, user_id)
                   VALUES ($1, $2, $3, 0, $4)
                   RETURNING {COLUMNS_NO_LIMIT}"#
            ))
            .bind(id)
            .bind(&new.name)
            .bind(&new.value)
            .bind(new.user_id)
            .fetch_one(&self.pool)
            .await?
        };

        Ok(rec)
    }

    async fn find_by_id(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<ApiKey>> {
        let cols = self.columns().await?;
        let rec = sqlx::query_as::<_, ApiKey>(&format!(
            "SELECT {cols} FROM api_keys WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rec)
    }

    async fn rename(&self, id: Uuid, user_id: Uuid, name: &str) -> AppResult<Option<ApiKey>> {
        let cols = self.columns().await?;
        let rec = sqlx::query_as::<_, ApiKey>(&format!(
            "UPDATE api_keys SET name = $3 WHERE id = $1 AND user_id = $2 RETURNING {cols}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rec)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM api_keys WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn find_by_value(&self, value: &str) -> AppResult<Option<ApiKey>> {
        let cols = self.columns().await?;
        let rec = sqlx::query_as::<_, ApiKey>(&format!(
            "SELECT {cols} FROM api_keys WHERE value = $1"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rec)
    }

    async fn increment_usage(&self, id: Uuid) -> AppResult<()> {
        // Relative update so concurrent increments are not lost; only the
        // caller's check against the limit can race.
        sqlx::query("UPDATE api_keys SET usage = usage + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
