use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, types::Json, PgPool, Row};

use crate::model::{BaseConfig, Id, Instance};
use crate::store::traits::{InstanceStore, StoreError, StoreResult};

/// SQLSTATE for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

const INSTANCE_COLUMNS: &str = "id, uuid, config, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run embedded database migrations
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }
}

fn row_to_instance(row: PgRow) -> Instance {
    Instance {
        id: row.get("id"),
        external_id: row.get("uuid"),
        base_config: row
            .get::<Option<Json<BaseConfig>>, _>("config")
            .map(|config| config.0),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

#[async_trait::async_trait]
impl InstanceStore for PostgresStore {
    async fn get_instance(&self, id: &Id) -> StoreResult<Option<Instance>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM instances WHERE id = $1",
            INSTANCE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch instance")?;

        Ok(row.map(row_to_instance))
    }

    async fn get_instance_by_external_id(&self, external_id: &str) -> StoreResult<Option<Instance>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM instances WHERE uuid = $1",
            INSTANCE_COLUMNS
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch instance by uuid")?;

        Ok(row.map(row_to_instance))
    }

    async fn insert_instance(&self, instance: Instance) -> StoreResult<Instance> {
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO instances (id, uuid, config, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING {}
            "#,
            INSTANCE_COLUMNS
        ))
        .bind(&instance.id)
        .bind(&instance.external_id)
        .bind(instance.base_config.as_ref().map(Json))
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row_to_instance(row)),
            Err(e) if is_unique_violation(&e) => {
                Err(StoreError::DuplicateExternalId(instance.external_id))
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context("Failed to insert instance")
                .into()),
        }
    }

    async fn update_instance(&self, instance: Instance) -> StoreResult<Option<Instance>> {
        // Only the configuration is mutable; id and uuid are fixed at creation
        let row = sqlx::query(&format!(
            r#"
            UPDATE instances
            SET config = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            INSTANCE_COLUMNS
        ))
        .bind(&instance.id)
        .bind(instance.base_config.as_ref().map(Json))
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update instance")?;

        Ok(row.map(row_to_instance))
    }

    async fn delete_instance(&self, id: &Id) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete instance")?;

        Ok(result.rows_affected() > 0)
    }
}
