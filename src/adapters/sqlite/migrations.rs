//! Embedded schema migrations tracked in `schema_migrations`.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Failed to execute migration {version}: {source}")]
    ExecutionError { version: i64, #[source] source: sqlx::Error },
    #[error("Failed to get schema version: {0}")]
    VersionCheckError(#[source] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: String,
    pub sql: String,
}

pub struct Migrator {
    pool: SqlitePool,
}

impl Migrator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply every migration newer than the current version, in order.
    /// Returns how many were applied.
    pub async fn run_embedded_migrations(&self, migrations: Vec<Migration>) -> Result<usize, MigrationError> {
        self.ensure_migrations_table().await?;
        let current_version = self.get_current_version().await?;
        let pending: Vec<_> = migrations.into_iter().filter(|m| m.version > current_version).collect();

        for migration in &pending {
            self.apply_migration(migration).await?;
            info!(version = migration.version, description = %migration.description, "applied migration");
        }

        Ok(pending.len())
    }

    async fn ensure_migrations_table(&self) -> Result<(), MigrationError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now')),
                description TEXT
            )"
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MigrationError::ExecutionError { version: 0, source: e })?;
        Ok(())
    }

    pub async fn get_current_version(&self) -> Result<i64, MigrationError> {
        let (version,): (i64,) = sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(MigrationError::VersionCheckError)?;
        Ok(version)
    }

    async fn apply_migration(&self, migration: &Migration) -> Result<(), MigrationError> {
        let failed = |e| MigrationError::ExecutionError { version: migration.version, source: e };

        sqlx::raw_sql(&migration.sql)
            .execute(&self.pool)
            .await
            .map_err(failed)?;

        sqlx::query("INSERT INTO schema_migrations (version, description) VALUES (?, ?)")
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&self.pool)
            .await
            .map_err(failed)?;
        Ok(())
    }
}

pub fn workout_sessions_migration() -> Migration {
    Migration {
        version: 1,
        description: "Workout sessions and exercise completions".to_string(),
        sql: include_str!("../../../migrations/001_workout_sessions.sql").to_string(),
    }
}

pub fn all_embedded_migrations() -> Vec<Migration> {
    vec![workout_sessions_migration()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_test_pool;

    #[tokio::test]
    async fn test_migrations_apply_once() {
        let pool = create_test_pool().await.unwrap();
        let migrator = Migrator::new(pool);

        assert_eq!(migrator.run_embedded_migrations(all_embedded_migrations()).await.unwrap(), 1);
        assert_eq!(migrator.get_current_version().await.unwrap(), 1);
        assert_eq!(migrator.run_embedded_migrations(all_embedded_migrations()).await.unwrap(), 0);
    }
}
