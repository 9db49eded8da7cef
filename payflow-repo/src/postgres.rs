//! PostgreSQL repository adapter.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use payflow_types::{
    GatewayConfig, Payment, PaymentId, PaymentRepository, RepoError, Token, TokenHash,
};

use crate::types::{DbGatewayConfig, DbPayment, DbToken, encode_object, map_insert_error};

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository. Payment writes are optimistic: every update names
/// the version it was read at.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_tables_pg.sql"),
        "0001",
    )
    .await
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the database schema (for testing with existing pool).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        run_migrations(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl PaymentRepository for PostgresRepo {
    async fn insert_token(&self, token: &Token) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO security_tokens (hash, payment_name, payment_id, target_url, after_url, gateway_name, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(token.hash.as_str())
        .bind(&token.payment_name)
        .bind(token.details.as_str())
        .bind(&token.target_url)
        .bind(&token.after_url)
        .bind(&token.gateway_name)
        .bind(token.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, format!("token {}", token.hash)))?;

        Ok(())
    }

    async fn find_token(&self, hash: &TokenHash) -> Result<Option<Token>, RepoError> {
        let row: Option<DbToken> = sqlx::query_as(
            r#"SELECT hash, payment_name, payment_id, target_url, after_url, gateway_name, created_at
               FROM security_tokens WHERE hash = $1"#,
        )
        .bind(hash.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbToken::into_domain).transpose()
    }

    async fn claim_token(&self, hash: &TokenHash) -> Result<Option<Token>, RepoError> {
        // Concurrent deletes of the same row serialize on the row lock; only
        // the first one returns it.
        let row: Option<DbToken> = sqlx::query_as(
            r#"DELETE FROM security_tokens WHERE hash = $1
               RETURNING hash, payment_name, payment_id, target_url, after_url, gateway_name, created_at"#,
        )
        .bind(hash.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbToken::into_domain).transpose()
    }

    async fn delete_token(&self, hash: &TokenHash) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM security_tokens WHERE hash = $1"#)
            .bind(hash.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_payment(&self, payment: &Payment) -> Result<Payment, RepoError> {
        let now = Utc::now();
        let details = encode_object(&payment.details)?;

        sqlx::query(
            r#"INSERT INTO payments (id, gateway_name, facts, details, version, created_at, updated_at)
               VALUES ($1, $2, $3, $4, 1, $5, $6)"#,
        )
        .bind(payment.id.as_str())
        .bind(&payment.gateway_name)
        .bind(i64::from(payment.facts.bits()))
        .bind(&details)
        .bind(payment.created_at.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, format!("payment {}", payment.id)))?;

        let mut stored = payment.clone();
        stored.version = 1;
        stored.updated_at = now;
        Ok(stored)
    }

    async fn find_payment(&self, id: &PaymentId) -> Result<Option<Payment>, RepoError> {
        let row: Option<DbPayment> = sqlx::query_as(
            r#"SELECT id, gateway_name, facts, details, version, created_at, updated_at
               FROM payments WHERE id = $1"#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbPayment::into_domain).transpose()
    }

    async fn update_payment(&self, payment: &Payment) -> Result<Payment, RepoError> {
        let now = Utc::now();
        let details = encode_object(&payment.details)?;

        let new_version: Option<(i64,)> = sqlx::query_as(
            r#"UPDATE payments
               SET gateway_name = $1, facts = $2, details = $3, version = version + 1, updated_at = $4
               WHERE id = $5 AND version = $6
               RETURNING version"#,
        )
        .bind(&payment.gateway_name)
        .bind(i64::from(payment.facts.bits()))
        .bind(&details)
        .bind(now.to_rfc3339())
        .bind(payment.id.as_str())
        .bind(payment.version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let Some((version,)) = new_version else {
            return match self.find_payment(&payment.id).await? {
                Some(current) => Err(RepoError::Conflict(format!(
                    "Payment {} is at version {}, update was based on {}",
                    payment.id, current.version, payment.version
                ))),
                None => Err(RepoError::NotFound),
            };
        };

        let mut stored = payment.clone();
        stored.version = version;
        stored.updated_at = now;
        Ok(stored)
    }

    async fn insert_gateway_config(&self, config: &GatewayConfig) -> Result<(), RepoError> {
        let settings = encode_object(&config.config)?;

        sqlx::query(
            r#"INSERT INTO gateway_configs (id, factory_name, gateway_name, config, created_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(config.id.to_string())
        .bind(&config.factory_name)
        .bind(&config.gateway_name)
        .bind(&settings)
        .bind(config.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, format!("gateway {}", config.gateway_name)))?;

        Ok(())
    }

    async fn list_gateway_configs(&self) -> Result<Vec<GatewayConfig>, RepoError> {
        let rows: Vec<DbGatewayConfig> = sqlx::query_as(
            r#"SELECT id, factory_name, gateway_name, config, created_at
               FROM gateway_configs ORDER BY seq ASC"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbGatewayConfig::into_domain).collect()
    }

    async fn find_gateway_config(&self, name: &str) -> Result<Option<GatewayConfig>, RepoError> {
        let row: Option<DbGatewayConfig> = sqlx::query_as(
            r#"SELECT id, factory_name, gateway_name, config, created_at
               FROM gateway_configs WHERE gateway_name = $1"#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbGatewayConfig::into_domain).transpose()
    }

    async fn delete_gateway_config(&self, name: &str) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM gateway_configs WHERE gateway_name = $1"#)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
