//! SQLite repository adapter.
#![allow(clippy::collapsible_if)]

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;

use payflow_types::{
    GatewayConfig, Payment, PaymentId, PaymentRepository, RepoError, Token, TokenHash,
};

use crate::types::{DbGatewayConfig, DbPayment, DbToken, encode_object, map_insert_error};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &SqlitePool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
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

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            // Remove query parameters
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        execute_migration(&pool, include_str!("../migrations/0001_create_tables.sql"), "0001")
            .await?;

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

const TOKEN_COLUMNS: &str =
    "hash, payment_name, payment_id, target_url, after_url, gateway_name, created_at";
const PAYMENT_COLUMNS: &str =
    "id, gateway_name, facts, details, version, created_at, updated_at";
const CONFIG_COLUMNS: &str = "id, factory_name, gateway_name, config, created_at";

#[async_trait]
impl PaymentRepository for SqliteRepo {
    async fn insert_token(&self, token: &Token) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO security_tokens (hash, payment_name, payment_id, target_url, after_url, gateway_name, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
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
        let row: Option<DbToken> = sqlx::query_as(&format!(
            "SELECT {} FROM security_tokens WHERE hash = ?",
            TOKEN_COLUMNS
        ))
        .bind(hash.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbToken::into_domain).transpose()
    }

    async fn claim_token(&self, hash: &TokenHash) -> Result<Option<Token>, RepoError> {
        // Single statement: the delete is the serialization point.
        let row: Option<DbToken> = sqlx::query_as(&format!(
            "DELETE FROM security_tokens WHERE hash = ? RETURNING {}",
            TOKEN_COLUMNS
        ))
        .bind(hash.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbToken::into_domain).transpose()
    }

    async fn delete_token(&self, hash: &TokenHash) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM security_tokens WHERE hash = ?"#)
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
               VALUES (?, ?, ?, ?, 1, ?, ?)"#,
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
        let row: Option<DbPayment> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE id = ?",
            PAYMENT_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbPayment::into_domain).transpose()
    }

    async fn update_payment(&self, payment: &Payment) -> Result<Payment, RepoError> {
        let now = Utc::now();
        let details = encode_object(&payment.details)?;

        let result = sqlx::query(
            r#"UPDATE payments
               SET gateway_name = ?, facts = ?, details = ?, version = version + 1, updated_at = ?
               WHERE id = ? AND version = ?"#,
        )
        .bind(&payment.gateway_name)
        .bind(i64::from(payment.facts.bits()))
        .bind(&details)
        .bind(now.to_rfc3339())
        .bind(payment.id.as_str())
        .bind(payment.version)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return match self.find_payment(&payment.id).await? {
                Some(_) => Err(RepoError::Conflict(format!(
                    "Payment {} was modified concurrently",
                    payment.id
                ))),
                None => Err(RepoError::NotFound),
            };
        }

        let mut stored = payment.clone();
        stored.version += 1;
        stored.updated_at = now;
        Ok(stored)
    }

    async fn insert_gateway_config(&self, config: &GatewayConfig) -> Result<(), RepoError> {
        let settings = encode_object(&config.config)?;

        sqlx::query(
            r#"INSERT INTO gateway_configs (id, factory_name, gateway_name, config, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
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
        let rows: Vec<DbGatewayConfig> = sqlx::query_as(&format!(
            "SELECT {} FROM gateway_configs ORDER BY seq ASC",
            CONFIG_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbGatewayConfig::into_domain).collect()
    }

    async fn find_gateway_config(&self, name: &str) -> Result<Option<GatewayConfig>, RepoError> {
        let row: Option<DbGatewayConfig> = sqlx::query_as(&format!(
            "SELECT {} FROM gateway_configs WHERE gateway_name = ?",
            CONFIG_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbGatewayConfig::into_domain).transpose()
    }

    async fn delete_gateway_config(&self, name: &str) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM gateway_configs WHERE gateway_name = ?"#)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
