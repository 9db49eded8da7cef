//! Database row types shared by the SQLite and PostgreSQL adapters.
//!
//! Both schemas store identifiers, JSON documents and timestamps as TEXT so
//! one set of row structs maps either backend.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::FromRow;

use payflow_types::{
    GatewayConfig, GatewayConfigId, Payment, PaymentId, RepoError, StatusFacts, Token, TokenHash,
};

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Security token row.
#[derive(FromRow)]
pub struct DbToken {
    pub hash: String,
    pub payment_name: String,
    pub payment_id: String,
    pub target_url: String,
    pub after_url: Option<String>,
    pub gateway_name: Option<String>,
    pub created_at: String,
}

/// Payment row.
#[derive(FromRow)]
pub struct DbPayment {
    pub id: String,
    pub gateway_name: Option<String>,
    pub facts: i64,
    pub details: String,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Gateway config row.
#[derive(FromRow)]
pub struct DbGatewayConfig {
    pub id: String,
    pub factory_name: String,
    pub gateway_name: String,
    pub config: String,
    pub created_at: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepoError::Database(e.to_string()))
}

pub fn parse_object(s: &str) -> Result<Map<String, Value>, RepoError> {
    match serde_json::from_str(s).map_err(|e| RepoError::Database(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(RepoError::Database(format!(
            "Expected a JSON object, found {}",
            other
        ))),
    }
}

pub fn encode_object(map: &Map<String, Value>) -> Result<String, RepoError> {
    serde_json::to_string(map).map_err(|e| RepoError::Database(e.to_string()))
}

/// Maps a sqlx error, turning unique violations into `DuplicateKey`.
pub fn map_insert_error(err: sqlx::Error, key: impl Into<String>) -> RepoError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::DuplicateKey(key.into()),
        _ => RepoError::Database(err.to_string()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Domain conversion
// ─────────────────────────────────────────────────────────────────────────────

impl DbToken {
    /// Convert database row to domain Token.
    pub fn into_domain(self) -> Result<Token, RepoError> {
        Ok(Token::from_parts(
            TokenHash::new(self.hash),
            self.payment_name,
            PaymentId::new(self.payment_id),
            self.target_url,
            self.after_url,
            self.gateway_name,
            parse_timestamp(&self.created_at)?,
        ))
    }
}

impl DbPayment {
    /// Convert database row to domain Payment.
    pub fn into_domain(self) -> Result<Payment, RepoError> {
        let facts = u16::try_from(self.facts)
            .map(StatusFacts::from_bits)
            .map_err(|_| RepoError::Database(format!("Invalid status facts: {}", self.facts)))?;

        Ok(Payment::from_parts(
            PaymentId::new(self.id),
            self.gateway_name,
            facts,
            parse_object(&self.details)?,
            self.version,
            parse_timestamp(&self.created_at)?,
            parse_timestamp(&self.updated_at)?,
        ))
    }
}

impl DbGatewayConfig {
    /// Convert database row to domain GatewayConfig.
    pub fn into_domain(self) -> Result<GatewayConfig, RepoError> {
        let id: GatewayConfigId = self
            .id
            .parse()
            .map_err(|e: uuid::Error| RepoError::Database(e.to_string()))?;

        Ok(GatewayConfig::from_parts(
            id,
            self.factory_name,
            self.gateway_name,
            parse_object(&self.config)?,
            parse_timestamp(&self.created_at)?,
        ))
    }
}
