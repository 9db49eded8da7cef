//! Repository port trait.
//!
//! This is the primary port in our hexagonal architecture.
//! Adapters (Postgres, SQLite, in-memory mocks) implement this trait.

use crate::domain::{GatewayConfig, Payment, PaymentId, Token, TokenHash};
use crate::error::RepoError;

/// Storage for tokens, payments and gateway configs.
///
/// `claim_token` MUST be atomic: of two concurrent claims for one hash,
/// exactly one returns the token. `update_payment` MUST be a
/// compare-and-set on `Payment::version`.
#[async_trait::async_trait]
pub trait PaymentRepository: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────────
    // Tokens
    // ─────────────────────────────────────────────────────────────────────────────

    /// Persists a token. Fails with `DuplicateKey` if the hash exists.
    async fn insert_token(&self, token: &Token) -> Result<(), RepoError>;

    /// Finds a token by exact hash.
    async fn find_token(&self, hash: &TokenHash) -> Result<Option<Token>, RepoError>;

    /// Atomically removes and returns a token.
    async fn claim_token(&self, hash: &TokenHash) -> Result<Option<Token>, RepoError>;

    /// Removes a token. Returns whether anything was deleted.
    async fn delete_token(&self, hash: &TokenHash) -> Result<bool, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Payments
    // ─────────────────────────────────────────────────────────────────────────────

    /// Persists a new payment and returns it with version 1.
    async fn insert_payment(&self, payment: &Payment) -> Result<Payment, RepoError>;

    /// Gets a payment by id.
    async fn find_payment(&self, id: &PaymentId) -> Result<Option<Payment>, RepoError>;

    /// Saves a payment if nobody updated it since it was read.
    ///
    /// Returns the stored payment with its version bumped, or `Conflict`.
    async fn update_payment(&self, payment: &Payment) -> Result<Payment, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Gateway configs
    // ─────────────────────────────────────────────────────────────────────────────

    /// Persists a gateway config. Fails with `DuplicateKey` on a name clash.
    async fn insert_gateway_config(&self, config: &GatewayConfig) -> Result<(), RepoError>;

    /// Lists gateway configs in insertion order.
    async fn list_gateway_configs(&self) -> Result<Vec<GatewayConfig>, RepoError>;

    /// Finds a gateway config by its gateway name.
    async fn find_gateway_config(&self, name: &str) -> Result<Option<GatewayConfig>, RepoError>;

    /// Removes a gateway config. Returns whether anything was deleted.
    async fn delete_gateway_config(&self, name: &str) -> Result<bool, RepoError>;
}
