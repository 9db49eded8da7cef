//! Security token domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::payment::PaymentId;

/// Opaque, unguessable identifier of a [`Token`].
///
/// Lookups are by exact match only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TokenHash(String);

impl TokenHash {
    /// Wraps an already generated hash.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TokenHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single-use credential authorizing one step of a payment flow.
///
/// A token is consumed the first time it is verified. Re-presenting the
/// same hash afterwards fails as if it never existed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Storage key
    pub hash: TokenHash,
    /// Registry context the token was issued for
    pub payment_name: String,
    /// Reference to the payment this token acts on
    pub details: PaymentId,
    /// Where the client is sent to perform this step
    pub target_url: String,
    /// Where the client lands once the step completes
    pub after_url: Option<String>,
    /// Gateway pinned for this step, if any
    pub gateway_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Token {
    /// Creates a new, unpersisted token.
    pub fn new(
        hash: TokenHash,
        payment_name: impl Into<String>,
        details: PaymentId,
        target_url: impl Into<String>,
    ) -> Self {
        Self {
            hash,
            payment_name: payment_name.into(),
            details,
            target_url: target_url.into(),
            after_url: None,
            gateway_name: None,
            created_at: Utc::now(),
        }
    }

    /// Sets the after-url.
    pub fn with_after_url(mut self, after_url: Option<String>) -> Self {
        self.after_url = after_url;
        self
    }

    /// Pins a gateway for this step.
    pub fn with_gateway_name(mut self, gateway_name: Option<String>) -> Self {
        self.gateway_name = gateway_name;
        self
    }

    /// Reconstructs a token from stored fields.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        hash: TokenHash,
        payment_name: String,
        details: PaymentId,
        target_url: String,
        after_url: Option<String>,
        gateway_name: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            hash,
            payment_name,
            details,
            target_url,
            after_url,
            gateway_name,
            created_at,
        }
    }
}
