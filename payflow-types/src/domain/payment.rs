//! Payment domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use super::status::{PaymentStatus, StatusFacts};
use crate::error::DomainError;

/// Unique identifier for a Payment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PaymentId(String);

impl PaymentId {
    /// Wraps a caller-supplied identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a new random PaymentId.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A payment moving through the capture protocol.
///
/// `details` is an opaque pass-through bag. Only `gateway_name` and
/// `facts` are interpreted by the orchestration layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    /// Chosen gateway. `None` until the payer (or the creator) picks one.
    pub gateway_name: Option<String>,
    pub facts: StatusFacts,
    pub details: Map<String, Value>,
    /// Optimistic concurrency counter. Zero means never persisted.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a new, unpersisted payment.
    pub fn new(id: PaymentId) -> Self {
        let now = Utc::now();
        Self {
            id,
            gateway_name: None,
            facts: StatusFacts::NONE,
            details: Map::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a payment from a details document.
    ///
    /// # Validation
    /// - Id cannot be empty
    pub fn with_details(id: PaymentId, details: Map<String, Value>) -> Result<Self, DomainError> {
        if id.as_str().trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Payment id cannot be empty".into(),
            ));
        }

        let mut payment = Self::new(id);
        payment.details = details;
        Ok(payment)
    }

    /// Reconstructs a payment from stored fields.
    pub fn from_parts(
        id: PaymentId,
        gateway_name: Option<String>,
        facts: StatusFacts,
        details: Map<String, Value>,
        version: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            gateway_name,
            facts,
            details,
            version,
            created_at,
            updated_at,
        }
    }

    /// Whether storage has assigned this payment an identity.
    pub fn is_persisted(&self) -> bool {
        self.version > 0
    }

    /// Current lifecycle status derived from the fact bitmask.
    pub fn status(&self) -> PaymentStatus {
        PaymentStatus::resolve(self.facts)
    }

    /// Records a fact.
    pub fn mark(&mut self, fact: StatusFacts) {
        self.facts.insert(fact);
    }

    /// Drops a fact.
    pub fn clear(&mut self, fact: StatusFacts) {
        self.facts.remove(fact);
    }

    /// Returns the details as a JSON document including the payment id.
    pub fn to_document(&self) -> Value {
        let mut doc = self.details.clone();
        doc.insert("id".into(), Value::String(self.id.to_string()));
        Value::Object(doc)
    }
}
