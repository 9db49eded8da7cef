//! Data Transfer Objects (DTOs) for requests and responses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::domain::{GatewayConfig, GatewayConfigId, PaymentStatus};
use crate::error::DomainError;

// ─────────────────────────────────────────────────────────────────────────────
// Payment DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// A validated create-payment document.
///
/// Built from raw JSON so each missing or malformed field gets its own
/// message.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePaymentRequest {
    /// `meta.name`
    pub name: String,
    /// `meta.purchase_after_url`
    pub after_url: String,
    /// The whole submitted document, kept as the payment details
    pub document: Map<String, Value>,
}

impl CreatePaymentRequest {
    pub fn from_json(value: Value) -> Result<Self, DomainError> {
        let Value::Object(document) = value else {
            return Err(invalid("Request body must be a JSON object"));
        };

        let meta = document.get("meta").and_then(Value::as_object);

        let name = meta
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| invalid("The payment name must be set to meta.name"))?
            .to_string();

        let after_url = meta
            .and_then(|m| m.get("purchase_after_url"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| invalid("The purchase after url must be set to meta.purchase_after_url"))?
            .to_string();

        match document.get("payment") {
            None | Some(Value::Null) => {
                return Err(invalid("The payment details must be set to payment"));
            }
            Some(Value::Object(details)) if details.is_empty() => {
                return Err(invalid("The payment details must be set to payment"));
            }
            Some(Value::Object(_)) => {}
            Some(_) => return Err(invalid("The payment details must be an object")),
        }

        Ok(Self {
            name,
            after_url,
            document,
        })
    }
}

fn invalid(msg: &str) -> DomainError {
    DomainError::ValidationError(msg.to_string())
}

/// Links injected into `meta.links` of a created payment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentLinks {
    /// Capture URL. Sensitive: returned once, never persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase: Option<String>,
    /// Status URL
    pub get: String,
}

/// Response of the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentStatusResponse {
    /// The stored payment document
    #[schema(value_type = Object)]
    pub payment: Value,
    pub status: PaymentStatus,
}

/// Gateway-choice form submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ChooseGatewayForm {
    #[serde(rename = "gatewayName")]
    pub gateway_name: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Gateway config DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to register a gateway config.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateGatewayConfigRequest {
    /// Gateway implementation to build
    #[schema(example = "offline")]
    pub factory_name: String,
    /// Name payers see and payments refer to
    #[schema(example = "FooGateway")]
    pub gateway_name: String,
    /// Settings handed to the factory
    #[serde(default)]
    #[schema(value_type = Object)]
    pub config: Map<String, Value>,
}

/// A registered gateway config.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GatewayConfigResponse {
    pub id: GatewayConfigId,
    #[schema(example = "offline")]
    pub factory_name: String,
    #[schema(example = "FooGateway")]
    pub gateway_name: String,
    #[schema(value_type = Object)]
    pub config: Map<String, Value>,
    #[schema(value_type = String, example = "2024-01-01T00:00:00Z")]
    pub created_at: String,
}

impl From<GatewayConfig> for GatewayConfigResponse {
    fn from(config: GatewayConfig) -> Self {
        Self {
            id: config.id,
            factory_name: config.factory_name,
            gateway_name: config.gateway_name,
            config: config.config,
            created_at: config.created_at.to_rfc3339(),
        }
    }
}
