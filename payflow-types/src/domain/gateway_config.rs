//! Gateway configuration domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::DomainError;

/// Unique identifier for a GatewayConfig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct GatewayConfigId(Uuid);

impl GatewayConfigId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for GatewayConfigId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GatewayConfigId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for GatewayConfigId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// An operator-defined gateway: which implementation to build and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub id: GatewayConfigId,
    /// Name of the gateway implementation (e.g. `offline`)
    pub factory_name: String,
    /// Lookup and display name, unique across configs
    pub gateway_name: String,
    /// Settings handed to the factory
    pub config: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl GatewayConfig {
    /// Creates a new gateway config.
    ///
    /// # Validation
    /// - Factory and gateway names cannot be empty
    pub fn new(
        factory_name: impl Into<String>,
        gateway_name: impl Into<String>,
        config: Map<String, Value>,
    ) -> Result<Self, DomainError> {
        let factory_name = factory_name.into();
        let gateway_name = gateway_name.into();

        if factory_name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Factory name cannot be empty".into(),
            ));
        }
        if gateway_name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Gateway name cannot be empty".into(),
            ));
        }

        Ok(Self {
            id: GatewayConfigId::new(),
            factory_name,
            gateway_name,
            config,
            created_at: Utc::now(),
        })
    }

    /// Reconstructs a config from stored fields.
    pub fn from_parts(
        id: GatewayConfigId,
        factory_name: String,
        gateway_name: String,
        config: Map<String, Value>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            factory_name,
            gateway_name,
            config,
            created_at,
        }
    }

    /// Returns a string setting, if present.
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_creation() {
        let mut settings = Map::new();
        settings.insert("factory".into(), json!("offline"));

        let config = GatewayConfig::new("offline", "FooGateway", settings).unwrap();
        assert_eq!(config.gateway_name, "FooGateway");
        assert_eq!(config.setting("factory"), Some("offline"));
        assert_eq!(config.setting("missing"), None);
    }

    #[test]
    fn test_empty_gateway_name_fails() {
        let result = GatewayConfig::new("offline", " ", Map::new());
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn test_empty_factory_name_fails() {
        let result = GatewayConfig::new("", "FooGateway", Map::new());
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }
}
