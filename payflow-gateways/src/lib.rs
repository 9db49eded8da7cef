//! Built-in gateways and the factory table that builds them from config.
//!
//! Gateways are looked up by factory name when a [`GatewayConfig`] is turned
//! into a live instance. The table is closed at startup: an unknown factory
//! name is rejected as soon as a config referencing it is registered.
//!
//! # Example
//! ```
//! use payflow_gateways::GatewayFactories;
//! use payflow_types::GatewayConfig;
//!
//! let factories = GatewayFactories::builtin();
//! let config = GatewayConfig::new("offline", "FooGateway", Default::default()).unwrap();
//! assert!(factories.build(&config).is_ok());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use payflow_types::{DomainError, Gateway, GatewayConfig};

mod hosted;
mod offline;

pub use hosted::HostedCheckoutGateway;
pub use offline::OfflineGateway;

/// Builds a gateway instance from its config.
pub type GatewayConstructor = fn(&GatewayConfig) -> Result<Arc<dyn Gateway>, DomainError>;

/// Registration table mapping factory names to constructors.
#[derive(Clone)]
pub struct GatewayFactories {
    constructors: HashMap<String, GatewayConstructor>,
}

impl GatewayFactories {
    /// An empty table.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// The table with every gateway shipped in this crate.
    pub fn builtin() -> Self {
        let mut factories = Self::empty();
        factories.register(OfflineGateway::FACTORY_NAME, OfflineGateway::from_config);
        factories.register(
            HostedCheckoutGateway::FACTORY_NAME,
            HostedCheckoutGateway::from_config,
        );
        factories
    }

    /// Adds or replaces a constructor.
    pub fn register(&mut self, factory_name: impl Into<String>, constructor: GatewayConstructor) {
        self.constructors.insert(factory_name.into(), constructor);
    }

    pub fn contains(&self, factory_name: &str) -> bool {
        self.constructors.contains_key(factory_name)
    }

    /// Registered factory names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds the gateway described by `config`.
    pub fn build(&self, config: &GatewayConfig) -> Result<Arc<dyn Gateway>, DomainError> {
        let constructor = self
            .constructors
            .get(&config.factory_name)
            .ok_or_else(|| DomainError::UnknownFactory(config.factory_name.clone()))?;
        constructor(config)
    }
}

impl Default for GatewayFactories {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    #[test]
    fn test_builtin_names() {
        let factories = GatewayFactories::builtin();
        assert_eq!(factories.names(), vec!["hosted_checkout", "offline"]);
    }

    #[test]
    fn test_unknown_factory_fails() {
        let factories = GatewayFactories::builtin();
        let config = GatewayConfig::new("paypal_express", "Paypal", Map::new()).unwrap();

        let result = factories.build(&config);
        assert!(matches!(result, Err(DomainError::UnknownFactory(name)) if name == "paypal_express"));
    }

    #[test]
    fn test_hosted_checkout_requires_url() {
        let factories = GatewayFactories::builtin();
        let config = GatewayConfig::new("hosted_checkout", "Hosted", Map::new()).unwrap();
        assert!(matches!(
            factories.build(&config),
            Err(DomainError::ValidationError(_))
        ));

        let mut settings = Map::new();
        settings.insert("checkout_url".into(), json!("https://checkout.test/pay"));
        let config = GatewayConfig::new("hosted_checkout", "Hosted", settings).unwrap();
        assert!(factories.build(&config).is_ok());
    }

    #[test]
    fn test_register_custom_constructor() {
        let mut factories = GatewayFactories::empty();
        assert!(!factories.contains("offline"));

        factories.register("cash", OfflineGateway::from_config);
        let config = GatewayConfig::new("cash", "Cash", Map::new()).unwrap();
        assert!(factories.build(&config).is_ok());
    }
}
