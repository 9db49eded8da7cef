//! Gateway registry: named gateway configs turned into live instances.

use std::sync::Arc;

use dashmap::DashMap;
use payflow_gateways::GatewayFactories;
use payflow_types::{AppError, Gateway, GatewayConfig, GatewayError, PaymentRepository};

/// Resolves gateway names to instances, building each at most once.
pub struct Registry<R: PaymentRepository> {
    repo: Arc<R>,
    factories: GatewayFactories,
    cache: DashMap<String, Arc<dyn Gateway>>,
}

impl<R: PaymentRepository> Registry<R> {
    pub fn new(repo: Arc<R>, factories: GatewayFactories) -> Self {
        Self {
            repo,
            factories,
            cache: DashMap::new(),
        }
    }

    /// The repository backing every model the registry knows about.
    pub fn storage(&self) -> &Arc<R> {
        &self.repo
    }

    pub fn factories(&self) -> &GatewayFactories {
        &self.factories
    }

    /// Returns the gateway registered under `name`.
    pub async fn get_gateway(&self, name: &str) -> Result<Arc<dyn Gateway>, AppError> {
        if let Some(gateway) = self.cache.get(name) {
            return Ok(Arc::clone(gateway.value()));
        }

        let config = self
            .repo
            .find_gateway_config(name)
            .await?
            .ok_or_else(|| AppError::UnknownGateway(name.to_string()))?;

        let gateway = self.build(&config)?;
        self.cache.insert(name.to_string(), Arc::clone(&gateway));
        Ok(gateway)
    }

    /// Every configured gateway, in registration order.
    pub async fn gateway_configs(&self) -> Result<Vec<GatewayConfig>, AppError> {
        Ok(self.repo.list_gateway_configs().await?)
    }

    /// Rejects configs whose factory is unknown or whose settings the factory refuses.
    pub fn validate(&self, config: &GatewayConfig) -> Result<(), AppError> {
        self.factories.build(config)?;
        Ok(())
    }

    /// Drops a cached instance.
    pub fn forget(&self, name: &str) {
        self.cache.remove(name);
    }

    /// Builds every stored config. Returns how many gateways are ready.
    pub async fn warm_up(&self) -> Result<usize, AppError> {
        let configs = self.repo.list_gateway_configs().await?;
        for config in &configs {
            let gateway = self.build(config)?;
            self.cache.insert(config.gateway_name.clone(), gateway);
            tracing::debug!(
                gateway = %config.gateway_name,
                factory = %config.factory_name,
                "gateway ready"
            );
        }
        Ok(configs.len())
    }

    fn build(&self, config: &GatewayConfig) -> Result<Arc<dyn Gateway>, AppError> {
        self.factories.build(config).map_err(|e| {
            tracing::error!(gateway = %config.gateway_name, error = %e, "gateway build failed");
            AppError::Gateway(GatewayError::Misconfigured(format!(
                "{}: {}",
                config.gateway_name, e
            )))
        })
    }
}
