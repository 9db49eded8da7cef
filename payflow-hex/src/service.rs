//! Payment Application Service
//!
//! Orchestrates the token factory, request verifier, gateway registry and
//! capture engine through the repository port.
//! Contains NO infrastructure logic - pure business orchestration.

use std::sync::Arc;

use payflow_gateways::GatewayFactories;
use payflow_types::{
    AppError, CreateGatewayConfigRequest, CreatePaymentRequest, GatewayConfig, Payment,
    PaymentId, PaymentLinks, PaymentRepository, PaymentStatusResponse, RequestKind, Route,
    TokenHash, TokenTarget, UrlResolver,
};
use serde_json::Value;

use crate::engine::{CaptureEngine, CaptureOutcome, StepRequest};
use crate::registry::Registry;
use crate::security::{HttpRequestVerifier, TokenFactory};

/// Application service for payment operations.
///
/// Generic over `R: PaymentRepository` - the adapter is injected at compile time.
/// This enables:
/// - Swapping repositories without code changes
/// - Testing with in-memory repo
/// - Compile-time checks for port implementation
pub struct PaymentService<R: PaymentRepository> {
    repo: Arc<R>,
    registry: Arc<Registry<R>>,
    tokens: Arc<TokenFactory<R>>,
    verifier: Arc<HttpRequestVerifier<R>>,
    engine: CaptureEngine<R>,
}

impl<R: PaymentRepository> PaymentService<R> {
    /// Creates a new payment service with the built-in gateway factories.
    pub fn new(repo: R, urls: Arc<dyn UrlResolver>) -> Self {
        Self::with_factories(repo, urls, GatewayFactories::builtin())
    }

    /// Creates a new payment service with a custom factory table.
    pub fn with_factories(repo: R, urls: Arc<dyn UrlResolver>, factories: GatewayFactories) -> Self {
        let repo = Arc::new(repo);
        let registry = Arc::new(Registry::new(Arc::clone(&repo), factories));
        let tokens = Arc::new(TokenFactory::new(Arc::clone(&repo), urls));
        let verifier = Arc::new(HttpRequestVerifier::new(Arc::clone(&repo)));
        let engine = CaptureEngine::new(
            Arc::clone(&repo),
            Arc::clone(&registry),
            Arc::clone(&tokens),
            Arc::clone(&verifier),
        );

        Self {
            repo,
            registry,
            tokens,
            verifier,
            engine,
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn registry(&self) -> &Registry<R> {
        &self.registry
    }

    pub fn tokens(&self) -> &TokenFactory<R> {
        &self.tokens
    }

    pub fn verifier(&self) -> &HttpRequestVerifier<R> {
        &self.verifier
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Payment Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Stores a payment from a submitted document and issues its purchase and status links.
    ///
    /// The returned document carries `meta.links`; the stored one does not.
    #[tracing::instrument(skip(self, document))]
    pub async fn create_payment(&self, document: Value) -> Result<Value, AppError> {
        let req = CreatePaymentRequest::from_json(document)?;

        let mut payment = Payment::with_details(PaymentId::generate(), req.document)?;
        if self.repo.find_gateway_config(&req.name).await?.is_some() {
            payment.gateway_name = Some(req.name.clone());
        }
        let payment = self.repo.insert_payment(&payment).await?;

        let capture = self
            .tokens
            .create_capture_token(&req.name, &payment, &req.after_url)
            .await?;
        let get = self
            .tokens
            .create_token(&req.name, &payment, TokenTarget::Route(Route::PaymentGet))
            .await?;

        let links = PaymentLinks {
            purchase: Some(capture.target_url),
            get: get.target_url,
        };

        let mut response = payment.to_document();
        if let Some(meta) = response.get_mut("meta").and_then(Value::as_object_mut) {
            let links = serde_json::to_value(links).map_err(|e| AppError::Internal(e.to_string()))?;
            meta.insert("links".into(), links);
        }

        tracing::info!(payment_id = %payment.id, gateway = ?payment.gateway_name, "payment created");
        Ok(response)
    }

    /// Verifies a status token and reports the payment's current status.
    #[tracing::instrument(skip(self, hash))]
    pub async fn get_payment_status(
        &self,
        hash: Option<TokenHash>,
        request_path: &str,
    ) -> Result<PaymentStatusResponse, AppError> {
        let token = self.verifier.verify(hash, request_path).await?;

        let payment = self
            .repo
            .find_payment(&token.details)
            .await?
            .ok_or_else(|| AppError::PaymentNotFound(token.details.clone()))?;

        self.verifier.invalidate(&token).await?;

        Ok(PaymentStatusResponse {
            status: payment.status(),
            payment: payment.to_document(),
        })
    }

    /// Verifies a step token and runs the capture or authorize engine with it.
    #[tracing::instrument(skip(self, hash, request))]
    pub async fn execute(
        &self,
        hash: Option<TokenHash>,
        request_path: &str,
        kind: RequestKind,
        request: StepRequest,
    ) -> Result<CaptureOutcome, AppError> {
        let token = self.verifier.verify(hash, request_path).await?;
        self.engine.execute(token, kind, request).await
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Gateway Config Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Registers a gateway config after checking its factory can build it.
    #[tracing::instrument(skip(self, req), fields(gateway = %req.gateway_name, factory = %req.factory_name))]
    pub async fn add_gateway_config(
        &self,
        req: CreateGatewayConfigRequest,
    ) -> Result<GatewayConfig, AppError> {
        let config = GatewayConfig::new(req.factory_name, req.gateway_name, req.config)?;
        self.registry.validate(&config)?;

        self.repo.insert_gateway_config(&config).await?;
        self.registry.forget(&config.gateway_name);
        Ok(config)
    }

    /// Lists gateway configs in registration order.
    pub async fn list_gateway_configs(&self) -> Result<Vec<GatewayConfig>, AppError> {
        self.registry.gateway_configs().await
    }

    /// Removes a gateway config by name.
    #[tracing::instrument(skip(self))]
    pub async fn delete_gateway_config(&self, name: &str) -> Result<(), AppError> {
        let deleted = self.repo.delete_gateway_config(name).await?;
        self.registry.forget(name);

        if deleted {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Gateway {}", name)))
        }
    }

    /// Builds every configured gateway so misconfiguration surfaces at startup.
    pub async fn warm_up(&self) -> Result<usize, AppError> {
        self.registry.warm_up().await
    }
}
