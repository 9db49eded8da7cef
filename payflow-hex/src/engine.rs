//! Capture / authorize engine.
//!
//! Drives one step of a payment through gateway choice, gateway execution
//! and settlement:
//!
//! ```text
//! AWAITING_GATEWAY_CHOICE -> GATEWAY_CHOSEN -> EXECUTING -> { INTERACTIVE_REDIRECT | SETTLED }
//! ```
//!
//! The token handed to [`CaptureEngine::execute`] has already been claimed.
//! When the flow suspends (choice form, interactive redirect) the engine puts
//! it back so the payer can resume on the same URL; otherwise it stays consumed.

use std::collections::HashMap;
use std::sync::Arc;

use payflow_types::{
    AppError, Execution, GatewayConfig, GatewayRequest, Payment, PaymentRepository, RepoError,
    RequestKind, Route, Token,
};

use crate::registry::Registry;
use crate::security::{HttpRequestVerifier, TokenFactory};

/// Inputs of an engine step beyond the token itself.
#[derive(Debug, Clone, Default)]
pub struct StepRequest {
    /// `gatewayName` submitted from the choice form
    pub chosen_gateway: Option<String>,
    /// Query parameters of the inbound request
    pub params: HashMap<String, String>,
}

/// Result of an engine step.
#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    /// The payer must pick a gateway first.
    ChooseGateway { gateways: Vec<GatewayConfig> },
    /// Send the payer elsewhere; the flow continues when they come back.
    Redirect(String),
    /// The gateway finished the step.
    Settled {
        payment: Payment,
        after_url: Option<String>,
    },
}

pub struct CaptureEngine<R: PaymentRepository> {
    repo: Arc<R>,
    registry: Arc<Registry<R>>,
    tokens: Arc<TokenFactory<R>>,
    verifier: Arc<HttpRequestVerifier<R>>,
}

impl<R: PaymentRepository> CaptureEngine<R> {
    pub fn new(
        repo: Arc<R>,
        registry: Arc<Registry<R>>,
        tokens: Arc<TokenFactory<R>>,
        verifier: Arc<HttpRequestVerifier<R>>,
    ) -> Self {
        Self {
            repo,
            registry,
            tokens,
            verifier,
        }
    }

    #[tracing::instrument(skip(self, token, kind, request), fields(payment_id = %token.details, kind = ?kind))]
    pub async fn execute(
        &self,
        token: Token,
        kind: RequestKind,
        request: StepRequest,
    ) -> Result<CaptureOutcome, AppError> {
        let mut payment = self
            .repo
            .find_payment(&token.details)
            .await?
            .ok_or_else(|| AppError::PaymentNotFound(token.details.clone()))?;

        let gateway_name = token
            .gateway_name
            .clone()
            .or_else(|| payment.gateway_name.clone());

        let Some(gateway_name) = gateway_name else {
            return self.choose_gateway(token, payment, request).await;
        };

        let gateway = self.registry.get_gateway(&gateway_name).await?;

        let execution = gateway
            .execute(GatewayRequest {
                kind,
                token: &token,
                params: &request.params,
                payment: &mut payment,
            })
            .await
            .inspect_err(|e| {
                tracing::warn!(gateway = %gateway_name, error = %e, "gateway rejected the request");
            })?;

        let payment = self.save(&token, &payment).await?;

        match execution {
            Execution::Redirect(url) => {
                self.verifier.release(&token).await?;
                tracing::info!(gateway = %gateway_name, "interactive redirect");
                Ok(CaptureOutcome::Redirect(url))
            }
            Execution::Completed => {
                self.verifier.invalidate(&token).await?;
                tracing::info!(gateway = %gateway_name, status = %payment.status(), "payment settled");
                Ok(CaptureOutcome::Settled {
                    payment,
                    after_url: token.after_url,
                })
            }
        }
    }

    async fn choose_gateway(
        &self,
        token: Token,
        mut payment: Payment,
        request: StepRequest,
    ) -> Result<CaptureOutcome, AppError> {
        let gateways = self.registry.gateway_configs().await?;

        let Some(chosen) = request.chosen_gateway else {
            self.verifier.release(&token).await?;
            return Ok(CaptureOutcome::ChooseGateway { gateways });
        };

        let chosen = chosen.trim();
        if !gateways.iter().any(|g| g.gateway_name == chosen) {
            self.verifier.release(&token).await?;
            return Err(AppError::InvalidRequest(if chosen.is_empty() {
                "A gateway must be chosen".to_string()
            } else {
                format!("Gateway {} is not configured", chosen)
            }));
        }

        payment.gateway_name = Some(chosen.to_string());
        let payment = self.save(&token, &payment).await?;

        let capture = self
            .tokens
            .create_step_token(
                Route::Capture,
                &token.payment_name,
                &payment,
                token.after_url.clone(),
            )
            .await?;
        self.verifier.invalidate(&token).await?;

        tracing::info!(gateway = %chosen, "gateway chosen");
        Ok(CaptureOutcome::Redirect(capture.target_url))
    }

    /// Versioned write of the payment. Losing the race puts the token back
    /// so the payer can retry the step on the same URL.
    async fn save(&self, token: &Token, payment: &Payment) -> Result<Payment, AppError> {
        match self.repo.update_payment(payment).await {
            Ok(saved) => Ok(saved),
            Err(RepoError::Conflict(msg)) => {
                self.verifier.release(token).await?;
                tracing::warn!(payment_id = %payment.id, "payment changed concurrently");
                Err(AppError::Conflict(msg))
            }
            Err(e) => Err(e.into()),
        }
    }
}
