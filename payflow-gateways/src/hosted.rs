//! Hosted checkout gateway: bounces the payer to an external page and back.
//!
//! The first execution marks the payment pending and redirects to
//! `checkout_url` with `return_url` set to the token's target. The hosted
//! page sends the payer back with `checkout_result=success|cancel|failure`.

use std::sync::Arc;

use async_trait::async_trait;
use payflow_types::{
    DomainError, Execution, Gateway, GatewayConfig, GatewayError, GatewayRequest, RequestKind,
    StatusFacts,
};
use url::Url;

pub const RESULT_PARAM: &str = "checkout_result";

#[derive(Debug, Clone)]
pub struct HostedCheckoutGateway {
    checkout_url: Url,
}

impl HostedCheckoutGateway {
    pub const FACTORY_NAME: &'static str = "hosted_checkout";

    pub fn new(checkout_url: Url) -> Self {
        Self { checkout_url }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Arc<dyn Gateway>, DomainError> {
        let raw = config.setting("checkout_url").ok_or_else(|| {
            DomainError::ValidationError(format!(
                "Gateway {} requires config.checkout_url",
                config.gateway_name
            ))
        })?;
        let checkout_url = Url::parse(raw).map_err(|e| {
            DomainError::ValidationError(format!("Invalid checkout_url {}: {}", raw, e))
        })?;

        Ok(Arc::new(Self::new(checkout_url)))
    }

    fn checkout_link(&self, request: &GatewayRequest<'_>) -> String {
        let mut url = self.checkout_url.clone();
        url.query_pairs_mut()
            .append_pair("payment", request.payment.id.as_str())
            .append_pair("return_url", &request.token.target_url);
        url.into()
    }
}

#[async_trait]
impl Gateway for HostedCheckoutGateway {
    async fn execute(&self, request: GatewayRequest<'_>) -> Result<Execution, GatewayError> {
        let outcome = request.params.get(RESULT_PARAM).map(String::as_str);

        let fact = match outcome {
            None => {
                let link = self.checkout_link(&request);
                request.payment.mark(StatusFacts::PENDING);
                tracing::debug!(payment_id = %request.payment.id, "sending payer to hosted checkout");
                return Ok(Execution::Redirect(link));
            }
            Some("success") => match request.kind {
                RequestKind::Capture => StatusFacts::CAPTURED,
                RequestKind::Authorize => StatusFacts::AUTHORIZED,
            },
            Some("cancel") => StatusFacts::CANCELED,
            Some("failure") => StatusFacts::FAILED,
            Some(other) => {
                return Err(GatewayError::Declined(format!(
                    "Unexpected checkout result: {}",
                    other
                )));
            }
        };

        request.payment.clear(StatusFacts::PENDING);
        request.payment.mark(fact);
        Ok(Execution::Completed)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use payflow_types::{Payment, PaymentId, PaymentStatus, Token, TokenHash};

    use super::*;

    fn gateway() -> HostedCheckoutGateway {
        HostedCheckoutGateway::new(Url::parse("https://checkout.test/pay").unwrap())
    }

    fn token() -> Token {
        Token::new(
            TokenHash::new("h1"),
            "hosted",
            PaymentId::new("p-1"),
            "http://localhost/payment/capture/h1",
        )
    }

    async fn run(params: HashMap<String, String>, payment: &mut Payment) -> Result<Execution, GatewayError> {
        let token = token();
        gateway()
            .execute(GatewayRequest {
                kind: RequestKind::Capture,
                token: &token,
                params: &params,
                payment,
            })
            .await
    }

    #[tokio::test]
    async fn test_first_visit_redirects_and_marks_pending() {
        let mut payment = Payment::new(PaymentId::new("p-1"));

        let result = run(HashMap::new(), &mut payment).await.unwrap();

        let Execution::Redirect(url) = result else {
            panic!("expected redirect");
        };
        assert!(url.starts_with("https://checkout.test/pay?"));
        assert!(url.contains("payment=p-1"));
        assert!(url.contains("return_url=http%3A%2F%2Flocalhost%2Fpayment%2Fcapture%2Fh1"));
        assert_eq!(payment.status(), PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_success_return_captures() {
        let mut payment = Payment::new(PaymentId::new("p-1"));
        payment.mark(StatusFacts::PENDING);
        let params = HashMap::from([(RESULT_PARAM.to_string(), "success".to_string())]);

        let result = run(params, &mut payment).await.unwrap();

        assert_eq!(result, Execution::Completed);
        assert_eq!(payment.status(), PaymentStatus::Captured);
    }

    #[tokio::test]
    async fn test_cancel_return_cancels() {
        let mut payment = Payment::new(PaymentId::new("p-1"));
        let params = HashMap::from([(RESULT_PARAM.to_string(), "cancel".to_string())]);

        run(params, &mut payment).await.unwrap();

        assert_eq!(payment.status(), PaymentStatus::Canceled);
    }

    #[tokio::test]
    async fn test_unexpected_result_is_declined() {
        let mut payment = Payment::new(PaymentId::new("p-1"));
        let params = HashMap::from([(RESULT_PARAM.to_string(), "maybe".to_string())]);

        let result = run(params, &mut payment).await;

        assert!(matches!(result, Err(GatewayError::Declined(_))));
    }
}
