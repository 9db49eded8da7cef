//! Offline gateway: settles every request immediately.

use std::sync::Arc;

use async_trait::async_trait;
use payflow_types::{
    DomainError, Execution, Gateway, GatewayConfig, GatewayError, GatewayRequest, RequestKind,
    StatusFacts,
};

/// A gateway with no remote side. Capture marks the payment captured,
/// authorize marks it authorized.
#[derive(Debug, Default, Clone)]
pub struct OfflineGateway;

impl OfflineGateway {
    pub const FACTORY_NAME: &'static str = "offline";

    pub fn from_config(_config: &GatewayConfig) -> Result<Arc<dyn Gateway>, DomainError> {
        Ok(Arc::new(Self))
    }
}

#[async_trait]
impl Gateway for OfflineGateway {
    async fn execute(&self, request: GatewayRequest<'_>) -> Result<Execution, GatewayError> {
        let fact = match request.kind {
            RequestKind::Capture => StatusFacts::CAPTURED,
            RequestKind::Authorize => StatusFacts::AUTHORIZED,
        };

        request.payment.clear(StatusFacts::PENDING);
        request.payment.mark(fact);

        tracing::debug!(payment_id = %request.payment.id, ?fact, "offline gateway settled");
        Ok(Execution::Completed)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use payflow_types::{Payment, PaymentId, PaymentStatus, Token, TokenHash};

    use super::*;

    fn token() -> Token {
        Token::new(
            TokenHash::new("h"),
            "offline",
            PaymentId::new("p-1"),
            "http://localhost/payment/capture/h",
        )
    }

    #[tokio::test]
    async fn test_capture_marks_captured() {
        let gateway = OfflineGateway;
        let mut payment = Payment::new(PaymentId::new("p-1"));
        payment.mark(StatusFacts::PENDING);
        let params = HashMap::new();
        let token = token();

        let result = gateway
            .execute(GatewayRequest {
                kind: RequestKind::Capture,
                token: &token,
                params: &params,
                payment: &mut payment,
            })
            .await
            .unwrap();

        assert_eq!(result, Execution::Completed);
        assert_eq!(payment.status(), PaymentStatus::Captured);
        assert!(!payment.facts.contains(StatusFacts::PENDING));
    }

    #[tokio::test]
    async fn test_authorize_marks_authorized() {
        let gateway = OfflineGateway;
        let mut payment = Payment::new(PaymentId::new("p-1"));
        let params = HashMap::new();
        let token = token();

        gateway
            .execute(GatewayRequest {
                kind: RequestKind::Authorize,
                token: &token,
                params: &params,
                payment: &mut payment,
            })
            .await
            .unwrap();

        assert_eq!(payment.status(), PaymentStatus::Authorized);
    }
}
