//! Gateway port.
//!
//! A gateway is a pluggable payment backend. Implementations live in the
//! `payflow-gateways` crate; wire protocols of real providers are out of scope.

use std::collections::HashMap;

use crate::domain::{Payment, Token};
use crate::error::GatewayError;

/// Which lifecycle step the gateway is asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Capture,
    Authorize,
}

/// A capture or authorize request handed to a gateway.
pub struct GatewayRequest<'a> {
    pub kind: RequestKind,
    /// The verified token driving this step
    pub token: &'a Token,
    /// Query parameters of the inbound HTTP request
    pub params: &'a HashMap<String, String>,
    /// The payment. Gateways record facts and extra details on it.
    pub payment: &'a mut Payment,
}

/// Result of a successful gateway execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
    /// The step finished synchronously.
    Completed,
    /// The payer must be sent to this URL before the step can finish.
    Redirect(String),
}

/// Port trait for payment gateways.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    async fn execute(&self, request: GatewayRequest<'_>) -> Result<Execution, GatewayError>;
}
