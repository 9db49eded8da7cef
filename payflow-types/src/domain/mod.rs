//! Domain models for the payment orchestration service.

pub mod gateway_config;
pub mod payment;
pub mod status;
pub mod token;

pub use gateway_config::{GatewayConfig, GatewayConfigId};
pub use payment::{Payment, PaymentId};
pub use status::{PaymentStatus, StatusFacts};
pub use token::{Token, TokenHash};
