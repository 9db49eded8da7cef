//! # Payflow Hex
//!
//! Application service layer and HTTP adapter for the payment orchestration service.
//!
//! ## Architecture
//!
//! - `security/` - Token factory and request verifier
//! - `registry` - Gateway name -> instance resolution
//! - `engine` - Capture / authorize state machine
//! - `service` - Application service (orchestrates the above)
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The service is generic over `R: PaymentRepository`, allowing
//! different repository implementations to be injected.

pub mod engine;
pub mod inbound;
pub mod openapi;
pub mod registry;
pub mod security;
pub mod service;
pub mod urls;


pub use engine::{CaptureOutcome, StepRequest};
pub use service::PaymentService;
pub use urls::RouteUrlResolver;
