//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod gateway;
mod repository;
mod urls;

pub use gateway::{Execution, Gateway, GatewayRequest, RequestKind};
pub use repository::PaymentRepository;
pub use urls::{Route, TokenTarget, UrlResolver};
