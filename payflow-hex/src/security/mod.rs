//! Token issuance and verification.

mod token_factory;
mod verifier;

pub use token_factory::TokenFactory;
pub use verifier::HttpRequestVerifier;
