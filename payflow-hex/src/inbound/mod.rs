//! HTTP Inbound Adapter
//!
//! Axum-based HTTP server that drives the application layer.

mod auth;
mod extract;
mod handlers;
mod rate_limit;
mod server;
mod view;

pub use extract::{PayumToken, TOKEN_PARAM};
pub use server::{HttpServer, ServerConfig};
