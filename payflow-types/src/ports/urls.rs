//! URL resolution port.

use crate::domain::TokenHash;

/// Named routes a token can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Capture,
    Authorize,
    PaymentGet,
}

impl Route {
    /// Path template with a `{payum_token}` placeholder.
    pub fn path(&self) -> &'static str {
        match self {
            Route::Capture => "/payment/capture/{payum_token}",
            Route::Authorize => "/payment/authorize/{payum_token}",
            Route::PaymentGet => "/api/payment/{payum_token}",
        }
    }
}

/// What a generic token points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenTarget {
    /// One of our own routes
    Route(Route),
    /// An absolute URL outside the service (e.g. a merchant landing page)
    Url(String),
}

/// Turns a route and token hash into an absolute URL.
pub trait UrlResolver: Send + Sync + 'static {
    fn resolve(&self, route: Route, hash: &TokenHash) -> String;
}
