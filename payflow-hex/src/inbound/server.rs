//! HTTP Server configuration and startup.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router, middleware,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use payflow_repo::security::hash_api_key;
use payflow_types::PaymentRepository;

use super::auth::admin_auth_middleware;
use super::handlers::{self, AppState};
use super::rate_limit::{RateLimiterState, rate_limit_middleware};
use crate::PaymentService;
use crate::openapi::ApiDoc;

/// Server options beyond the service itself.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Raw admin key for the gateway-config routes. `None` disables them.
    pub admin_api_key: Option<String>,
    pub rate_limit_per_minute: u32,
    /// Key rate limits on `X-Forwarded-For`. Only set behind a proxy that overwrites it.
    pub trust_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            admin_api_key: None,
            rate_limit_per_minute: 100,
            trust_forwarded_for: false,
        }
    }
}

/// HTTP Server for the Payflow API.
pub struct HttpServer<R: PaymentRepository> {
    state: Arc<AppState<R>>,
    rate_limiter: Arc<RateLimiterState>,
}

impl<R: PaymentRepository> HttpServer<R> {
    /// Creates a new HTTP server with the given service.
    pub fn new(service: PaymentService<R>) -> Self {
        Self::with_config(service, ServerConfig::default())
    }

    /// Creates a new HTTP server with custom rate limiting.
    pub fn with_rate_limit(service: PaymentService<R>, requests_per_minute: u32) -> Self {
        Self::with_config(
            service,
            ServerConfig {
                rate_limit_per_minute: requests_per_minute,
                ..ServerConfig::default()
            },
        )
    }

    pub fn with_config(service: PaymentService<R>, config: ServerConfig) -> Self {
        let admin_key_hash = config
            .admin_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .map(hash_api_key);

        Self {
            state: Arc::new(AppState {
                service,
                admin_key_hash,
            }),
            rate_limiter: Arc::new(
                RateLimiterState::new(config.rate_limit_per_minute, Duration::from_secs(60))
                    .trusting_forwarded_for(config.trust_forwarded_for),
            ),
        }
    }

    pub fn service(&self) -> &PaymentService<R> {
        &self.state.service
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        // Build HTTP metrics layer (uses globally set MeterProvider)
        let metrics = axum_otel_metrics::HttpMetricsLayerBuilder::new().build();

        let admin = Router::new()
            .route(
                "/api/gateways",
                post(handlers::create_gateway::<R>).get(handlers::list_gateways::<R>),
            )
            .route("/api/gateways/{name}", delete(handlers::delete_gateway::<R>))
            .route_layer(middleware::from_fn_with_state(
                self.state.clone(),
                admin_auth_middleware::<R>,
            ));

        Router::new()
            .route("/health", get(handlers::health))
            .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
            .route("/api/payment", post(handlers::create_payment::<R>))
            .route("/api/payment/{payum_token}", get(handlers::get_payment::<R>))
            .route(
                "/payment/capture/{payum_token}",
                get(handlers::capture::<R>).post(handlers::capture_submit::<R>),
            )
            .route(
                "/payment/authorize/{payum_token}",
                get(handlers::authorize::<R>).post(handlers::authorize_submit::<R>),
            )
            .merge(admin)
            .layer(metrics)
            .layer(middleware::from_fn_with_state(
                self.rate_limiter.clone(),
                rate_limit_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
