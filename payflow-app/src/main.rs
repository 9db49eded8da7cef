//! # Payflow Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the repository adapter
//! - Create the payment service and build every configured gateway
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use opentelemetry::global;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use payflow_hex::{
    PaymentService, RouteUrlResolver,
    inbound::{HttpServer, ServerConfig},
};
use payflow_repo::build_repo;

fn init_tracer() -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .map_err(|e| anyhow::anyhow!("failed to create OTLP span exporter: {}", e))?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("payflow-service"), provider))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize OpenTelemetry tracing
    let (otel_tracer, otel_provider) = init_tracer()?;
    let telemetry = tracing_opentelemetry::layer().with_tracer(otel_tracer);

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,payflow_app=debug,payflow_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry)
        .init();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting payflow server on port {}", config.port);
    tracing::info!("Using database: {}", config.database_url);
    tracing::info!("Issuing tokens for {}", config.public_base_url);
    if config.admin_api_key.is_none() {
        tracing::warn!("ADMIN_API_KEY is not set; gateway administration is disabled");
    }

    // Build repository (handles connection and migration)
    let repo = build_repo(&config.database_url).await?;

    // Create the payment service
    let urls = Arc::new(RouteUrlResolver::new(config.public_base_url.clone()));
    let service = PaymentService::new(repo, urls);

    // Fail fast on gateway configs that can no longer be built
    let ready = service
        .warm_up()
        .await
        .map_err(|e| anyhow::anyhow!("gateway warm-up failed: {}", e))?;
    tracing::info!("{} gateway(s) ready", ready);

    // Create and run the HTTP server
    let server = HttpServer::with_config(
        service,
        ServerConfig {
            admin_api_key: config.admin_api_key,
            rate_limit_per_minute: config.rate_limit_per_minute,
            trust_forwarded_for: config.trust_forwarded_for,
        },
    );
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    // Ensure traces are flushed before exit
    let _ = otel_provider.shutdown();
    Ok(())
}
