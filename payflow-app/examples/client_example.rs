//! Client example walking a payment through the service end to end.
//!
//! Run with: cargo run -p payflow-app --example client_example --no-default-features --features sqlite

use std::{net::SocketAddr, sync::Arc};

use payflow_client::{PayflowClient, StepResponse};
use payflow_hex::{
    PaymentService, RouteUrlResolver,
    inbound::{HttpServer, ServerConfig},
};
use payflow_repo::build_repo;
use payflow_types::CreateGatewayConfigRequest;
use serde_json::{Map, json};
use tempfile::tempdir;
use tokio::net::TcpListener;

const ADMIN_KEY: &str = "adm_example_secret";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().with_env_filter("info").init();

    // Find an available port
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;
    let port = addr.port();
    drop(listener);

    // Use a temp file-backed SQLite DB
    let tmp = tempdir()?;
    let db_path = tmp.path().join("payflow.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let base_url = format!("http://127.0.0.1:{port}");

    println!("🚀 Starting server on port {port}...");
    println!("   Database: {db_url}");

    // Build repository (handles connection and migration)
    let repo = build_repo(&db_url).await?;

    // Start server in background
    let service = PaymentService::new(repo, Arc::new(RouteUrlResolver::new(base_url.clone())));
    let server = HttpServer::with_config(
        service,
        ServerConfig {
            admin_api_key: Some(ADMIN_KEY.to_string()),
            ..ServerConfig::default()
        },
    );
    let router = server.router();

    let server_listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    tokio::spawn(async move {
        let app = router.into_make_service_with_connect_info::<SocketAddr>();
        if let Err(e) = axum::serve(server_listener, app).await {
            eprintln!("server stopped: {e}");
        }
    });

    // Wait for server to start
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    let client = PayflowClient::new(&base_url);

    // ─────────────────────────────────────────────────────────────────────────
    // Demo: purchase flow with a gateway choice
    // ─────────────────────────────────────────────────────────────────────────

    let health = client.health().await?;
    println!("✅ Server health: {health}");

    // Gateway management needs the admin key
    let response = client.list_gateways().await;
    assert!(response.is_err());
    println!("✅ Unauthorized without key: {}", response.unwrap_err());

    let admin = PayflowClient::new(&base_url).with_api_key(ADMIN_KEY);
    for name in ["FooGateway", "BarGateway"] {
        let created = admin
            .add_gateway(&CreateGatewayConfigRequest {
                factory_name: "offline".to_string(),
                gateway_name: name.to_string(),
                config: Map::new(),
            })
            .await?;
        println!("✅ Registered gateway: {} ({})", created.gateway_name, created.factory_name);
    }

    // meta.name is not a configured gateway, so the payer gets to choose
    let mut payment = Map::new();
    payment.insert("amount".to_string(), json!(1999));
    payment.insert("currency".to_string(), json!("EUR"));
    let created = client
        .create_payment("shop", "https://shop.example/thanks", payment)
        .await?;
    let purchase = created["meta"]["links"]["purchase"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let get = created["meta"]["links"]["get"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    println!("✅ Created payment {}", created["id"]);
    println!("   Purchase link: {purchase}");

    match client.open_step(&purchase).await? {
        StepResponse::Page(_) => println!("✅ Purchase link shows the gateway chooser"),
        StepResponse::Redirect(to) => println!("   Unexpected redirect to {to}"),
    }

    let next = match client.choose_gateway(&purchase, "BarGateway").await? {
        StepResponse::Redirect(to) => to,
        StepResponse::Page(_) => anyhow::bail!("choice was not accepted"),
    };
    println!("✅ Chose BarGateway, continuing at {next}");

    match client.open_step(&next).await? {
        StepResponse::Redirect(to) => println!("✅ Captured, payer returns to {to}"),
        StepResponse::Page(_) => anyhow::bail!("capture did not settle"),
    }

    let status = client.payment_status(&get).await?;
    println!("✅ Status of {}: {:?}", status.payment["id"], status.status);

    // The status link is single use
    let again = client.payment_status(&get).await;
    assert!(again.is_err());
    println!("✅ Status link spent: {}", again.unwrap_err());

    let gateways = admin.list_gateways().await?;
    println!("\n📋 Gateways:");
    for gateway in gateways {
        println!("   - {} ({})", gateway.gateway_name, gateway.factory_name);
    }

    println!("\n🎉 Example completed successfully!");

    Ok(())
}
