//! Payflow CLI
//!
//! Command-line interface for the payflow API.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use payflow_client::{PayflowClient, StepResponse};
use payflow_types::CreateGatewayConfigRequest;

#[derive(Parser)]
#[command(name = "payflow")]
#[command(author, version, about = "Payflow API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the payflow API
    #[arg(long, env = "PAYFLOW_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Admin API key for gateway management
    #[arg(long, env = "PAYFLOW_ADMIN_KEY")]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Payment operations
    Payment {
        #[command(subcommand)]
        action: PaymentCommands,
    },
    /// Gateway config management (requires the admin key)
    Gateway {
        #[command(subcommand)]
        action: GatewayCommands,
    },
    /// Check API health
    Health,
}

#[derive(Subcommand)]
enum PaymentCommands {
    /// Create a payment and print its one-time links
    Create {
        /// Gateway or merchant name stored in meta.name
        #[arg(long)]
        name: String,
        /// Where the payer lands after the purchase
        #[arg(long)]
        after_url: String,
        /// Payment fields as a JSON object
        #[arg(long, default_value = "{}")]
        payment: String,
    },
    /// Read a payment's status (consumes the status link)
    Status {
        /// Status URL or token hash
        link: String,
    },
    /// Open a purchase link and report where it leads
    Open {
        /// Capture or authorize URL
        link: String,
        /// Gateway to submit when the link asks for a choice
        #[arg(long)]
        gateway: Option<String>,
    },
}

#[derive(Subcommand)]
enum GatewayCommands {
    /// Register a gateway config
    Add {
        /// Factory to build the gateway with (offline, hosted_checkout)
        #[arg(long)]
        factory: String,
        /// Gateway name
        #[arg(long)]
        name: String,
        /// Factory settings as a JSON object
        #[arg(long, default_value = "{}")]
        config: String,
    },
    /// List gateway configs
    List,
    /// Remove a gateway config
    Remove {
        /// Gateway name
        name: String,
    },
}

fn parse_object(flag: &str, raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => anyhow::bail!("--{} must be a JSON object", flag),
        Err(e) => anyhow::bail!("--{} is not valid JSON: {}", flag, e),
    }
}

fn print_step(step: StepResponse) {
    match step {
        StepResponse::Redirect(location) => println!("→ {}", location),
        StepResponse::Page(html) => println!("{}", html),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut client = PayflowClient::new(&cli.api_url);
    if let Some(key) = cli.api_key {
        client = client.with_api_key(key);
    }

    match cli.command {
        Commands::Health => {
            let healthy = client.health().await?;
            if healthy {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::Payment { action } => match action {
            PaymentCommands::Create {
                name,
                after_url,
                payment,
            } => {
                let payment = parse_object("payment", &payment)?;
                let created = client.create_payment(&name, &after_url, payment).await?;
                println!("{}", serde_json::to_string_pretty(&created)?);
            }
            PaymentCommands::Status { link } => {
                let status = client.payment_status(&link).await?;
                println!("{}", serde_json::to_string_pretty(&status)?);
            }
            PaymentCommands::Open { link, gateway } => {
                let step = match gateway {
                    Some(gateway) => client.choose_gateway(&link, &gateway).await?,
                    None => client.open_step(&link).await?,
                };
                print_step(step);
            }
        },

        Commands::Gateway { action } => match action {
            GatewayCommands::Add {
                factory,
                name,
                config,
            } => {
                let request = CreateGatewayConfigRequest {
                    factory_name: factory,
                    gateway_name: name,
                    config: parse_object("config", &config)?,
                };
                let created = client.add_gateway(&request).await?;
                println!("{}", serde_json::to_string_pretty(&created)?);
            }
            GatewayCommands::List => {
                let gateways = client.list_gateways().await?;
                println!("{}", serde_json::to_string_pretty(&gateways)?);
            }
            GatewayCommands::Remove { name } => {
                client.delete_gateway(&name).await?;
                println!("✓ Gateway removed");
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_accepts_objects() {
        let map = parse_object("payment", r#"{"amount": 100}"#).unwrap();
        assert_eq!(map["amount"], 100);
    }

    #[test]
    fn test_parse_object_rejects_arrays() {
        let err = parse_object("config", "[1]").unwrap_err();
        assert!(err.to_string().contains("--config must be a JSON object"));
    }

    #[test]
    fn test_cli_parses_gateway_add() {
        let cli = Cli::try_parse_from([
            "payflow",
            "gateway",
            "add",
            "--factory",
            "offline",
            "--name",
            "FooGateway",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Gateway {
                action: GatewayCommands::Add { .. }
            }
        ));
    }
}
