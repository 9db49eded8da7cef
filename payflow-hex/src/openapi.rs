//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use payflow_types::domain::{GatewayConfigId, PaymentStatus};
use payflow_types::dto::{
    ChooseGatewayForm, CreateGatewayConfigRequest, GatewayConfigResponse, PaymentLinks,
    PaymentStatusResponse,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Create a payment
///
/// The body is stored as the payment details. `meta.links.purchase` in the
/// response is shown only once.
#[utoipa::path(
    post,
    path = "/api/payment",
    tag = "payments",
    request_body(
        content = inline(serde_json::Value),
        content_type = "application/json",
        example = json!({
            "meta": {"name": "FooGateway", "purchase_after_url": "https://shop.example/done"},
            "payment": {"amount": 100, "currency": "USD"}
        })
    ),
    responses(
        (status = 201, description = "Payment created", body = inline(serde_json::Value)),
        (status = 400, description = "Missing or malformed field")
    )
)]
async fn create_payment() {}

/// Payment status (consumes the status token)
#[utoipa::path(
    get,
    path = "/api/payment/{payum_token}",
    tag = "payments",
    params(("payum_token" = String, Path, description = "Status token hash")),
    responses(
        (status = 200, description = "Payment and its status", body = PaymentStatusResponse),
        (status = 404, description = "Token not found or already used")
    )
)]
async fn get_payment() {}

/// Capture step
#[utoipa::path(
    get,
    path = "/payment/capture/{payum_token}",
    tag = "flow",
    params(("payum_token" = String, Path, description = "Capture token hash")),
    responses(
        (status = 200, description = "Gateway choice form (text/html)"),
        (status = 302, description = "Redirect to the gateway, the next step or the after URL"),
        (status = 404, description = "Token not found or already used"),
        (status = 502, description = "Gateway rejected the request")
    )
)]
async fn capture() {}

/// Submit the gateway choice for a capture step
#[utoipa::path(
    post,
    path = "/payment/capture/{payum_token}",
    tag = "flow",
    params(("payum_token" = String, Path, description = "Capture token hash")),
    request_body(content = ChooseGatewayForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Redirect to a fresh capture token"),
        (status = 400, description = "Gateway not configured")
    )
)]
async fn capture_submit() {}

/// Authorize step
#[utoipa::path(
    get,
    path = "/payment/authorize/{payum_token}",
    tag = "flow",
    params(("payum_token" = String, Path, description = "Authorize token hash")),
    responses(
        (status = 200, description = "Gateway choice form (text/html)"),
        (status = 302, description = "Redirect to the gateway, the next step or the after URL"),
        (status = 404, description = "Token not found or already used")
    )
)]
async fn authorize() {}

/// Submit the gateway choice for an authorize step
#[utoipa::path(
    post,
    path = "/payment/authorize/{payum_token}",
    tag = "flow",
    params(("payum_token" = String, Path, description = "Authorize token hash")),
    request_body(content = ChooseGatewayForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Redirect to a capture token for the chosen gateway"),
        (status = 400, description = "Gateway not configured")
    )
)]
async fn authorize_submit() {}

/// Register a gateway config
#[utoipa::path(
    post,
    path = "/api/gateways",
    tag = "gateways",
    request_body = CreateGatewayConfigRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Gateway registered", body = GatewayConfigResponse),
        (status = 400, description = "Unknown factory or invalid settings"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Gateway name already taken")
    )
)]
async fn create_gateway() {}

/// List gateway configs in registration order
#[utoipa::path(
    get,
    path = "/api/gateways",
    tag = "gateways",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Gateway configs", body = Vec<GatewayConfigResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
async fn list_gateways() {}

/// Remove a gateway config
#[utoipa::path(
    delete,
    path = "/api/gateways/{name}",
    tag = "gateways",
    security(("bearer_auth" = [])),
    params(("name" = String, Path, description = "Gateway name")),
    responses(
        (status = 204, description = "Gateway removed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Gateway not found")
    )
)]
async fn delete_gateway() {}

/// OpenAPI documentation for the Payflow API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payflow Payment Orchestration API",
        version = "1.0.0",
        description = "Single-use payment tokens, gateway choice and capture/authorize flows.\n\n## Authentication\n\nGateway administration requires the admin key in the `Authorization` header:\n\n```\nAuthorization: Bearer <ADMIN_API_KEY>\n```\n\nPayment flow routes are authorized by the token in their URL.",
        license(name = "MIT"),
    ),
    paths(
        health,
        create_payment,
        get_payment,
        capture,
        capture_submit,
        authorize,
        authorize_submit,
        create_gateway,
        list_gateways,
        delete_gateway,
    ),
    components(
        schemas(
            PaymentLinks,
            PaymentStatusResponse,
            PaymentStatus,
            ChooseGatewayForm,
            CreateGatewayConfigRequest,
            GatewayConfigResponse,
            GatewayConfigId,
        )
    ),

    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "payments", description = "Payment creation and status"),
        (name = "flow", description = "Token-driven capture and authorize steps"),
        (name = "gateways", description = "Gateway config management"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for Bearer token authentication.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
