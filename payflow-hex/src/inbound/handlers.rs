//! HTTP request handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Form, Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
};

use payflow_types::{
    AppError, ChooseGatewayForm, CreateGatewayConfigRequest, GatewayConfigResponse,
    PaymentRepository, PaymentStatusResponse, RequestKind,
};

use super::extract::PayumToken;
use super::view;
use crate::PaymentService;
use crate::engine::{CaptureOutcome, StepRequest};

/// Application state shared across handlers.
pub struct AppState<R: PaymentRepository> {
    pub service: PaymentService<R>,
    /// SHA-256 of the admin API key. `None` disables the admin routes.
    pub admin_key_hash: Option<String>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::InvalidRequest(_) | AppError::InvalidPayment => StatusCode::BAD_REQUEST,
            AppError::TokenNotFound | AppError::PaymentNotFound(_) | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::UnknownGateway(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let message = match &self.0 {
            AppError::InvalidRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::Conflict(msg)
            | AppError::Internal(msg) => msg.clone(),
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Payments
// ─────────────────────────────────────────────────────────────────────────────

/// Create a payment from a JSON document.
#[tracing::instrument(skip(state, headers, body))]
pub async fn create_payment<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("json"));
    if !is_json {
        return Err(AppError::InvalidRequest("The request content type is invalid".into()).into());
    }

    let document: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::InvalidRequest("The request content is not valid json".into()))?;

    let created = state.service.create_payment(document).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Payment status for a status token.
#[tracing::instrument(skip(state, token))]
pub async fn get_payment<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    PayumToken(token): PayumToken,
    uri: Uri,
) -> Result<Json<PaymentStatusResponse>, ApiError> {
    let status = state.service.get_payment_status(token, uri.path()).await?;
    Ok(Json(status))
}

// ─────────────────────────────────────────────────────────────────────────────
// Capture / authorize
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state, token, params))]
pub async fn capture<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    PayumToken(token): PayumToken,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let request = StepRequest {
        chosen_gateway: None,
        params,
    };
    run_step(&state, token, &uri, RequestKind::Capture, request).await
}

#[tracing::instrument(skip(state, token, params, form))]
pub async fn capture_submit<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    PayumToken(token): PayumToken,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
    Form(form): Form<ChooseGatewayForm>,
) -> Result<Response, ApiError> {
    let request = StepRequest {
        chosen_gateway: form.gateway_name,
        params,
    };
    run_step(&state, token, &uri, RequestKind::Capture, request).await
}

#[tracing::instrument(skip(state, token, params))]
pub async fn authorize<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    PayumToken(token): PayumToken,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let request = StepRequest {
        chosen_gateway: None,
        params,
    };
    run_step(&state, token, &uri, RequestKind::Authorize, request).await
}

#[tracing::instrument(skip(state, token, params, form))]
pub async fn authorize_submit<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    PayumToken(token): PayumToken,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
    Form(form): Form<ChooseGatewayForm>,
) -> Result<Response, ApiError> {
    let request = StepRequest {
        chosen_gateway: form.gateway_name,
        params,
    };
    run_step(&state, token, &uri, RequestKind::Authorize, request).await
}

async fn run_step<R: PaymentRepository>(
    state: &AppState<R>,
    token: Option<payflow_types::TokenHash>,
    uri: &Uri,
    kind: RequestKind,
    request: StepRequest,
) -> Result<Response, ApiError> {
    let outcome = state
        .service
        .execute(token, uri.path(), kind, request)
        .await?;

    let response = match outcome {
        CaptureOutcome::ChooseGateway { gateways } => {
            Html(view::choose_gateway_page(&gateways)).into_response()
        }
        CaptureOutcome::Redirect(url) => found(url),
        CaptureOutcome::Settled {
            after_url: Some(url),
            ..
        } => found(url),
        CaptureOutcome::Settled {
            payment,
            after_url: None,
        } => Json(PaymentStatusResponse {
            status: payment.status(),
            payment: payment.to_document(),
        })
        .into_response(),
    };

    Ok(response)
}

/// 302 with a Location header.
fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

// ─────────────────────────────────────────────────────────────────────────────
// Gateway configs (admin)
// ─────────────────────────────────────────────────────────────────────────────

/// Register a gateway config.
#[tracing::instrument(skip(state), fields(gateway = %req.gateway_name))]
pub async fn create_gateway<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<CreateGatewayConfigRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let config = state.service.add_gateway_config(req).await?;
    Ok((StatusCode::CREATED, Json(GatewayConfigResponse::from(config))))
}

/// List gateway configs in registration order.
#[tracing::instrument(skip(state))]
pub async fn list_gateways<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<impl IntoResponse, ApiError> {
    let configs = state.service.list_gateway_configs().await?;
    let body: Vec<GatewayConfigResponse> = configs.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// Remove a gateway config.
#[tracing::instrument(skip(state))]
pub async fn delete_gateway<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.delete_gateway_config(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
