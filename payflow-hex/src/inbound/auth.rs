//! Authentication middleware for the admin API key.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use payflow_repo::security::verify_api_key;
use payflow_types::PaymentRepository;

use super::handlers::AppState;

/// Extracts the API key from the Authorization header.
/// Expected format: "Bearer <api_key>" or just "<api_key>"
fn extract_api_key(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;
    Some(header.strip_prefix("Bearer ").unwrap_or(header))
}

/// Guards the gateway-config routes.
///
/// The presented key is hashed with SHA-256 and compared in constant time
/// against the configured admin key hash. Without a configured key every
/// request is rejected.
pub async fn admin_auth_middleware<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(stored_hash) = state.admin_key_hash.as_deref() else {
        return unauthorized_response("Admin API is disabled");
    };

    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    let api_key = match extract_api_key(auth_header) {
        Some(key) if !key.is_empty() => key,
        _ => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    if verify_api_key(api_key, stored_hash) {
        next.run(request).await
    } else {
        tracing::warn!(path = %request.uri().path(), "rejected admin request");
        unauthorized_response("Invalid API key")
    }
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": message,
            "code": 401
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_api_key_bearer() {
        assert_eq!(
            extract_api_key(Some("Bearer adm_test_123")),
            Some("adm_test_123")
        );
    }

    #[test]
    fn test_extract_api_key_raw() {
        assert_eq!(extract_api_key(Some("adm_test_123")), Some("adm_test_123"));
    }

    #[test]
    fn test_extract_api_key_none() {
        assert_eq!(extract_api_key(None), None);
    }
}
