//! Request extractors.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::extract::{FromRequestParts, Query, RawPathParams};
use axum::http::request::Parts;

use payflow_types::TokenHash;

/// Name of the token parameter in paths and query strings.
pub const TOKEN_PARAM: &str = "payum_token";

/// The token hash of a request: the `payum_token` path parameter, falling
/// back to the `payum_token` query parameter. `None` when neither is set.
#[derive(Debug, Clone)]
pub struct PayumToken(pub Option<TokenHash>);

impl<S: Send + Sync> FromRequestParts<S> for PayumToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let from_path = RawPathParams::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|params| {
                params
                    .iter()
                    .find(|(name, _)| *name == TOKEN_PARAM)
                    .map(|(_, value)| value.to_string())
            });

        let hash = from_path
            .or_else(|| {
                Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
                    .ok()
                    .and_then(|Query(query)| query.get(TOKEN_PARAM).cloned())
            })
            .filter(|value| !value.is_empty())
            .map(TokenHash::new);

        Ok(Self(hash))
    }
}
