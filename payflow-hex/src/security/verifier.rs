//! Verifies inbound requests against issued tokens.

use std::sync::Arc;

use payflow_types::{AppError, PaymentRepository, Token, TokenHash};
use url::Url;

/// Checks and consumes tokens presented on HTTP requests.
pub struct HttpRequestVerifier<R: PaymentRepository> {
    repo: Arc<R>,
}

impl<R: PaymentRepository> HttpRequestVerifier<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Resolves and claims the token for a request.
    ///
    /// The request path must be the path the token was issued for. A path
    /// mismatch leaves the token in storage.
    pub async fn verify(
        &self,
        hash: Option<TokenHash>,
        request_path: &str,
    ) -> Result<Token, AppError> {
        let hash = hash
            .filter(|h| !h.as_str().is_empty())
            .ok_or(AppError::TokenNotFound)?;

        let token = self
            .repo
            .find_token(&hash)
            .await?
            .ok_or(AppError::TokenNotFound)?;

        let target_path = target_path(&token.target_url);
        if target_path != request_path {
            tracing::warn!(
                expected = %target_path,
                actual = %request_path,
                "token presented on the wrong path"
            );
            return Err(AppError::InvalidRequest(
                "Invalid token. The token target path does not match the request path".into(),
            ));
        }

        // Lost a race with another request presenting the same hash.
        self.repo
            .claim_token(&hash)
            .await?
            .ok_or(AppError::TokenNotFound)
    }

    /// Deletes a token. Safe to call on an already consumed token.
    pub async fn invalidate(&self, token: &Token) -> Result<(), AppError> {
        self.repo.delete_token(&token.hash).await?;
        Ok(())
    }

    /// Puts a claimed token back so the suspended step can be resumed once.
    pub async fn release(&self, token: &Token) -> Result<(), AppError> {
        self.repo.insert_token(token).await?;
        tracing::debug!(payment_id = %token.details, "token released for resume");
        Ok(())
    }
}

fn target_path(target_url: &str) -> String {
    match Url::parse(target_url) {
        Ok(url) => url.path().to_string(),
        Err(_) => target_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_path_from_absolute_url() {
        assert_eq!(
            target_path("http://localhost:3000/payment/capture/abc?x=1"),
            "/payment/capture/abc"
        );
    }

    #[test]
    fn test_target_path_from_relative_url() {
        assert_eq!(target_path("/api/payment/abc?x=1"), "/api/payment/abc");
    }
}
