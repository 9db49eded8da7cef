//! Mints and persists single-use tokens.

use std::sync::Arc;

use payflow_repo::security::generate_token_hash;
use payflow_types::{
    AppError, Payment, PaymentRepository, Route, Token, TokenTarget, UrlResolver,
};

use crate::urls::with_token_query;

/// Issues tokens for payment steps.
///
/// Capture and authorize tokens get a tokenized after URL: a status token
/// for the same payment is minted first and its hash is appended to the
/// caller's landing page (`<after_url>?payum_token=<hash>`). The landing page
/// redeems it once at `/api/payment/{hash}`.
pub struct TokenFactory<R: PaymentRepository> {
    repo: Arc<R>,
    urls: Arc<dyn UrlResolver>,
}

impl<R: PaymentRepository> TokenFactory<R> {
    pub fn new(repo: Arc<R>, urls: Arc<dyn UrlResolver>) -> Self {
        Self { repo, urls }
    }

    /// Token for the capture route.
    pub async fn create_capture_token(
        &self,
        payment_name: &str,
        payment: &Payment,
        after_url: &str,
    ) -> Result<Token, AppError> {
        let after = self.tokenized_after_url(payment_name, payment, after_url).await?;
        self.create_step_token(Route::Capture, payment_name, payment, Some(after))
            .await
    }

    /// Token for the authorize route.
    pub async fn create_authorize_token(
        &self,
        payment_name: &str,
        payment: &Payment,
        after_url: &str,
    ) -> Result<Token, AppError> {
        let after = self.tokenized_after_url(payment_name, payment, after_url).await?;
        self.create_step_token(Route::Authorize, payment_name, payment, Some(after))
            .await
    }

    /// Generic token targeting a named route or an absolute URL.
    pub async fn create_token(
        &self,
        payment_name: &str,
        payment: &Payment,
        target: TokenTarget,
    ) -> Result<Token, AppError> {
        match target {
            TokenTarget::Route(route) => {
                self.create_step_token(route, payment_name, payment, None)
                    .await
            }
            TokenTarget::Url(url) => {
                ensure_persisted(payment)?;
                let hash = generate_token_hash();
                let target_url = with_token_query(&url, &hash);
                self.persist(Token::new(hash, payment_name, payment.id.clone(), target_url), payment)
                    .await
            }
        }
    }

    /// Token for one of our routes with an already-resolved after URL.
    ///
    /// Used when a flow hands its after URL on to a follow-up step.
    pub(crate) async fn create_step_token(
        &self,
        route: Route,
        payment_name: &str,
        payment: &Payment,
        after_url: Option<String>,
    ) -> Result<Token, AppError> {
        ensure_persisted(payment)?;
        let hash = generate_token_hash();
        let target_url = self.urls.resolve(route, &hash);
        let token = Token::new(hash, payment_name, payment.id.clone(), target_url)
            .with_after_url(after_url);
        self.persist(token, payment).await
    }

    async fn tokenized_after_url(
        &self,
        payment_name: &str,
        payment: &Payment,
        after_url: &str,
    ) -> Result<String, AppError> {
        let status = self
            .create_step_token(Route::PaymentGet, payment_name, payment, None)
            .await?;
        Ok(with_token_query(after_url, &status.hash))
    }

    async fn persist(&self, token: Token, payment: &Payment) -> Result<Token, AppError> {
        let token = token.with_gateway_name(payment.gateway_name.clone());
        self.repo.insert_token(&token).await?;
        tracing::debug!(payment_id = %payment.id, target = %token.target_url, "token issued");
        Ok(token)
    }
}

fn ensure_persisted(payment: &Payment) -> Result<(), AppError> {
    if payment.is_persisted() {
        Ok(())
    } else {
        Err(AppError::InvalidPayment)
    }
}
