//! # Payflow Client SDK
//!
//! A typed Rust client for the payflow API.

use payflow_types::{CreateGatewayConfigRequest, GatewayConfigResponse, PaymentStatusResponse};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What a payer-facing step link answered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResponse {
    /// 302 to the next hop
    Redirect(String),
    /// HTML page, e.g. the gateway chooser
    Page(String),
}

/// Payflow API client.
pub struct PayflowClient {
    base_url: String,
    api_key: Option<String>,
    http: Client,
}

impl PayflowClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            // Step endpoints answer with 302; callers inspect them rather than follow
            http: Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap_or_default(),
            api_key: None,
        }
    }

    /// Sets the admin API key used for gateway management.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    /// Creates a payment.
    ///
    /// Returns the stored document with one-time `meta.links.purchase` and
    /// `meta.links.get` URLs.
    pub async fn create_payment(
        &self,
        name: &str,
        purchase_after_url: &str,
        payment: Map<String, Value>,
    ) -> Result<Value, ClientError> {
        let body = json!({
            "meta": {
                "name": name,
                "purchase_after_url": purchase_after_url,
            },
            "payment": payment,
        });
        let req = self
            .http
            .post(format!("{}/api/payment", self.base_url))
            .json(&body);
        self.send(req).await
    }

    /// Reads a payment's status through its single-use status link.
    ///
    /// Accepts either the full `get` URL or just the token hash.
    pub async fn payment_status(&self, link: &str) -> Result<PaymentStatusResponse, ClientError> {
        let url = self.status_url(link);
        self.send(self.http.get(url)).await
    }

    /// Opens a capture or authorize link without following redirects.
    pub async fn open_step(&self, link: &str) -> Result<StepResponse, ClientError> {
        self.step(self.http.get(link)).await
    }

    /// Submits a gateway choice to a capture or authorize link.
    pub async fn choose_gateway(
        &self,
        link: &str,
        gateway_name: &str,
    ) -> Result<StepResponse, ClientError> {
        let req = self
            .http
            .post(link)
            .form(&[("gatewayName", gateway_name)]);
        self.step(req).await
    }

    /// Registers a gateway config.
    pub async fn add_gateway(
        &self,
        request: &CreateGatewayConfigRequest,
    ) -> Result<GatewayConfigResponse, ClientError> {
        let req = self
            .http
            .post(format!("{}/api/gateways", self.base_url))
            .json(request);
        self.send(self.authorized(req)).await
    }

    /// Lists gateway configs in registration order.
    pub async fn list_gateways(&self) -> Result<Vec<GatewayConfigResponse>, ClientError> {
        let req = self.http.get(format!("{}/api/gateways", self.base_url));
        self.send(self.authorized(req)).await
    }

    /// Removes a gateway config by name.
    pub async fn delete_gateway(&self, gateway_name: &str) -> Result<(), ClientError> {
        let req = self
            .http
            .delete(format!("{}/api/gateways/{}", self.base_url, gateway_name));
        let resp = self.authorized(req).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::api_error(resp).await)
        }
    }

    async fn step(&self, req: RequestBuilder) -> Result<StepResponse, ClientError> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_redirection() {
            let location = resp
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            Ok(StepResponse::Redirect(location))
        } else if status.is_success() {
            Ok(StepResponse::Page(resp.text().await?))
        } else {
            Err(Self::api_error(resp).await)
        }
    }

    fn status_url(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else {
            format!("{}/api/payment/{}", self.base_url, link)
        }
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let resp = req.send().await?;
        if resp.status().is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            Err(Self::api_error(resp).await)
        }
    }

    async fn api_error(resp: reqwest::Response) -> ClientError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or(body);
        ClientError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = PayflowClient::new("http://localhost:3000");
        assert_eq!(client.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_client_with_trailing_slash() {
        let client = PayflowClient::new("http://localhost:3000/");
        assert_eq!(client.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_client_with_api_key() {
        let client = PayflowClient::new("http://localhost:3000").with_api_key("adm_key");
        assert_eq!(client.api_key, Some("adm_key".to_string()));
    }

    #[test]
    fn test_status_url_from_token() {
        let client = PayflowClient::new("http://localhost:3000");
        assert_eq!(
            client.status_url("abc123"),
            "http://localhost:3000/api/payment/abc123"
        );
    }

    #[test]
    fn test_status_url_passes_links_through() {
        let client = PayflowClient::new("http://localhost:3000");
        let link = "https://pay.example.com/api/payment/abc123";
        assert_eq!(client.status_url(link), link);
    }
}
