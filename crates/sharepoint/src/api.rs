//! REST client for SharePoint site endpoints.
//!
//! Requests ask for `odata=nometadata` JSON so list items come back as
//! plain objects keyed by internal field name.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde_json::Value;

const ACCEPT_NOMETADATA: &str = "application/json;odata=nometadata";

/// Errors from the SharePoint REST layer.
#[derive(Debug, thiserror::Error)]
pub enum SharePointError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// SharePoint returned a non-2xx status code.
    #[error("SharePoint API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The body was not the JSON we expected.
    #[error("Unexpected response payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl SharePointError {
    /// Whether the server answered but refused the query shape. These are
    /// the failures a cheaper query variant can recover from.
    pub fn is_rejected_query(&self) -> bool {
        matches!(self, Self::ApiError { .. })
    }
}

/// Anything that can answer a GET against a site REST URL with JSON.
#[async_trait]
pub trait ListSource: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, SharePointError>;
}

/// HTTP client for SharePoint sites in one tenant.
pub struct SharePointApi {
    client: reqwest::Client,
    access_token: Option<String>,
}

impl SharePointApi {
    /// Create a client. Without a token requests are sent unauthenticated,
    /// which only works when the host injects credentials itself.
    pub fn new(access_token: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), access_token)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, access_token: Option<String>) -> Self {
        Self { client, access_token }
    }

    // ---- private helpers ----

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, SharePointError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SharePointError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response(response: reqwest::Response) -> Result<Value, SharePointError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ListSource for SharePointApi {
    async fn get_json(&self, url: &str) -> Result<Value, SharePointError> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, ACCEPT_NOMETADATA)
            .header("odata-version", "");
        if let Some(token) = &self.access_token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = request.send().await?;
        Self::parse_response(response).await
    }
}

/// `<site>/_api/web/lists/getbytitle('<title>')` with the title
/// percent-encoded.
pub fn list_endpoint(site_url: &str, list_title: &str) -> String {
    format!(
        "{}/_api/web/lists/getbytitle('{}')",
        site_url.trim_end_matches('/'),
        urlencoding::encode(list_title)
    )
}
