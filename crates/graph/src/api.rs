//! REST client for Microsoft Graph.

use async_trait::async_trait;
use homepage_core::error::CoreError;
use reqwest::header::{AUTHORIZATION, IF_MATCH};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

pub const GRAPH_V1_URL: &str = "https://graph.microsoft.com/v1.0";
pub const GRAPH_BETA_URL: &str = "https://graph.microsoft.com/beta";

/// Errors from the Graph layer.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Graph returned a non-2xx status code.
    #[error("Graph API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The body did not have the shape we expected.
    #[error("Unexpected response payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// Invalid input or a missing target, detected before or between calls.
    #[error(transparent)]
    Core(#[from] CoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    V1,
    Beta,
}

/// The verbs the pipelines use. Paths start with `/` and are relative to
/// the versioned service root; they may carry a query string.
#[async_trait]
pub trait GraphApi: Send + Sync {
    async fn get(&self, version: ApiVersion, path: &str) -> Result<Value, GraphError>;

    async fn post(&self, path: &str, body: &Value) -> Result<Value, GraphError>;

    /// `if_match` carries the optimistic-concurrency token where the
    /// resource requires one. A `204 No Content` reply reads as `Null`.
    async fn patch(&self, path: &str, body: &Value, if_match: Option<&str>) -> Result<Value, GraphError>;
}

#[derive(Deserialize)]
struct Collection<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

/// GET a collection resource and decode its `value` array.
pub async fn get_collection<G, T>(api: &G, version: ApiVersion, path: &str) -> Result<Vec<T>, GraphError>
where
    G: GraphApi + ?Sized,
    T: DeserializeOwned,
{
    let body = api.get(version, path).await?;
    Ok(serde_json::from_value::<Collection<T>>(body)?.value)
}

/// GET a single resource and decode it.
pub async fn get_as<G, T>(api: &G, path: &str) -> Result<T, GraphError>
where
    G: GraphApi + ?Sized,
    T: DeserializeOwned,
{
    let body = api.get(ApiVersion::V1, path).await?;
    Ok(serde_json::from_value(body)?)
}

/// HTTP client for Graph with a delegated bearer token.
pub struct GraphClient {
    client: reqwest::Client,
    access_token: String,
}

impl GraphClient {
    pub fn new(access_token: String) -> Self {
        Self::with_client(reqwest::Client::new(), access_token)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, access_token: String) -> Self {
        Self { client, access_token }
    }

    fn url(version: ApiVersion, path: &str) -> String {
        let root = match version {
            ApiVersion::V1 => GRAPH_V1_URL,
            ApiVersion::Beta => GRAPH_BETA_URL,
        };
        format!("{root}{path}")
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    // ---- private helpers ----

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GraphError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GraphError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Decode a success body as JSON; an empty body is `Null`.
    async fn parse_response(response: reqwest::Response) -> Result<Value, GraphError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn get(&self, version: ApiVersion, path: &str) -> Result<Value, GraphError> {
        let response = self
            .client
            .get(Self::url(version, path))
            .header(AUTHORIZATION, self.bearer())
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, GraphError> {
        let response = self
            .client
            .post(Self::url(ApiVersion::V1, path))
            .header(AUTHORIZATION, self.bearer())
            .json(body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn patch(&self, path: &str, body: &Value, if_match: Option<&str>) -> Result<Value, GraphError> {
        let mut request = self
            .client
            .patch(Self::url(ApiVersion::V1, path))
            .header(AUTHORIZATION, self.bearer())
            .json(body);
        if let Some(etag) = if_match {
            request = request.header(IF_MATCH, etag);
        }
        let response = request.send().await?;

        Self::parse_response(response).await
    }
}
