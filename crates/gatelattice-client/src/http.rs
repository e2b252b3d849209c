//! HTTP snapshot store
//!
//! Talks to the gateway's persistence endpoints. Transport failures and 5xx
//! replies are `Unavailable` (retryable); 404 is `NotFound`; any other 4xx
//! means the request itself was rejected.

use gatelattice_core::{ApiError, SaveRequest, Snapshot, SnapshotMeta};
use gatelattice_engine::{SnapshotStore, StoreError, StoreResult};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3001";

pub struct HttpStore {
    client: Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL plus `segments`, each percent-encoded as a single path segment.
    fn endpoint(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| StoreError::Invalid(format!("bad base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Invalid(format!("bad base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl Default for HttpStore {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

/// Pass successful responses through; turn the rest into a `StoreError`.
async fn check(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&text)
        .map(|e| e.error)
        .unwrap_or(text);

    match status {
        StatusCode::NOT_FOUND => Err(StoreError::NotFound(message)),
        s if s.is_client_error() => Err(StoreError::Invalid(message)),
        s => {
            error!("Snapshot service error {}: {}", s, message);
            Err(StoreError::Unavailable(format!("{}: {}", s, message)))
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| StoreError::Unavailable(format!("unreadable response: {}", e)))
}

#[async_trait::async_trait]
impl SnapshotStore for HttpStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn save(&self, request: SaveRequest) -> StoreResult<SnapshotMeta> {
        debug!("Saving snapshot \"{}\" to {}", request.name, self.base_url);
        let response = self
            .client
            .post(self.endpoint(&["api", "save"])?)
            .json(&request)
            .send()
            .await
            .map_err(transport)?;
        decode(check(response).await?).await
    }

    async fn list(&self) -> StoreResult<Vec<SnapshotMeta>> {
        let response = self
            .client
            .get(self.endpoint(&["api", "saves"])?)
            .send()
            .await
            .map_err(transport)?;
        decode(check(response).await?).await
    }

    async fn load(&self, id: &str) -> StoreResult<Snapshot> {
        let response = self
            .client
            .get(self.endpoint(&["api", "saves", id])?)
            .send()
            .await
            .map_err(transport)?;
        match check(response).await {
            Ok(response) => decode(response).await,
            Err(StoreError::NotFound(_)) => Err(StoreError::NotFound(id.to_string())),
            Err(e) => Err(e),
        }
    }
}
