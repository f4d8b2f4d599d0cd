use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use shared::error::ApiError;
use tracing::debug;

use crate::error::ClientError;

/// JSON-over-HTTP client rooted at one backend base URL.
#[derive(Debug, Clone)]
pub struct JsonClient {
    http: Client,
    base_url: String,
}

impl JsonClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.endpoint(path);
        let request = self.http.get(&url);
        self.send(url, request).await
    }

    pub async fn get_with_query<Q, T>(&self, path: &str, query: &Q) -> Result<T, ClientError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let request = self.http.get(&url).query(query);
        self.send(url, request).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let request = self.http.post(&url).json(body);
        self.send(url, request).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let request = self.http.patch(&url).json(body);
        self.send(url, request).await
    }

    /// Non-2xx answers become [`ApiError`] carrying the status and the raw
    /// body; nothing is retried.
    async fn send<T: DeserializeOwned>(
        &self,
        url: String,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(source) => return Err(ClientError::Transport { url, source }),
        };
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(source) => return Err(ClientError::Transport { url, source }),
        };
        debug!(%url, status = status.as_u16(), "backend response");

        if !status.is_success() {
            let message = status.canonical_reason().unwrap_or("unexpected status");
            return Err(ApiError::new(status.as_u16(), message, body).into());
        }

        serde_json::from_str(&body).map_err(|source| ClientError::Decode { url, source })
    }
}
