//! Bearer-authenticated JSON API client.

use crate::{ApiError, ApiResult};
use client_store::{KeyValueStore, StoreExt, StoreKeys};
use reqwest::RequestBuilder;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// JSON-over-HTTP client for the Skillexa API.
///
/// Every request reads the bearer token from the store under
/// [`StoreKeys::TOKEN`] and attaches it as `Authorization: Bearer <token>`.
/// A missing token sends no header and lets the server answer 401.
///
/// No request timeout is applied at this layer: a hung request leaves the
/// caller's loading state up until it settles. Accepted gap.
#[derive(Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
    store: Arc<dyn KeyValueStore>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Arguments
    /// * `base_url` - The API base URL (e.g., `https://api.skillexa.app`)
    /// * `store` - Store holding the bearer credential
    pub fn new(base_url: impl Into<String>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
            store,
        }
    }

    /// Build the full URL for an endpoint path.
    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Current bearer token, if signed in.
    fn bearer_token(&self) -> Option<String> {
        self.store.get(StoreKeys::TOKEN, None)
    }

    /// Issue a GET and parse the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.endpoint(path);
        debug!(url = %url, "GET");
        self.execute(self.http_client.get(&url)).await
    }

    /// Issue a POST with a JSON body and parse the JSON response.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path);
        debug!(url = %url, "POST");
        self.execute(self.http_client.post(&url).json(body)).await
    }

    /// Issue a PATCH with a JSON body and parse the JSON response.
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path);
        debug!(url = %url, "PATCH");
        self.execute(self.http_client.patch(&url).json(body)).await
    }

    /// Issue a DELETE. The response body is ignored; only the status matters.
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        let url = self.endpoint(path);
        debug!(url = %url, "DELETE");

        let builder = self.authorize(self.http_client.delete(&url));
        let response = builder.send().await?;
        self.check_status(response.status())?;
        Ok(())
    }

    /// Attach the bearer header when a token is present.
    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.bearer_token() {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => {
                warn!("No stored credential, sending unauthenticated request");
                builder
            }
        }
    }

    /// Send a request, check the status, and parse the JSON body.
    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let response = self.authorize(builder).send().await?;
        self.check_status(response.status())?;

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Map an HTTP status into the error taxonomy.
    fn check_status(&self, status: reqwest::StatusCode) -> ApiResult<()> {
        if status.as_u16() == 401 {
            warn!("Request rejected: credential expired or missing");
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            error!(status = status.as_u16(), "Request failed");
            return Err(ApiError::RequestFailed {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
