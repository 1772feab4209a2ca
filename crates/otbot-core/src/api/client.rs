//! Bearer-authenticated requests against the service REST API.

use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};

/// Build the HTTP client shared by the session manager and the API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
pub fn http_client(config: &Config) -> Result<Client> {
    Ok(Client::builder().timeout(config.request_timeout).build()?)
}

/// Successful answer of an authorized request
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: Config,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: Config, client: Client) -> Self {
        Self {
            client,
            config,
            token: None,
        }
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            config: self.config.clone(),
            token: Some(token),
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let token = self.token.as_deref().ok_or(Error::NotAuthenticated)?;
        let mut headers = header::HeaderMap::new();
        let bearer = header::HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| Error::Authorization("access token is not a valid header value".to_string()))?;
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }

    /// GET `path` on the service with the cached bearer token.
    ///
    /// Any status other than 200 is reported as [`Error::Authorization`]
    /// carrying the status line.
    pub async fn authorized_get(&self, path: &str) -> Result<ApiResponse> {
        let url = self.config.api_url(path);
        let headers = self.auth_headers()?;

        debug!(url = %url, "GET");
        let response = self.client.get(&url).headers(headers).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(url = %url, %status, "Request rejected");
            return Err(Error::from_api_status(status));
        }

        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }

    /// GET `path` and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.authorized_get(path).await?.json()
    }
}
