//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::deploy::classify::response_message;
use crate::errors::DeployError;

const GITHUB_API_VERSION: &str = "2022-11-28";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// HTTP client for the GitHub and Actions runtime APIs
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, DeployError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a new HTTP client with a per-request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, DeployError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(
            "x-github-api-version",
            header::HeaderValue::from_static(GITHUB_API_VERSION),
        );

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("deploy-pages/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &SecretString,
    ) -> Result<T, DeployError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        let response = check_status("GET", url, response).await?;
        let body = response.json().await?;
        Ok(body)
    }

    /// Make a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        token: &SecretString,
        body: &B,
    ) -> Result<T, DeployError> {
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .bearer_auth(token.expose_secret())
            .json(body)
            .send()
            .await?;

        let response = check_status("POST", url, response).await?;
        let body = response.json().await?;
        Ok(body)
    }

    /// Make a POST request without a body, ignoring the response body
    pub async fn post_empty(&self, url: &str, token: &SecretString) -> Result<(), DeployError> {
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        check_status("POST", url, response).await?;
        Ok(())
    }
}

async fn check_status(method: &str, url: &str, response: Response) -> Result<Response, DeployError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!("HTTP {} {} failed: {} - {}", method, url, status, body);

    Err(DeployError::Status {
        status: status.as_u16(),
        message: response_message(status.as_u16(), &body),
    })
}
