//! API client for communicating with the container manager

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use url::Url;

/// Non-2xx answer from the manager or the identity service
#[derive(Debug, Error)]
#[error("API error ({status}): {message}")]
pub struct ApiError {
    pub status: reqwest::StatusCode,
    pub message: String,
}

/// API client for the container manager
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client, sending `token` as a bearer token when set
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        // Without a trailing slash `join` would replace the last segment
        let mut base_url = Url::parse(base_url).context("Invalid API URL")?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(path).context("Invalid path")?;
        let request = self.client.request(method, url);

        Ok(match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError {
                status,
                message: error_message(&body),
            }
            .into());
        }

        Ok(response)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.request(Method::GET, path)?).await?;
        response.json().await.context("Failed to parse response")
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .send(self.request(Method::POST, path)?.json(body))
            .await?;
        response.json().await.context("Failed to parse response")
    }

    /// Make a POST request whose response carries no body
    pub async fn post_empty(&self, path: &str) -> Result<()> {
        self.send(self.request(Method::POST, path)?).await?;
        Ok(())
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, path)?).await?;
        Ok(())
    }
}

/// Prefer the structured error body, fall back to the raw text
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            error,
            details: Some(details),
        }) => format!("{error}: {details}"),
        Ok(ErrorResponse { error, .. }) => error,
        Err(_) => body.trim().to_string(),
    }
}

/// Exchange credentials for a token at `POST {identity_url}/authenticate`
pub async fn authenticate(identity_url: &str, username: &str, password: &str) -> Result<String> {
    let client = ApiClient::new(identity_url, None)?;
    let response: LoginResponse = client
        .post(
            "authenticate",
            &LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            },
        )
        .await?;

    match response.token {
        Some(token) if !token.is_empty() => Ok(token),
        _ => anyhow::bail!("Identity service did not return a token"),
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub id: String,
    pub id_short: String,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub ports: BTreeMap<String, Vec<String>>,
    pub start_time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricPoint {
    pub timestamp: String,
    #[serde(rename = "CPU")]
    pub cpu: Option<f64>,
    #[serde(rename = "Memory")]
    pub memory: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityPerformance {
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub stats: Vec<MetricPoint>,
}

/// `GET /performance` answers `[]` when the manager has no collector
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PerformanceResponse {
    Entities(BTreeMap<String, EntityPerformance>),
    Unconfigured(Vec<serde_json::Value>),
}

impl PerformanceResponse {
    pub fn into_entities(self) -> BTreeMap<String, EntityPerformance> {
        match self {
            PerformanceResponse::Entities(entities) => entities,
            PerformanceResponse::Unconfigured(_) => BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
