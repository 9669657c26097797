//! Identity verification gate
//!
//! Tokens are never inspected locally. They are handed to an external
//! identity service, and the only local decision is whether the verified
//! user belongs to the administrator group.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a request was refused by the identity gate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing header value: Authorization")]
    MissingToken,

    #[error("JWT verification request failed")]
    VerifierUnreachable(String),

    #[error("Validation failed with {status}")]
    Rejected { status: u16, body: String },

    #[error("User is not administrator")]
    NotAdministrator,
}

/// Verified user as reported by the identity service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    /// Group id, normalized to its decimal string form
    #[serde(deserialize_with = "gid_as_string")]
    pub gid: String,
}

fn gid_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Gid {
        Number(i64),
        Text(String),
    }

    Ok(match Gid::deserialize(deserializer)? {
        Gid::Number(n) => n.to_string(),
        Gid::Text(s) => s,
    })
}

/// Turns a bearer token into a verified identity
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Identity verifier calling `POST {base_url}/verify`
pub struct HttpIdentityVerifier {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
}

impl HttpIdentityVerifier {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let url = format!("{}/verify", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&VerifyRequest { token })
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Identity service unreachable");
                AuthError::VerifierUnreachable(e.to_string())
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            debug!(status = %status, "Token rejected by identity service");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Identity>()
            .await
            .map_err(|e| AuthError::VerifierUnreachable(format!("invalid verify response: {e}")))
    }
}

/// Precondition run before any core operation
#[derive(Clone)]
pub struct IdentityGate {
    verifier: Arc<dyn IdentityVerifier>,
    admin_gid: Option<String>,
}

impl IdentityGate {
    pub fn new(verifier: Arc<dyn IdentityVerifier>, admin_gid: Option<String>) -> Self {
        Self {
            verifier,
            admin_gid,
        }
    }

    /// Authorize a request given its raw `Authorization` header value
    pub async fn authorize(&self, authorization: Option<&str>) -> Result<Identity, AuthError> {
        let token = bearer_token(authorization).ok_or(AuthError::MissingToken)?;
        let identity = self.verifier.verify(token).await?;

        match &self.admin_gid {
            Some(admin) if *admin != identity.gid => Err(AuthError::NotAdministrator),
            _ => Ok(identity),
        }
    }
}

/// Extract the token from `Bearer <token>`
pub fn bearer_token(authorization: Option<&str>) -> Option<&str> {
    let value = authorization?;
    if value.len() < 8 {
        return None;
    }
    value.strip_prefix("Bearer ")
}
