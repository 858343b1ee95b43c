use std::time::Duration;

use async_trait::async_trait;
use domain::ports::PermissionAuthorizer;
use domain::protocol::{
    PermissionPayload, PermissionVerdict, DEFAULT_REQUESTER, PERMISSION_CHECK_PATH,
    PERM_CAN_COMMENT,
};
use domain::PermissionDenied;
use hmac::{Hmac, Mac};
use reqwest::StatusCode;
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, error};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone, Debug)]
pub struct PermissionConfig {
    /// Base URL of the parent application.
    pub endpoint: String,
    /// Hex-encoded shared secret.
    pub secret: Option<String>,
    pub requester: String,
    pub perm_key: String,
    pub timeout: Duration,
}

impl PermissionConfig {
    pub fn new(endpoint: impl Into<String>, secret: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            secret,
            requester: DEFAULT_REQUESTER.to_string(),
            perm_key: PERM_CAN_COMMENT.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum KeyError {
    #[error("shared secret is not configured")]
    Missing,
    #[error("shared secret is malformed: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum PermissionError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("cannot serialize permission payload: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("permission service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("permission service answered HTTP {0}")]
    Status(StatusCode),
    #[error("undecodable permission response (HTTP {status}): {source}")]
    Decode {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },
    #[error("refused by permission service: {}", .0.as_deref().unwrap_or("no reason given"))]
    Refused(Option<String>),
}

/// HMAC-SHA256 key shared with the permission service.
#[derive(Clone)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn from_hex(secret: &str) -> Result<Self, KeyError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(KeyError::Missing);
        }
        let bytes = hex::decode(secret).map_err(|e| KeyError::Malformed(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Hex-encoded MAC of `message`.
    pub fn sign(&self, message: &[u8]) -> Result<String, KeyError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.0).map_err(|e| KeyError::Malformed(e.to_string()))?;
        mac.update(message);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

/// Asks the parent application whether a commenter may comment on a route.
/// One signed request per check, never retried.
pub struct HmacAuthorizer {
    client: reqwest::Client,
    url: String,
    key: Result<SigningKey, KeyError>,
    requester: String,
    perm_key: String,
}

impl HmacAuthorizer {
    pub fn new(config: PermissionConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let key = match config.secret.as_deref() {
            Some(s) => SigningKey::from_hex(s),
            None => Err(KeyError::Missing),
        };
        if let Err(e) = &key {
            error!("Permission checks will deny every commenter: {}", e);
        }

        let url = format!(
            "{}{}",
            config.endpoint.trim_end_matches('/'),
            PERMISSION_CHECK_PATH
        );

        Ok(Self {
            client,
            url,
            key,
            requester: config.requester,
            perm_key: config.perm_key,
        })
    }

    pub async fn check(&self, email: &str, route: &str) -> Result<(), PermissionError> {
        let key = self.key.as_ref().map_err(|e| e.clone())?;

        let payload = PermissionPayload {
            requester: self.requester.clone(),
            email: email.to_string(),
            route: route.to_string(),
            perm_key: self.perm_key.clone(),
        };
        let signed = payload.canonical_bytes().map_err(PermissionError::Encode)?;
        let hmac = key.sign(&signed)?;

        let resp = self
            .client
            .post(&self.url)
            .form(&payload.into_form(hmac))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PermissionError::Status(status));
        }
        let body = resp.bytes().await?;
        let verdict: PermissionVerdict = serde_json::from_slice(&body)
            .map_err(|source| PermissionError::Decode { status, source })?;

        if !verdict.result {
            return Err(PermissionError::Refused(verdict.error));
        }
        debug!("Permission granted: email={} route={}", email, route);
        Ok(())
    }
}

#[async_trait]
impl PermissionAuthorizer for HmacAuthorizer {
    async fn authorize(&self, email: &str, route: &str) -> Result<(), PermissionDenied> {
        self.check(email, route)
            .await
            .map_err(|e| PermissionDenied::new(e.to_string()))
    }
}
