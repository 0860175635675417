//! Bearer token sources for the Drive API.
//!
//! A static token is taken as-is. Service account keys are exchanged for an
//! access token through a signed JWT assertion and the token is cached until
//! shortly before it expires.

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use crate::config::DriveConfig;
use crate::drive::error::DriveError;

const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, DriveError>;
}

/// A pre-issued OAuth access token.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, DriveError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    expires_at: SystemTime,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.expires_at > SystemTime::now() + Duration::from_secs(60)
    }
}

/// Shared token slot. Concurrent callers that find it stale queue on the
/// write lock, and only the first of them runs `refresh`.
#[derive(Default)]
struct TokenCache {
    slot: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<String, DriveError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(String, u64), DriveError>>,
    {
        if let Some(token) = self.slot.read().await.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.token.clone());
        }

        let mut slot = self.slot.write().await;
        if let Some(token) = slot.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.token.clone());
        }

        let (token, expires_in) = refresh().await?;
        tracing::debug!("Obtained service account token valid for {}s", expires_in);
        *slot = Some(CachedToken {
            token: token.clone(),
            expires_at: SystemTime::now() + Duration::from_secs(expires_in),
        });
        Ok(token)
    }
}

pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    client: Client,
    cache: TokenCache,
}

impl ServiceAccountAuth {
    pub fn from_file(path: &str) -> Result<Self, DriveError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DriveError::Auth(format!("Failed to read service account key {}: {}", path, e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, DriveError> {
        let credentials: ServiceAccountCredentials = serde_json::from_str(json)
            .map_err(|e| DriveError::Auth(format!("Invalid service account key: {}", e)))?;
        Ok(Self {
            credentials,
            client: Client::new(),
            cache: TokenCache::default(),
        })
    }

    async fn fetch_new_token(&self) -> Result<(String, u64), DriveError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| DriveError::Auth(e.to_string()))?
            .as_secs();

        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: DRIVE_READONLY_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| DriveError::Auth(format!("Invalid private key: {}", e)))?;
        let jwt = encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| DriveError::Auth(format!("Failed to sign JWT: {}", e)))?;

        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", jwt.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DriveError::Auth(format!(
                "Token exchange failed ({}): {}",
                status, text
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DriveError::Decode(e.to_string()))?;
        Ok((token.access_token, token.expires_in))
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountAuth {
    async fn access_token(&self) -> Result<String, DriveError> {
        self.cache.get_or_refresh(|| self.fetch_new_token()).await
    }
}

/// Picks a token source from configuration: static token first, then a
/// service account key file, then inline service account JSON.
pub fn token_provider_from_config(config: &DriveConfig) -> Result<Arc<dyn TokenProvider>, DriveError> {
    if let Some(token) = &config.access_token {
        return Ok(Arc::new(StaticToken::new(token.clone())));
    }
    if let Some(path) = &config.service_account_key_path {
        return Ok(Arc::new(ServiceAccountAuth::from_file(path)?));
    }
    if let Some(json) = &config.service_account_json {
        return Ok(Arc::new(ServiceAccountAuth::from_json(json)?));
    }
    Err(DriveError::Auth(
        "No Drive credentials configured. Set GOOGLE_ACCESS_TOKEN, \
         GOOGLE_SERVICE_ACCOUNT_KEY or GOOGLE_SERVICE_ACCOUNT_JSON."
            .to_string(),
    ))
}
