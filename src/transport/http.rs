use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::AuthenticatedTransport;
use crate::credentials::CredentialStore;
use crate::error::NodeError;
use crate::node::{HttpMethod, RequestDescriptor};

/// Resolves the current access token for a credential name.
pub trait TokenSource: Send + Sync {
    fn access_token(&self, credential: &str) -> Result<String>;
}

/// A fixed token, regardless of credential name.
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    fn access_token(&self, _credential: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Reads tokens persisted by the OAuth exchange. Tokens are never refreshed
/// here: an expired token asks the user to authorize again.
///
/// This is a blocking SQLite read behind a `std::sync::Mutex`, run inline on
/// the async task. Fine for one lookup per request; wrap it in
/// `tokio::task::spawn_blocking` or cache the token before calling it in a
/// hot path.
impl TokenSource for CredentialStore {
    fn access_token(&self, credential: &str) -> Result<String> {
        let credentials = self
            .get(credential)?
            .ok_or_else(|| anyhow!("No tokens stored for credential '{}'; authorize first", credential))?;

        if let Some(expires_at) = credentials.expires_at {
            if expires_at <= Utc::now() {
                return Err(anyhow!(
                    "Access token for credential '{}' expired at {}; authorize again",
                    credential,
                    expires_at.to_rfc3339()
                ));
            }
        }
        Ok(credentials.access_token)
    }
}

/// HTTP transport for the Bling API.
///
/// Sends each request with a Bearer token from its [`TokenSource`].
pub struct OAuth2HttpTransport {
    http_client: Client,
    tokens: Arc<dyn TokenSource>,
}

impl OAuth2HttpTransport {
    pub fn new(tokens: Arc<dyn TokenSource>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("bling-connector/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http_client,
            tokens,
        })
    }

    async fn send(&self, credential: &str, request: &RequestDescriptor) -> Result<Option<Value>> {
        let access_token = self
            .tokens
            .access_token(credential)
            .context("Failed to resolve access token")?;

        let mut builder = self
            .http_client
            .request(to_reqwest_method(request.method), &request.url)
            .bearer_auth(access_token);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(method = %request.method, url = %request.url, "Sending Bling request");

        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to send {} {}", request.method, request.url))?;

        let response = check_response_status(response).await?;
        let bytes = response
            .bytes()
            .await
            .context("Failed to read Bling response body")?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let value = serde_json::from_slice(&bytes).context("Failed to parse Bling response")?;
        Ok(Some(value))
    }
}

#[async_trait]
impl AuthenticatedTransport for OAuth2HttpTransport {
    async fn authenticated_request(
        &self,
        credential: &str,
        request: &RequestDescriptor,
    ) -> Result<Option<Value>, NodeError> {
        self.send(credential, request).await.map_err(NodeError::from)
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Maps non-2xx statuses to descriptive errors.
///
/// - 401 → token expired or invalid
/// - 429 → rate limit
/// - Other non-2xx → status plus response body
async fn check_response_status(response: reqwest::Response) -> Result<reqwest::Response> {
    match response.status() {
        StatusCode::UNAUTHORIZED => Err(anyhow!("Bling auth error: access token expired or invalid")),
        StatusCode::TOO_MANY_REQUESTS => Err(anyhow!("Bling rate limit exceeded")),
        s if !s.is_success() => {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            Err(anyhow!("Bling API error {}: {}", s, body))
        }
        _ => Ok(response),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use chrono::Duration as ChronoDuration;
    use crate::credentials::Credentials;

    fn store() -> CredentialStore {
        CredentialStore::new(":memory:", &BASE64.encode([0u8; 32])).unwrap()
    }

    #[test]
    fn test_store_token_source() {
        let store = store();
        store
            .store(
                "blingOAuth2Api",
                &Credentials {
                    access_token: "live".to_string(),
                    refresh_token: None,
                    expires_at: Some(Utc::now() + ChronoDuration::hours(6)),
                },
            )
            .unwrap();
        assert_eq!(store.access_token("blingOAuth2Api").unwrap(), "live");
    }

    #[test]
    fn test_store_token_source_rejects_expired() {
        let store = store();
        store
            .store(
                "blingOAuth2Api",
                &Credentials {
                    access_token: "stale".to_string(),
                    refresh_token: Some("r".to_string()),
                    expires_at: Some(Utc::now() - ChronoDuration::minutes(1)),
                },
            )
            .unwrap();
        let err = store.access_token("blingOAuth2Api").unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_store_token_source_missing() {
        let err = store().access_token("other").unwrap_err();
        assert!(err.to_string().contains("No tokens stored for credential 'other'"));
    }
}
