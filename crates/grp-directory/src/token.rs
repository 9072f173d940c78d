//! OAuth token providers: metadata server (Cloud Run / GCE) and a fixed token for local runs.

use chrono::{TimeDelta, Utc};
use grp_types::{AccessToken, TokenError, TokenProvider};
use serde::Deserialize;
use std::fmt;

/// Scope needed to read groups and create memberships.
pub const CLOUD_IDENTITY_GROUPS_SCOPE: &str = "https://www.googleapis.com/auth/cloud-identity.groups";

pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Debug, Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Fetches a fresh token for the runtime service account on every call.
pub struct MetadataTokenProvider {
    client: reqwest::Client,
    base_url: String,
}

impl MetadataTokenProvider {
    /// `base_url` is scheme + host, e.g. `http://metadata.google.internal`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build from a bare host name (the `GCE_METADATA_HOST` convention).
    pub fn for_host(host: &str) -> Self {
        Self::new(format!("http://{}", host))
    }
}

impl fmt::Debug for MetadataTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataTokenProvider")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait::async_trait]
impl TokenProvider for MetadataTokenProvider {
    async fn access_token(&self, scopes: &[&str]) -> Result<AccessToken, TokenError> {
        let url = format!("{}{}", self.base_url, TOKEN_PATH);
        let mut req = self.client.get(&url).header("Metadata-Flavor", "Google");
        if !scopes.is_empty() {
            req = req.query(&[("scopes", scopes.join(","))]);
        }
        let res = req
            .send()
            .await
            .map_err(|e| TokenError::Http(e.to_string()))?;
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| TokenError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(TokenError::Api {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: MetadataTokenResponse =
            serde_json::from_str(&body).map_err(|e| TokenError::Parse(e.to_string()))?;
        let expires_at = parsed
            .expires_in
            .and_then(TimeDelta::try_seconds)
            .and_then(|d| Utc::now().checked_add_signed(d));
        tracing::debug!(expires_at = ?expires_at, "refreshed metadata server token");
        Ok(AccessToken::new(parsed.access_token, expires_at))
    }
}

/// Hands out the same bearer token regardless of scope.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self, _scopes: &[&str]) -> Result<AccessToken, TokenError> {
        Ok(AccessToken::new(self.token.clone(), None))
    }
}

/// Token provider chosen at startup.
#[derive(Debug)]
pub enum AnyTokenProvider {
    Metadata(MetadataTokenProvider),
    Static(StaticTokenProvider),
}

#[async_trait::async_trait]
impl TokenProvider for AnyTokenProvider {
    async fn access_token(&self, scopes: &[&str]) -> Result<AccessToken, TokenError> {
        match self {
            AnyTokenProvider::Metadata(p) => p.access_token(scopes).await,
            AnyTokenProvider::Static(p) => p.access_token(scopes).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn metadata_token_is_requested_with_scope_and_flavor_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TOKEN_PATH))
            .and(header("Metadata-Flavor", "Google"))
            .and(query_param("scopes", CLOUD_IDENTITY_GROUPS_SCOPE))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.test",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = MetadataTokenProvider::new(server.uri());
        let token = provider
            .access_token(&[CLOUD_IDENTITY_GROUPS_SCOPE])
            .await
            .unwrap();
        assert_eq!(token.token, "ya29.test");
        assert!(token.expires_at.unwrap() > Utc::now());
    }

    #[tokio::test]
    async fn metadata_error_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let provider = MetadataTokenProvider::new(server.uri());
        match provider.access_token(&[CLOUD_IDENTITY_GROUPS_SCOPE]).await {
            Err(TokenError::Api { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "not found");
            }
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn static_provider_returns_fixed_token() {
        let provider = AnyTokenProvider::Static(StaticTokenProvider::new("local-token"));
        let token = provider.access_token(&[]).await.unwrap();
        assert_eq!(token.token, "local-token");
        assert!(token.expires_at.is_none());
        assert!(!format!("{:?}", token).contains("local-token"));
    }
}
