//! Ephemeral credential minted by a Supabase edge function

use crate::config::TokenServiceConfig;
use crate::domain::session::{CredentialProvider, EphemeralCredential};
use crate::domain::shared::error::SessionError;
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    client_secret: ClientSecret,
}

#[derive(Deserialize)]
struct ClientSecret {
    value: String,
    #[serde(default)]
    expires_at: Option<i64>,
}

pub struct SupabaseTokenProvider {
    client: reqwest::Client,
    endpoint: String,
    anon_key: String,
}

impl SupabaseTokenProvider {
    pub fn new(client: reqwest::Client, config: &TokenServiceConfig) -> Self {
        let endpoint = format!(
            "{}/{}",
            config.functions_url.trim_end_matches('/'),
            config.function.trim_start_matches('/')
        );
        Self {
            client,
            endpoint,
            anon_key: config.anon_key.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecret")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for SupabaseTokenProvider {
    async fn fetch(&self) -> Result<EphemeralCredential> {
        debug!("Requesting ephemeral credential from {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.anon_key)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| SessionError::Auth(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Auth(format!("token service returned {}", status)));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| SessionError::Auth(format!("invalid token response: {}", e)))?;

        if body.client_secret.value.is_empty() {
            return Err(SessionError::Auth("token service returned an empty secret".to_string()));
        }

        match body
            .client_secret
            .expires_at
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        {
            Some(expires_at) => info!("Ephemeral credential issued, expires at {}", expires_at),
            None => info!("Ephemeral credential issued"),
        }

        Ok(EphemeralCredential::new(body.client_secret.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_function_name() {
        let provider = SupabaseTokenProvider::new(
            reqwest::Client::new(),
            &TokenServiceConfig {
                functions_url: "https://demo.supabase.co/functions/v1/".into(),
                function: "token".into(),
                anon_key: "anon".into(),
            },
        );
        assert_eq!(provider.endpoint(), "https://demo.supabase.co/functions/v1/token");
    }

    #[test]
    fn test_response_shape() {
        let body: TokenResponse = serde_json::from_str(
            r#"{"client_secret":{"value":"ek_123","expires_at":1735689600},"id":"sess_1"}"#,
        )
        .unwrap();
        assert_eq!(body.client_secret.value, "ek_123");
        assert_eq!(body.client_secret.expires_at, Some(1_735_689_600));

        assert!(serde_json::from_str::<TokenResponse>(r#"{"value":"ek_123"}"#).is_err());
    }
}
