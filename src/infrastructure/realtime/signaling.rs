//! SDP offer/answer exchange with the realtime API

use crate::config::RealtimeConfig;
use crate::domain::session::{EphemeralCredential, SdpSignaling};
use crate::domain::shared::error::SessionError;
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

const SDP_CONTENT_TYPE: &str = "application/sdp";

pub struct RealtimeSdpClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl RealtimeSdpClient {
    pub fn new(client: reqwest::Client, config: &RealtimeConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}?model={}", self.base_url, self.model)
    }
}

#[async_trait]
impl SdpSignaling for RealtimeSdpClient {
    async fn exchange(&self, credential: &EphemeralCredential, offer_sdp: &str) -> Result<String> {
        let url = self.endpoint();
        debug!("Posting SDP offer ({} bytes) to {}", offer_sdp.len(), url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(credential.expose())
            .header(CONTENT_TYPE, SDP_CONTENT_TYPE)
            .body(offer_sdp.to_string())
            .send()
            .await
            .map_err(|e| SessionError::Transport(format!("SDP exchange failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SessionError::Transport(format!(
                "realtime API returned {}: {}",
                status,
                detail.trim()
            )));
        }

        let answer = response
            .text()
            .await
            .map_err(|e| SessionError::Transport(format!("failed to read SDP answer: {}", e)))?;
        if answer.trim().is_empty() {
            return Err(SessionError::Transport("realtime API returned an empty answer".to_string()));
        }

        info!("Received SDP answer from realtime API ({} bytes)", answer.len());
        Ok(answer)
    }
}
