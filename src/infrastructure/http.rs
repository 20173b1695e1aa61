//! Shared HTTP client construction

use crate::config::HttpConfig;
use crate::domain::shared::error::SessionError;
use crate::domain::shared::result::Result;
use std::time::Duration;

pub fn build_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| SessionError::Config(format!("failed to build HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_with_timeout() {
        tokio_test::assert_ok!(build_client(&HttpConfig::default()));
        tokio_test::assert_ok!(build_client(&HttpConfig {
            timeout_secs: Some(5)
        }));
    }
}
