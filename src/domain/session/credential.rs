//! Ephemeral credential and the port that issues it

use crate::domain::shared::result::Result;
use async_trait::async_trait;
use std::fmt;

/// Short-lived bearer secret used for exactly one SDP exchange
#[derive(Clone, PartialEq, Eq)]
pub struct EphemeralCredential(String);

impl EphemeralCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EphemeralCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EphemeralCredential")
            .field(&"[REDACTED]")
            .finish()
    }
}

/// Token service port
///
/// Implementations must map every failure to `SessionError::Auth`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn fetch(&self) -> Result<EphemeralCredential>;
}
