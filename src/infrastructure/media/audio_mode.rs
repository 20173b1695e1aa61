//! Audio subsystem adapter

use crate::domain::media::{AudioMode, AudioSession};
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use tracing::{debug, info};

/// Applies the playback mode the session asked for.
///
/// Desktop hosts have no silent switch, so applying the mode only logs it;
/// mobile hosts would forward it to the OS audio session.
#[derive(Debug, Default)]
pub struct PlatformAudioSession;

impl PlatformAudioSession {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioSession for PlatformAudioSession {
    async fn configure(&self, mode: AudioMode) -> Result<()> {
        info!(
            "Configuring audio playback (plays_in_silent_mode={})",
            mode.plays_in_silent_mode
        );
        if !mode.plays_in_silent_mode {
            debug!("Remote audio will follow the device silent switch");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_configure_accepts_both_modes() {
        let audio = PlatformAudioSession::new();
        for plays_in_silent_mode in [true, false] {
            tokio_test::assert_ok!(audio.configure(AudioMode { plays_in_silent_mode }).await);
        }
    }
}
