//! Capture and audio-subsystem ports

use crate::domain::media::stream::LocalMediaStream;
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What the session asks capture for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub audio: bool,
    pub video: bool,
}

impl CaptureConstraints {
    pub fn audio_only() -> Self {
        Self {
            audio: true,
            video: false,
        }
    }
}

/// Local capture port
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaCapture: Send + Sync {
    async fn acquire(&self, constraints: CaptureConstraints) -> Result<LocalMediaStream>;
}

/// Playback mode requested from the platform audio subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioMode {
    /// Keep playing remote audio while the device is in silent mode
    pub plays_in_silent_mode: bool,
}

impl Default for AudioMode {
    fn default() -> Self {
        Self {
            plays_in_silent_mode: true,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioSession: Send + Sync {
    async fn configure(&self, mode: AudioMode) -> Result<()>;
}
