//! Local and remote media streams

use crate::domain::media::track::{LocalTrack, RemoteTrack, TrackKind};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Tracks acquired from local capture for one session
#[derive(Debug, Default)]
pub struct LocalMediaStream {
    tracks: Vec<Arc<LocalTrack>>,
}

impl LocalMediaStream {
    pub fn new(tracks: Vec<Arc<LocalTrack>>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Arc<LocalTrack>] {
        &self.tracks
    }

    pub fn first_audio_track(&self) -> Option<Arc<LocalTrack>> {
        self.tracks
            .iter()
            .find(|t| t.kind() == TrackKind::Audio)
            .cloned()
    }

    /// Voice-only policy: video tracks stay attached but stop producing
    pub fn disable_video(&self) -> usize {
        let mut disabled = 0;
        for track in self.tracks.iter().filter(|t| t.kind() == TrackKind::Video) {
            track.set_enabled(false);
            disabled += 1;
        }
        disabled
    }

    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

/// Remote tracks received during one session.
///
/// The controller creates a fresh container for every session, so tracks
/// from a previous session never leak into the next one.
#[derive(Debug, Default)]
pub struct RemoteMediaStream {
    tracks: RwLock<Vec<RemoteTrack>>,
}

impl RemoteMediaStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_track(&self, track: RemoteTrack) {
        self.tracks.write().await.push(track);
    }

    pub async fn tracks(&self) -> Vec<RemoteTrack> {
        self.tracks.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.tracks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tracks.read().await.is_empty()
    }

    /// Total RTP payload bytes received across remote audio tracks
    pub async fn audio_bytes(&self) -> u64 {
        self.tracks
            .read()
            .await
            .iter()
            .filter(|t| t.kind == TrackKind::Audio)
            .map(|t| t.meter.bytes())
            .sum()
    }
}
