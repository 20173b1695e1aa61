//! Remote audio level meter
//!
//! Level is the RTP payload rate of the remote audio tracks, scaled against
//! a nominal voice bitrate.

use crate::domain::media::RemoteMediaStream;
use std::time::Duration;

/// Payload rate that fills the bar (Opus voice at ~64 kbit/s)
pub const FULL_SCALE_BYTES_PER_SEC: u64 = 8_000;
pub const BAR_WIDTH: usize = 32;

/// Render a fixed-width bar for `bytes_per_sec`
pub fn render_bar(bytes_per_sec: u64, width: usize) -> String {
    let filled = ((bytes_per_sec.min(FULL_SCALE_BYTES_PER_SEC) as u128 * width as u128)
        / FULL_SCALE_BYTES_PER_SEC as u128) as usize;
    format!(
        "[{}{}] {:>6} B/s",
        "#".repeat(filled),
        "-".repeat(width - filled),
        bytes_per_sec
    )
}

/// Turns the cumulative byte counter into a per-second rate
#[derive(Debug, Default)]
pub struct LevelSampler {
    last_total: u64,
}

impl LevelSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(&mut self, total_bytes: u64, elapsed: Duration) -> u64 {
        let delta = total_bytes.saturating_sub(self.last_total);
        self.last_total = total_bytes;

        let millis = elapsed.as_millis() as u64;
        if millis == 0 {
            return 0;
        }
        delta * 1000 / millis
    }

    pub async fn sample_stream(&mut self, stream: &RemoteMediaStream, elapsed: Duration) -> u64 {
        let total = stream.audio_bytes().await;
        self.sample(total, elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::media::{RemoteTrack, TrackKind};

    #[test]
    fn test_render_bar_bounds() {
        assert_eq!(render_bar(0, 4), "[----]      0 B/s");
        assert_eq!(render_bar(FULL_SCALE_BYTES_PER_SEC / 2, 4), "[##--]   4000 B/s");
        assert_eq!(render_bar(FULL_SCALE_BYTES_PER_SEC * 10, 4), "[####]  80000 B/s");
    }

    #[test]
    fn test_sampler_rate() {
        let mut sampler = LevelSampler::new();
        assert_eq!(sampler.sample(4_000, Duration::from_millis(500)), 8_000);
        assert_eq!(sampler.sample(5_000, Duration::from_secs(1)), 1_000);
        assert_eq!(sampler.sample(5_000, Duration::from_secs(1)), 0);
        assert_eq!(sampler.sample(6_000, Duration::ZERO), 0);
    }

    #[tokio::test]
    async fn test_sample_stream_counts_audio() {
        let stream = RemoteMediaStream::new();
        let track = RemoteTrack::new("remote-audio", TrackKind::Audio, "remote");
        track.meter.record(1_000);
        stream.add_track(track).await;

        let mut sampler = LevelSampler::new();
        assert_eq!(sampler.sample_stream(&stream, Duration::from_secs(1)).await, 1_000);
    }
}
