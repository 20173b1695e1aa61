//! Capture sources feeding Opus samples into a WebRTC sender track
//!
//! `SilenceCapture` keeps a live audio track with Opus silence frames.
//! `OggFileCapture` loops an Ogg/Opus file in place of a microphone.

use crate::domain::media::{CaptureConstraints, LocalMediaStream, LocalTrack, MediaCapture, TrackKind};
use crate::domain::shared::error::SessionError;
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;
use webrtc::api::media_engine::MIME_TYPE_OPUS;
use webrtc::media::io::ogg_reader::{OggHeader, OggReader};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// One 20 ms Opus frame of silence (TOC 0xF8, CELT FB 20 ms)
const OPUS_SILENCE_FRAME: [u8; 3] = [0xF8, 0xFF, 0xFE];
const FRAME_DURATION: Duration = Duration::from_millis(20);
const OPUS_CLOCK_RATE: u64 = 48_000;
const STREAM_ID: &str = "parley-local";

fn opus_track() -> (Arc<LocalTrack>, Arc<TrackLocalStaticSample>) {
    let id = format!("mic-{}", Uuid::new_v4());
    let rtc = Arc::new(TrackLocalStaticSample::new(
        RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_string(),
            clock_rate: OPUS_CLOCK_RATE as u32,
            channels: 2,
            ..Default::default()
        },
        id.clone(),
        STREAM_ID.to_string(),
    ));
    let track = Arc::new(LocalTrack::with_sink(id, TrackKind::Audio, rtc.clone()));
    (track, rtc)
}

fn require_audio(constraints: CaptureConstraints) -> Result<()> {
    if !constraints.audio {
        return Err(SessionError::Media("audio capture not requested".to_string()));
    }
    if constraints.video {
        debug!("Video capture requested but not supported, ignoring");
    }
    Ok(())
}

async fn write(rtc: &TrackLocalStaticSample, data: Bytes, duration: Duration) {
    let sample = Sample {
        data,
        duration,
        ..Default::default()
    };
    if let Err(e) = rtc.write_sample(&sample).await {
        debug!("Dropped local sample: {}", e);
    }
}

/// Silent microphone
#[derive(Debug, Default)]
pub struct SilenceCapture;

impl SilenceCapture {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaCapture for SilenceCapture {
    async fn acquire(&self, constraints: CaptureConstraints) -> Result<LocalMediaStream> {
        require_audio(constraints)?;
        let (track, rtc) = opus_track();
        info!("Capturing silence on track {}", track.id());

        tokio::spawn({
            let track = track.clone();
            async move {
                let mut ticker = tokio::time::interval(FRAME_DURATION);
                while !track.is_stopped() {
                    ticker.tick().await;
                    if track.is_enabled() {
                        write(&rtc, Bytes::from_static(&OPUS_SILENCE_FRAME), FRAME_DURATION).await;
                    }
                }
                debug!("Silence source for {} released", track.id());
            }
        });

        Ok(LocalMediaStream::new(vec![track]))
    }
}

/// Granule position of a page on which no packet ends
const GRANULE_NONE: u64 = u64::MAX;

/// Playback time covered by the samples between two granule positions
fn granule_duration(from: u64, to: u64) -> Duration {
    let samples = to.saturating_sub(from);
    Duration::from_millis(samples.saturating_mul(1000) / OPUS_CLOCK_RATE)
}

/// Audio pages of one pass over an Ogg/Opus file
struct OggPages {
    reader: OggReader<Cursor<Bytes>>,
    last_granule: u64,
    pending: BytesMut,
}

impl OggPages {
    fn open(data: Bytes) -> Result<(Self, OggHeader)> {
        let (reader, header) = OggReader::new(Cursor::new(data), true)
            .map_err(|e| SessionError::Media(e.to_string()))?;
        Ok((
            Self {
                reader,
                last_granule: 0,
                pending: BytesMut::new(),
            },
            header,
        ))
    }

    /// Next page payload and its duration. Pages without a granule position
    /// are carried into the page that completes their packet.
    fn next_page(&mut self) -> Option<(Bytes, Duration)> {
        loop {
            let (page, header) = self.reader.parse_next_page().ok()?;
            self.pending.extend_from_slice(&page);

            if header.granule_position == GRANULE_NONE {
                continue;
            }

            let duration = granule_duration(self.last_granule, header.granule_position);
            self.last_granule = header.granule_position;
            return Some((self.pending.split().freeze(), duration));
        }
    }
}

/// Streams the Opus pages of an Ogg file, restarting at end of file
#[derive(Debug, Clone)]
pub struct OggFileCapture {
    path: PathBuf,
}

impl OggFileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MediaCapture for OggFileCapture {
    async fn acquire(&self, constraints: CaptureConstraints) -> Result<LocalMediaStream> {
        require_audio(constraints)?;

        let data = Bytes::from(tokio::fs::read(&self.path).await.map_err(|e| {
            SessionError::Media(format!("cannot read {}: {}", self.path.display(), e))
        })?);

        let (_, header) = OggPages::open(data.clone()).map_err(|e| {
            SessionError::Media(format!("{} is not an Ogg/Opus file: {}", self.path.display(), e))
        })?;
        debug!(
            "Ogg source {}: {} channel(s) at {} Hz",
            self.path.display(),
            header.channels,
            header.sample_rate
        );

        let (track, rtc) = opus_track();
        info!("Capturing {} on track {}", self.path.display(), track.id());

        tokio::spawn({
            let track = track.clone();
            async move {
                'file: while !track.is_stopped() {
                    let Ok((mut pages, _)) = OggPages::open(data.clone()) else {
                        break;
                    };
                    let mut fed = 0usize;

                    while let Some((payload, duration)) = pages.next_page() {
                        if track.is_stopped() {
                            break 'file;
                        }
                        fed += 1;

                        if track.is_enabled() && !duration.is_zero() {
                            write(&rtc, payload, duration).await;
                        }
                        tokio::time::sleep(duration.max(FRAME_DURATION)).await;
                    }

                    if fed == 0 {
                        warn!("Ogg source has no audio pages, stopping");
                        break;
                    }
                }
                debug!("Ogg source for {} released", track.id());
            }
        });

        Ok(LocalMediaStream::new(vec![track]))
    }
}

/// Pick the capture source from configuration
pub fn capture_from_config(ogg_file: Option<&PathBuf>) -> Arc<dyn MediaCapture> {
    match ogg_file {
        Some(path) => Arc::new(OggFileCapture::new(path.clone())),
        None => {
            warn!("No capture file configured, sending silence");
            Arc::new(SilenceCapture::new())
        }
    }
}
