//! Local and remote media tracks

use crate::domain::shared::value_objects::TrackId;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Transport-side sink a capture source writes into, opaque to the domain
pub type MediaSink = Arc<dyn Any + Send + Sync>;

/// Media kind of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

/// A track produced by local capture.
///
/// `enabled` gates whether the capture source writes samples; `stop()`
/// releases the source permanently.
pub struct LocalTrack {
    id: TrackId,
    kind: TrackKind,
    enabled: AtomicBool,
    stopped: AtomicBool,
    sink: Option<MediaSink>,
}

impl LocalTrack {
    pub fn new(id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: TrackId::new(id),
            kind,
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
            sink: None,
        }
    }

    /// Track whose samples flow into `sink`
    pub fn with_sink(id: impl Into<String>, kind: TrackKind, sink: MediaSink) -> Self {
        Self {
            sink: Some(sink),
            ..Self::new(id, kind)
        }
    }

    pub fn id(&self) -> &TrackId {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn sink(&self) -> Option<MediaSink> {
        self.sink.clone()
    }
}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("enabled", &self.is_enabled())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Byte and packet counters fed by the remote track reader
#[derive(Debug, Default)]
pub struct LevelMeter {
    bytes: AtomicU64,
    packets: AtomicU64,
}

impl LevelMeter {
    pub fn record(&self, payload_len: usize) {
        self.bytes.fetch_add(payload_len as u64, Ordering::Relaxed);
        self.packets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub fn packets(&self) -> u64 {
        self.packets.load(Ordering::Relaxed)
    }
}

/// A track delivered by the remote peer
#[derive(Debug, Clone)]
pub struct RemoteTrack {
    pub id: TrackId,
    pub kind: TrackKind,
    pub stream_id: String,
    pub meter: Arc<LevelMeter>,
}

impl RemoteTrack {
    pub fn new(id: impl Into<String>, kind: TrackKind, stream_id: impl Into<String>) -> Self {
        Self {
            id: TrackId::new(id),
            kind,
            stream_id: stream_id.into(),
            meter: Arc::new(LevelMeter::default()),
        }
    }
}
