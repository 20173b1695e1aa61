//! Media context - local capture, remote tracks and the audio subsystem

pub mod capture;
pub mod stream;
pub mod track;

pub use capture::{AudioMode, AudioSession, CaptureConstraints, MediaCapture};
pub use stream::{LocalMediaStream, RemoteMediaStream};
pub use track::{LevelMeter, LocalTrack, MediaSink, RemoteTrack, TrackKind};
