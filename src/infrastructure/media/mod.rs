//! Media adapters: capture sources and the audio subsystem

pub mod audio_mode;
pub mod capture;

pub use audio_mode::PlatformAudioSession;
pub use capture::{capture_from_config, OggFileCapture, SilenceCapture};
