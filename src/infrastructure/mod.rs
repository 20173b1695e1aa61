//! Infrastructure layer - Technical implementations
//!
//! This layer contains:
//! - WebRTC transport (peer connection, data channel)
//! - Media capture and audio subsystem adapters
//! - HTTP clients for the credential service and the realtime API

pub mod credentials;
pub mod http;
pub mod media;
pub mod realtime;
pub mod webrtc;
