//! WebRTC transport adapters
pub mod channel;
pub mod peer;

pub use channel::WebRtcDataChannel;
pub use peer::{WebRtcConnector, WebRtcPeer};
