//! Transport ports: peer connection, data channel and SDP signaling
//!
//! Adapters forward every callback of the underlying WebRTC stack into a
//! single `TransportEvents` stream per peer connection. The session
//! controller drains that stream on one task, so observers are installed
//! exactly once per channel instance.

use crate::domain::media::track::{LocalTrack, RemoteTrack};
use crate::domain::session::credential::EphemeralCredential;
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Peer connection state, as reported by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
    Unknown,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::New => "new",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Failed => "failed",
            ConnectionState::Closed => "closed",
            ConnectionState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Everything the transport reports back to the controller
#[derive(Debug, Clone)]
pub enum TransportEvent {
    ConnectionStateChanged(ConnectionState),
    TrackArrived(RemoteTrack),
    ChannelOpen { label: String },
    ChannelMessage { label: String, payload: String },
    ChannelClosed { label: String },
}

pub type TransportEvents = mpsc::UnboundedReceiver<TransportEvent>;
pub type TransportEventSender = mpsc::UnboundedSender<TransportEvent>;

/// A freshly constructed peer connection and its event stream
pub struct PeerHandle {
    pub session: Arc<dyn PeerSession>,
    pub events: TransportEvents,
}

/// Builds one peer connection per session
#[async_trait]
pub trait PeerConnector: Send + Sync {
    async fn connect(&self) -> Result<PeerHandle>;
}

/// One WebRTC peer connection
#[async_trait]
pub trait PeerSession: Send + Sync {
    async fn add_track(&self, track: Arc<LocalTrack>) -> Result<()>;

    async fn create_data_channel(&self, label: &str) -> Result<Arc<dyn DataChannel>>;

    /// Produce an SDP offer without committing it
    async fn create_offer(&self) -> Result<String>;

    /// Commit the offer locally; returns the SDP that should be sent to
    /// the remote side (it may carry gathered candidates)
    async fn set_local_description(&self, offer_sdp: &str) -> Result<String>;

    async fn set_remote_description(&self, answer_sdp: &str) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Out-of-band event channel owned by a peer connection
#[async_trait]
pub trait DataChannel: Send + Sync {
    fn label(&self) -> String;

    async fn close(&self) -> Result<()>;
}

/// Offer/answer exchange with the realtime API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SdpSignaling: Send + Sync {
    async fn exchange(&self, credential: &EphemeralCredential, offer_sdp: &str) -> Result<String>;
}
