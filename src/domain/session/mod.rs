//! Session context - lifecycle state, event log and the ports the
//! session controller drives

pub mod credential;
pub mod event_log;
pub mod transport;
pub mod value_object;

pub use credential::{CredentialProvider, EphemeralCredential};
pub use event_log::EventLog;
pub use transport::{
    ConnectionState, DataChannel, PeerConnector, PeerHandle, PeerSession, SdpSignaling,
    TransportEvent, TransportEventSender, TransportEvents,
};
pub use value_object::{SessionState, SessionStatus, StartPolicy};
