//! Realtime API adapters

pub mod signaling;

pub use signaling::RealtimeSdpClient;
