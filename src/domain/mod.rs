//! Domain layer - Session lifecycle rules and the ports they depend on
//!
//! This layer contains:
//! - Value objects: session state, start policy, track kinds
//! - Entities: local and remote tracks, media streams
//! - Ports: credential service, transport, capture, audio subsystem

pub mod media;
pub mod session;
pub mod shared;

// Re-export commonly used types
pub use shared::{Result, SessionError};
