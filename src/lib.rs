//! Parley - A realtime voice session client built with Rust
//!
//! Establishes a voice session with a realtime speech API over WebRTC,
//! following the same Domain-Driven Design (DDD) layering throughout:
//! domain ports, an application-level session controller, infrastructure
//! adapters and a terminal presentation shell.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::SessionError;
pub use domain::shared::result::Result;
