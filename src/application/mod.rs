//! Application layer - Use cases and application services
//!
//! This layer orchestrates domain objects to fulfill use cases.
//! It's responsible for:
//! - Sequencing the credential, media and transport ports
//! - Owning and releasing per-session resources
//! - Publishing session status to the presentation shell

pub mod session_controller;

pub use session_controller::{ControllerOptions, SessionController, SessionDependencies};
