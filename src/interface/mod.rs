//! Interface layer - Presentation shell
//!
//! This layer handles:
//! - The start/stop toggle and stdin commands
//! - Rendering published session status and failures
//! - The remote audio level meter

pub mod console;
pub mod visualizer;

pub use console::{Command, ConsoleShell, ToggleControl};
