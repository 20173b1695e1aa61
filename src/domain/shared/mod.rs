//! Shared kernel - Common types used across the session and media contexts

pub mod error;
pub mod result;
pub mod value_objects;

pub use error::SessionError;
pub use result::Result;
pub use value_objects::*;
