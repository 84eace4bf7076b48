//! Core types for Switchboard.

pub mod message;
pub mod settings;

pub use message::*;
pub use settings::*;
