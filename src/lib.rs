//! Switchboard: an event-driven chat agent.
//!
//! A streaming chat model is given a catalogue of UI tools. Its text is
//! relayed as chunk events on an [`EventBus`](bus::EventBus), and each tool
//! call it makes is executed locally and published as a domain event
//! (sidebar toggled, theme changed, form filled, ...) for a host UI to
//! act on.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use switchboard::prelude::*;
//!
//! # async fn example() -> switchboard::error::Result<()> {
//! let bus = EventBus::new();
//! let agent = Arc::new(ConversationAgent::from_config(bus.clone(), &AgentConfig::from_env()?)?);
//! let _listening = agent.listen();
//!
//! let _chunks = bus.on(EventKind::AiResponseChunk, |payload: ChunkPayload| async move {
//!     print!("{}", payload.chunk);
//!     Ok(())
//! });
//! send_user_message(&bus, "Switch to dark mode", "sk-or-v1-...");
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod bus;
pub mod config;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod storage;
pub mod stream;
pub mod tools;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
