//! Application layer for Parley
//!
//! Pure state machines and a generic runtime for the chat client. The same
//! orchestration code runs in the terminal frontend and in simulation.
//!
//! # Components
//!
//! - [`App`]: View model (chat log, composer, attachment viewer, status line)
//! - [`Dispatcher`]: Owns the [`Session`](parley_core::Session) and
//!   [`PresenceBroadcaster`](parley_core::PresenceBroadcaster); turns app
//!   actions into frames and inbound frames into chat items
//! - [`Driver`]: Trait for platform-specific I/O
//! - [`Runtime`]: Generic orchestration loop using a Driver
//! - [`ClientConfig`]: Validated startup configuration

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
pub mod commands;
mod config;
mod dispatch;
mod driver;
mod event;
mod input;
pub mod media;
mod runtime;
mod state;
pub mod timestamp;

pub use action::AppAction;
pub use app::{App, Modal};
pub use config::{ClientConfig, ConfigError};
pub use dispatch::Dispatcher;
pub use driver::Driver;
pub use event::AppEvent;
pub use input::{InputState, KeyInput};
pub use runtime::Runtime;
pub use state::{Attachment, ChatItem, ChatLog, LinkStatus, Message, SessionView, StatusLine};
