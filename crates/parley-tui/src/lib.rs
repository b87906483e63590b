//! Terminal UI for Parley
//!
//! A thin shell over [`parley_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`parley_app::Runtime`].
//!
//! This crate handles terminal input, rendering, the production clock and
//! command-line parsing.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cli;
pub mod env;
pub mod terminal;
pub mod ui;

pub use cli::Args;
pub use env::SystemEnv;
pub use parley_app::{App, AppAction, AppEvent, Driver, KeyInput, Runtime};
pub use terminal::{TerminalDriver, TerminalError};
